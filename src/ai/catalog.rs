//! Built-in answers used when no chat endpoint is configured

use serde_json::Value;

use super::{OptimizedLayout, Template, TemplateLayout, WidgetSuggestion};
use crate::layout::widget::{FormField, FormProps, TableProps, TextProps, WidgetProps};
use crate::layout::{Component, Position, WidgetType};

pub fn suggest_widgets(app_type: Option<&str>) -> Vec<WidgetSuggestion> {
    let entries: &[(WidgetType, &str, &str)] = match app_type {
        Some("todo") => &[
            (WidgetType::Form, "Task Creator", "Form to add new tasks"),
            (WidgetType::Table, "Task List", "Table displaying all tasks"),
            (WidgetType::Chart, "Progress Chart", "Visual progress tracking"),
            (WidgetType::Timer, "Focus Timer", "Pomodoro timer for tasks"),
        ],
        Some("crm") => &[
            (WidgetType::Form, "Contact Form", "Add new contacts"),
            (WidgetType::Table, "Contact List", "Display all contacts"),
            (WidgetType::Chart, "Sales Pipeline", "Visual sales tracking"),
            (WidgetType::Calendar, "Meeting Scheduler", "Schedule meetings"),
        ],
        _ => &[
            (WidgetType::Text, "Text Block", "Add informational text"),
            (WidgetType::Button, "Action Button", "Interactive button"),
            (WidgetType::Form, "Data Form", "Collect user input"),
        ],
    };

    entries
        .iter()
        .map(|(widget_type, name, description)| WidgetSuggestion::new(*widget_type, name, description))
        .collect()
}

pub fn generate_template(app_type: Option<&str>) -> Template {
    match app_type {
        Some("todo") => task_template(),
        _ => welcome_template(),
    }
}

fn task_template() -> Template {
    let mut form = Component::new("task-form", WidgetType::Form, Position::new(0, 0, 400, 200));
    form.props = WidgetProps::Form(FormProps {
        title: "Add New Task".to_string(),
        fields: vec![
            FormField::new("title", "text", "Task Title").required(),
            FormField::new("description", "textarea", "Description"),
            FormField::new("priority", "select", "Priority").with_options(&["Low", "Medium", "High"]),
            FormField::new("dueDate", "date", "Due Date"),
        ],
        ..FormProps::default()
    });

    let mut table = Component::new("task-list", WidgetType::Table, Position::new(420, 0, 600, 400));
    table.props = WidgetProps::Table(TableProps {
        title: "My Tasks".to_string(),
        columns: ["Title", "Priority", "Due Date", "Status"]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        sortable: true,
        filterable: true,
        ..TableProps::default()
    });

    Template {
        name: "Task Management App".to_string(),
        description: "Complete task management solution".to_string(),
        layout: TemplateLayout {
            components: vec![form, table],
        },
    }
}

fn welcome_template() -> Template {
    let mut text = Component::new("welcome-text", WidgetType::Text, Position::new(0, 0, 400, 100));
    text.props = WidgetProps::Text(TextProps {
        content: "Welcome to your custom app!".to_string(),
        font_size: "large".to_string(),
        text_align: "center".to_string(),
        ..TextProps::default()
    });

    Template {
        name: "Custom App".to_string(),
        description: "Custom application template".to_string(),
        layout: TemplateLayout {
            components: vec![text],
        },
    }
}

/// Fixed tips plus the components with negative coordinates pulled back to zero
pub fn optimize_layout(components: &[Value]) -> OptimizedLayout {
    OptimizedLayout {
        suggestions: vec![
            "Consider grouping related widgets closer together".to_string(),
            "Add more spacing between form elements".to_string(),
            "Use consistent widget sizes for better visual hierarchy".to_string(),
        ],
        improvements: Some(components.iter().cloned().map(clamp_origin).collect()),
    }
}

fn clamp_origin(mut component: Value) -> Value {
    if let Some(position) = component.get_mut("position").and_then(Value::as_object_mut) {
        for axis in ["x", "y"] {
            let negative = position
                .get(axis)
                .and_then(Value::as_f64)
                .is_some_and(|v| v < 0.0);
            if negative {
                position.insert(axis.to_string(), Value::from(0));
            }
        }
    }
    component
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_app_types_get_tailored_suggestions() {
        let todo = suggest_widgets(Some("todo"));
        assert_eq!(todo.len(), 4);
        assert_eq!(todo[3].widget_type, WidgetType::Timer);

        let crm = suggest_widgets(Some("crm"));
        assert_eq!(crm[3].name, "Meeting Scheduler");

        let other = suggest_widgets(Some("budget"));
        assert_eq!(other.len(), 3);
        assert_eq!(suggest_widgets(None), other);
    }

    #[test]
    fn todo_template_has_form_and_table() {
        let template = generate_template(Some("todo"));
        let types: Vec<_> = template.layout.components.iter().map(Component::widget_type).collect();
        assert_eq!(types, [WidgetType::Form, WidgetType::Table]);

        let WidgetProps::Form(form) = &template.layout.components[0].props else {
            panic!("expected form props");
        };
        assert_eq!(form.fields.len(), 4);
        assert!(form.fields[0].required);
    }

    #[test]
    fn fallback_template_is_a_welcome_text() {
        let template = generate_template(Some("event"));
        assert_eq!(template.name, "Custom App");
        assert_eq!(template.layout.components[0].id, "welcome-text");
    }

    #[test]
    fn optimize_clamps_negative_coordinates() {
        let components = vec![
            json!({"id": "a", "type": "text", "position": {"x": -40, "y": 20, "width": 200, "height": 100}}),
            json!({"id": "b", "type": "text"}),
        ];
        let optimized = optimize_layout(&components);
        let improvements = optimized.improvements.unwrap();

        assert_eq!(improvements[0]["position"], json!({"x": 0, "y": 20, "width": 200, "height": 100}));
        assert_eq!(improvements[1], components[1]);
    }
}
