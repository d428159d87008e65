//! Editing session for one app layout
//!
//! An [`EditorSession`] is the explicit document store the canvas works
//! against: it owns the [`LayoutDocument`], the selection side-table, the
//! builder/preview mode, the pointer gesture in progress and the status of
//! the last save. Pointer handlers call into it synchronously; the document
//! is mutated on every move, there is no separate commit step.

use serde::{Deserialize, Serialize};

use super::document::{
    new_component_id, new_suffixed_component_id, Component, ComponentUpdate, LayoutDocument,
    Position,
};
use super::gesture::{snap_coord, DragState, Gesture, Point, ResizeHandle, ResizeState};
use super::widget::WidgetType;
use super::LayoutError;
use crate::ai::{Template, WidgetSuggestion};

/// Stacking index of unselected components
pub const BASE_Z_INDEX: u32 = 1;
/// Stacking index of the selected component
pub const SELECTED_Z_INDEX: u32 = 10;

/// Size of a widget dropped from the palette
const DROP_SIZE: (u32, u32) = (200, 100);
/// Geometry of a widget inserted from an AI suggestion
const SUGGESTION_POSITION: Position = Position {
    x: 0,
    y: 0,
    width: 300,
    height: 200,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    /// Editable canvas
    #[default]
    Builder,
    /// Read-only, data-bound rendering
    Preview,
}

/// Transient indicator for the most recent save
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved {
        version: u64,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct EditorSession {
    document: LayoutDocument,
    selected: Option<String>,
    mode: EditorMode,
    gesture: Gesture,
    save_status: SaveStatus,
}

impl EditorSession {
    pub fn new(document: LayoutDocument) -> Self {
        Self {
            document,
            ..Self::default()
        }
    }

    pub fn document(&self) -> &LayoutDocument {
        &self.document
    }

    /// Swaps in a freshly loaded document, dropping selection and gesture
    pub fn replace_document(&mut self, document: LayoutDocument) {
        self.document = document;
        self.selected = None;
        self.gesture = Gesture::Idle;
    }

    pub fn into_document(self) -> LayoutDocument {
        self.document
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn is_preview(&self) -> bool {
        self.mode == EditorMode::Preview
    }

    /// Switches between builder and preview; always clears the selection
    pub fn toggle_preview(&mut self) -> EditorMode {
        self.mode = match self.mode {
            EditorMode::Builder => EditorMode::Preview,
            EditorMode::Preview => EditorMode::Builder,
        };
        self.selected = None;
        self.gesture = Gesture::Idle;
        self.mode
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    // --- selection ---

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_component(&self) -> Option<&Component> {
        self.selected
            .as_deref()
            .and_then(|id| self.document.component(id))
    }

    /// Selects `id`, or clears the selection with `None`
    ///
    /// Ids that are not in the document leave the selection unchanged and
    /// return `false`.
    pub fn set_selected(&mut self, id: Option<&str>) -> bool {
        match id {
            None => {
                self.selected = None;
                true
            }
            Some(id) if self.document.contains(id) => {
                self.selected = Some(id.to_string());
                true
            }
            Some(_) => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    // --- component lifecycle ---

    pub fn add_component(&mut self, component: Component) -> String {
        self.document.add_component(component)
    }

    pub fn update_component(
        &mut self,
        id: &str,
        update: ComponentUpdate,
    ) -> Result<bool, LayoutError> {
        self.document.update_component(id, update)
    }

    /// Removes a component and drops it from the selection if it was selected
    pub fn remove_component(&mut self, id: &str) -> Option<Component> {
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        if self.gesture.component_id() == Some(id) {
            self.gesture = Gesture::Idle;
        }
        self.document.remove_component(id)
    }

    pub fn duplicate_component(&mut self, id: &str) -> Option<String> {
        self.document.duplicate_component(id)
    }

    /// Drops a palette widget at `at` (canvas coordinates) and selects it
    ///
    /// Ignored in preview mode.
    pub fn drop_widget(&mut self, widget_type: WidgetType, at: Point) -> Option<String> {
        if self.is_preview() {
            return None;
        }
        let grid = self.document.grid();
        let position = Position::new(
            snap_coord(at.x, grid),
            snap_coord(at.y, grid),
            DROP_SIZE.0,
            DROP_SIZE.1,
        );
        let component = Component::new(new_component_id(widget_type), widget_type, position);
        let id = self.document.add_component(component);
        self.selected = Some(id.clone());
        Some(id)
    }

    /// Appends every component of `template` under a fresh id
    pub fn apply_template(&mut self, template: &Template) -> Vec<String> {
        template
            .layout
            .components
            .iter()
            .map(|component| {
                let mut component = component.clone();
                component.id = new_suffixed_component_id(component.widget_type());
                self.document.add_component(component)
            })
            .collect()
    }

    /// Appends a component for an AI suggestion with palette defaults
    pub fn add_suggested_widget(&mut self, suggestion: &WidgetSuggestion) -> String {
        let widget_type = suggestion.widget_type;
        let component = Component::new(
            new_suffixed_component_id(widget_type),
            widget_type,
            SUGGESTION_POSITION,
        );
        self.document.add_component(component)
    }

    // --- pointer input ---

    /// Click on a component body without dragging
    pub fn click_component(&mut self, id: &str) {
        if !self.is_preview() {
            self.set_selected(Some(id));
        }
    }

    /// Click on empty canvas
    pub fn click_canvas(&mut self) {
        if !self.is_preview() {
            self.selected = None;
        }
    }

    /// Pointer pressed on a component body: selects it and starts a drag
    ///
    /// Returns `false` (and does nothing) in preview mode or when the
    /// component does not exist.
    pub fn pointer_down(&mut self, id: &str, pointer: Point) -> bool {
        if self.is_preview() {
            return false;
        }
        let Some(component) = self.document.component(id) else {
            return false;
        };
        self.gesture = Gesture::Dragging(DragState {
            component_id: component.id.clone(),
            pointer_start: pointer,
            origin: component.position,
        });
        self.selected = Some(id.to_string());
        true
    }

    /// Pointer pressed on a resize handle of the selected component
    pub fn pointer_down_on_handle(&mut self, handle: ResizeHandle, pointer: Point) -> bool {
        if self.is_preview() {
            return false;
        }
        let Some(component) = self.selected_component() else {
            return false;
        };
        self.gesture = Gesture::Resizing(ResizeState {
            component_id: component.id.clone(),
            handle,
            pointer_start: pointer,
            origin: component.position,
        });
        true
    }

    /// Pointer moved while a gesture is active; applies the new geometry
    ///
    /// Returns whether the document changed.
    pub fn pointer_move(&mut self, pointer: Point) -> bool {
        let grid = self.document.grid();
        let Some((id, position)) = self.gesture.target(pointer, grid) else {
            return false;
        };
        let id = id.to_string();
        let unchanged = self
            .document
            .component(&id)
            .is_some_and(|c| c.position == position);
        if unchanged {
            return false;
        }
        self.document
            .update_component(&id, ComponentUpdate::position(position))
            .unwrap_or(false)
    }

    /// Pointer released: ends any gesture
    pub fn pointer_up(&mut self) {
        self.gesture = Gesture::Idle;
    }

    // --- rendering ---

    /// Stacking index of a component: the selected one renders above all others
    pub fn z_index(&self, id: &str) -> u32 {
        if self.selected.as_deref() == Some(id) {
            SELECTED_Z_INDEX
        } else {
            BASE_Z_INDEX
        }
    }

    /// Components from bottom to top; later components win ties
    pub fn render_order(&self) -> Vec<&Component> {
        let mut ordered: Vec<&Component> = self.document.components.iter().collect();
        ordered.sort_by_key(|c| self.z_index(&c.id));
        ordered
    }

    // --- saving ---

    pub fn save_status(&self) -> &SaveStatus {
        &self.save_status
    }

    pub fn begin_save(&mut self) {
        self.save_status = SaveStatus::Saving;
    }

    pub fn finish_save(&mut self, outcome: Result<u64, String>) {
        self.save_status = match outcome {
            Ok(version) => SaveStatus::Saved { version },
            Err(message) => SaveStatus::Failed { message },
        };
    }
}
