//! Layout document model and its mutation API
//!
//! A [`LayoutDocument`] is the unit the editor loads, mutates and saves back
//! as a whole. All operations here are plain methods on the document: there
//! is no hidden state besides the document itself (selection lives in
//! [`crate::layout::EditorSession`]).

use std::collections::HashSet;
use std::num::NonZeroU32;

use chrono::Utc;
use rand::{distr::Alphanumeric, Rng};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::widget::{FormProps, Styling, TableProps, WidgetProps, WidgetType};
use super::LayoutError;

/// Offset applied to both axes when a component is duplicated
pub const DUPLICATE_OFFSET: u32 = 20;

/// Grid pitch used when a document does not specify one
pub const DEFAULT_GRID_SIZE: u32 = 20;

/// Placement of a component on the canvas, in pixels
///
/// Decoding accepts any JSON numbers: fractions are rounded, negatives
/// become 0 and values past `u32::MAX` saturate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawPosition")]
pub struct Position {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 200,
            height: 100,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct RawPosition {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Default for RawPosition {
    fn default() -> Self {
        let position = Position::default();
        Self {
            x: f64::from(position.x),
            y: f64::from(position.y),
            width: f64::from(position.width),
            height: f64::from(position.height),
        }
    }
}

impl From<RawPosition> for Position {
    fn from(raw: RawPosition) -> Self {
        // float-to-int casts saturate, NaN included
        let coord = |value: f64| value.round() as u32;
        Position::new(coord(raw.x), coord(raw.y), coord(raw.width), coord(raw.height))
    }
}

impl Position {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether every coordinate is a multiple of `grid_size`
    pub fn is_aligned(&self, grid_size: u32) -> bool {
        grid_size > 0
            && [self.x, self.y, self.width, self.height]
                .iter()
                .all(|v| v % grid_size == 0)
    }
}

/// Reserved event hook on a component (trigger → action on target)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventBinding {
    pub trigger: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

/// One placed widget instance
///
/// The widget type is carried by the [`WidgetProps`] variant, so it cannot
/// drift from the props shape. On the wire the component is a flat object
/// `{id, type, position, props, styling, data, events}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawComponent")]
pub struct Component {
    pub id: String,
    pub props: WidgetProps,
    pub position: Position,
    pub styling: Styling,
    pub data: Value,
    pub events: Vec<EventBinding>,
}

#[derive(Deserialize)]
struct RawComponent {
    id: String,
    #[serde(rename = "type")]
    widget_type: WidgetType,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    props: Value,
    #[serde(default)]
    styling: Styling,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    events: Vec<EventBinding>,
}

impl TryFrom<RawComponent> for Component {
    type Error = serde_json::Error;

    fn try_from(raw: RawComponent) -> Result<Self, Self::Error> {
        Ok(Component {
            id: raw.id,
            props: WidgetProps::from_value(raw.widget_type, raw.props)?,
            position: raw.position,
            styling: raw.styling,
            data: raw.data,
            events: raw.events,
        })
    }
}

#[derive(Serialize)]
struct ComponentRef<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    widget_type: WidgetType,
    position: &'a Position,
    props: &'a WidgetProps,
    styling: &'a Styling,
    data: &'a Value,
    events: &'a [EventBinding],
}

impl Serialize for Component {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ComponentRef {
            id: &self.id,
            widget_type: self.widget_type(),
            position: &self.position,
            props: &self.props,
            styling: &self.styling,
            data: &self.data,
            events: &self.events,
        }
        .serialize(serializer)
    }
}

impl Component {
    /// A component of `widget_type` with palette props and styling
    pub fn new(id: impl Into<String>, widget_type: WidgetType, position: Position) -> Self {
        Self {
            id: id.into(),
            props: WidgetProps::default_for(widget_type),
            position,
            styling: Styling::default_for(widget_type),
            data: Value::Object(Map::new()),
            events: Vec::new(),
        }
    }

    pub fn widget_type(&self) -> WidgetType {
        self.props.widget_type()
    }

    /// Name of the data collection this component reads or writes in preview mode
    ///
    /// Forms write to `linkedTable` and tables read from `linkedCollection`
    /// when set; every other case uses the component's own id.
    pub fn data_collection(&self) -> &str {
        let linked = match &self.props {
            WidgetProps::Form(FormProps { linked_table, .. }) => linked_table.as_deref(),
            WidgetProps::Table(TableProps {
                linked_collection, ..
            }) => linked_collection.as_deref(),
            _ => None,
        };
        linked.filter(|c| !c.is_empty()).unwrap_or(&self.id)
    }
}

/// Generates a component id of the form `{type}-{millis}`
pub fn new_component_id(widget_type: WidgetType) -> String {
    format!("{}-{}", widget_type, Utc::now().timestamp_millis())
}

/// Generates a component id of the form `{type}-{millis}-{suffix}` with a 9 character random suffix
pub fn new_suffixed_component_id(widget_type: WidgetType) -> String {
    format!("{}-{}", new_component_id(widget_type), random_suffix(9))
}

fn random_suffix(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect()
}

/// Colors and flags of the rendered app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Theme {
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    pub background_color: String,
    pub text_color: String,
    pub dark_mode: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_color: "#3B82F6".to_string(),
            secondary_color: "#10B981".to_string(),
            accent_color: "#F97316".to_string(),
            background_color: "#FFFFFF".to_string(),
            text_color: "#1F2937".to_string(),
            dark_mode: false,
        }
    }
}

impl Theme {
    pub fn validate(&self) -> Result<(), LayoutError> {
        let fields = [
            ("primaryColor", &self.primary_color),
            ("secondaryColor", &self.secondary_color),
            ("accentColor", &self.accent_color),
            ("backgroundColor", &self.background_color),
            ("textColor", &self.text_color),
        ];
        for (field, value) in fields {
            if !is_valid_color(value) {
                return Err(LayoutError::InvalidColor {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Accepts hex colors, functional `rgb/rgba/hsl/hsla` notation and CSS keywords
pub fn is_valid_color(value: &str) -> bool {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        return matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    let lower = value.to_ascii_lowercase();
    for prefix in ["rgb(", "rgba(", "hsl(", "hsla("] {
        if lower.starts_with(prefix) {
            return lower.ends_with(')');
        }
    }
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphabetic())
}

/// Partial update of a component
///
/// Each present field replaces the component's field wholesale; nested
/// objects are never deep-merged. The id and the widget type cannot be
/// changed through an update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentUpdate {
    pub position: Option<Position>,
    pub props: Option<WidgetProps>,
    pub styling: Option<Styling>,
    pub data: Option<Value>,
    pub events: Option<Vec<EventBinding>>,
}

impl ComponentUpdate {
    pub fn position(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn props(props: WidgetProps) -> Self {
        Self {
            props: Some(props),
            ..Self::default()
        }
    }

    pub fn styling(styling: Styling) -> Self {
        Self {
            styling: Some(styling),
            ..Self::default()
        }
    }
}

/// The editable layout of one app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDocument {
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default = "default_grid_size")]
    pub grid_size: NonZeroU32,
    #[serde(default)]
    pub theme: Theme,
}

fn default_grid_size() -> NonZeroU32 {
    NonZeroU32::new(DEFAULT_GRID_SIZE).unwrap_or(NonZeroU32::MIN)
}

impl Default for LayoutDocument {
    fn default() -> Self {
        Self {
            components: Vec::new(),
            grid_size: default_grid_size(),
            theme: Theme::default(),
        }
    }
}

impl LayoutDocument {
    pub fn new(grid_size: NonZeroU32) -> Self {
        Self {
            grid_size,
            ..Self::default()
        }
    }

    pub fn grid(&self) -> NonZeroU32 {
        self.grid_size
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.component(id).is_some()
    }

    /// Appends a component and returns the id it was stored under
    ///
    /// Positions and props are taken as given. If the id is already used by
    /// another component a random suffix is appended until it is unique.
    pub fn add_component(&mut self, mut component: Component) -> String {
        if self.contains(&component.id) {
            let base = component.id.clone();
            while self.contains(&component.id) {
                component.id = format!("{}-{}", base, random_suffix(4));
            }
            tracing::debug!(requested = %base, assigned = %component.id, "component id collision");
        }
        let id = component.id.clone();
        self.components.push(component);
        id
    }

    /// Applies `update` to the component with `id`
    ///
    /// Returns `Ok(false)` and leaves the document untouched when no such
    /// component exists. Fails when `update.props` belongs to a different
    /// widget type than the component.
    pub fn update_component(
        &mut self,
        id: &str,
        update: ComponentUpdate,
    ) -> Result<bool, LayoutError> {
        let Some(component) = self.components.iter_mut().find(|c| c.id == id) else {
            return Ok(false);
        };

        if let Some(props) = &update.props {
            if props.widget_type() != component.widget_type() {
                return Err(LayoutError::TypeMismatch {
                    id: id.to_string(),
                    expected: component.widget_type(),
                    found: props.widget_type(),
                });
            }
        }

        if let Some(position) = update.position {
            component.position = position;
        }
        if let Some(props) = update.props {
            component.props = props;
        }
        if let Some(styling) = update.styling {
            component.styling = styling;
        }
        if let Some(data) = update.data {
            component.data = data;
        }
        if let Some(events) = update.events {
            component.events = events;
        }
        Ok(true)
    }

    /// Removes the component with `id`, returning it if it existed
    pub fn remove_component(&mut self, id: &str) -> Option<Component> {
        let index = self.components.iter().position(|c| c.id == id)?;
        Some(self.components.remove(index))
    }

    /// Appends a copy of the component with `id` and returns the copy's id
    ///
    /// The copy gets id `{id}-copy-{millis}` and is shifted by
    /// [`DUPLICATE_OFFSET`] on both axes without re-snapping to the grid.
    pub fn duplicate_component(&mut self, id: &str) -> Option<String> {
        let original = self.component(id)?;
        let mut copy = original.clone();
        copy.id = format!("{}-copy-{}", original.id, Utc::now().timestamp_millis());
        copy.position.x = copy.position.x.saturating_add(DUPLICATE_OFFSET);
        copy.position.y = copy.position.y.saturating_add(DUPLICATE_OFFSET);
        Some(self.add_component(copy))
    }

    /// Checks the invariants the editor relies on before a save
    pub fn validate(&self) -> Result<(), LayoutError> {
        let mut seen = HashSet::new();
        for component in &self.components {
            if !seen.insert(component.id.as_str()) {
                return Err(LayoutError::DuplicateId(component.id.clone()));
            }
        }
        self.theme.validate()
    }
}
