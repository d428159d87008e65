//! Widget palette: the closed set of widget types and their configuration
//!
//! Every placed component carries a `props` object whose shape depends on the
//! component's `type`. Instead of an untyped map, `props` is modelled as a
//! tagged union ([`WidgetProps`]) with one struct per widget type. Each struct
//! has a `Default` that mirrors the palette's default-value table, so a
//! missing field deserializes to its palette default. Keys that the typed
//! struct does not know about are kept in a pass-through `extra` map and
//! written back unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// All widget types a component can be created from
///
/// The last four (`image`, `video`, `map`, `rating`) only exist in the
/// editor palette; the rest also have server-side catalog entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetType {
    Text,
    Button,
    Form,
    Table,
    Chart,
    Calendar,
    Kanban,
    FileUpload,
    Timer,
    Counter,
    Image,
    Video,
    Map,
    Rating,
}

impl WidgetType {
    /// Every widget type in palette order
    pub const ALL: [WidgetType; 14] = [
        WidgetType::Text,
        WidgetType::Button,
        WidgetType::Form,
        WidgetType::Table,
        WidgetType::Chart,
        WidgetType::Calendar,
        WidgetType::Kanban,
        WidgetType::FileUpload,
        WidgetType::Timer,
        WidgetType::Counter,
        WidgetType::Image,
        WidgetType::Video,
        WidgetType::Map,
        WidgetType::Rating,
    ];

    /// Wire name of the type, as used in JSON and in generated component ids
    pub fn as_str(self) -> &'static str {
        match self {
            WidgetType::Text => "text",
            WidgetType::Button => "button",
            WidgetType::Form => "form",
            WidgetType::Table => "table",
            WidgetType::Chart => "chart",
            WidgetType::Calendar => "calendar",
            WidgetType::Kanban => "kanban",
            WidgetType::FileUpload => "fileUpload",
            WidgetType::Timer => "timer",
            WidgetType::Counter => "counter",
            WidgetType::Image => "image",
            WidgetType::Video => "video",
            WidgetType::Map => "map",
            WidgetType::Rating => "rating",
        }
    }

    /// Whether the type is an editor-only palette extension
    pub fn is_client_only(self) -> bool {
        matches!(
            self,
            WidgetType::Image | WidgetType::Video | WidgetType::Map | WidgetType::Rating
        )
    }

    /// Whether components of this type read or write data records in preview mode
    pub fn is_data_bound(self) -> bool {
        matches!(self, WidgetType::Form | WidgetType::Table)
    }
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known widget type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown widget type: {0}")]
pub struct UnknownWidgetType(pub String);

impl FromStr for WidgetType {
    type Err = UnknownWidgetType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WidgetType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownWidgetType(s.to_string()))
    }
}

fn text(value: &str) -> String {
    value.to_string()
}

fn texts(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextProps {
    pub content: String,
    pub font_size: String,
    pub text_align: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            content: text("Sample text"),
            font_size: text("medium"),
            text_align: text("left"),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ButtonProps {
    pub text: String,
    pub variant: String,
    pub size: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ButtonProps {
    fn default() -> Self {
        Self {
            text: text("Click me"),
            variant: text("primary"),
            size: text("medium"),
            extra: Map::new(),
        }
    }
}

/// One input of a form widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    /// Input kind: `text`, `textarea`, `select`, `date`, ...
    #[serde(rename = "type")]
    pub field_type: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    /// Choices for `select` inputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Input attributes the editor does not model (`placeholder`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FormField {
    pub fn new(name: &str, field_type: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            label: label.to_string(),
            required: false,
            options: None,
            extra: Map::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = Some(texts(options));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormProps {
    pub title: String,
    pub fields: Vec<FormField>,
    /// Collection that submissions are written to instead of the form's own id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_table: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for FormProps {
    fn default() -> Self {
        Self {
            title: text("New Form"),
            fields: vec![FormField::new("name", "text", "Name").required()],
            linked_table: None,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableProps {
    pub title: String,
    pub columns: Vec<String>,
    pub sortable: bool,
    pub filterable: bool,
    /// Collection the rows are read from instead of the table's own id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_collection: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for TableProps {
    fn default() -> Self {
        Self {
            title: text("Data Table"),
            columns: texts(&["Name", "Value"]),
            sortable: true,
            filterable: true,
            linked_collection: None,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub name: String,
    pub value: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartProps {
    pub title: String,
    /// `bar`, `line`, `pie`, ...
    #[serde(rename = "type")]
    pub chart_type: String,
    pub data: Vec<ChartPoint>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ChartProps {
    fn default() -> Self {
        let point = |name: &str, value: f64| ChartPoint {
            name: name.to_string(),
            value,
            extra: Map::new(),
        };
        Self {
            title: text("Chart"),
            chart_type: text("bar"),
            data: vec![point("A", 10.0), point("B", 20.0), point("C", 15.0)],
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalendarProps {
    pub title: String,
    pub view_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for CalendarProps {
    fn default() -> Self {
        Self {
            title: text("Calendar"),
            view_type: text("month"),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KanbanProps {
    pub title: String,
    pub columns: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for KanbanProps {
    fn default() -> Self {
        Self {
            title: text("Kanban Board"),
            columns: texts(&["To Do", "In Progress", "Done"]),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileUploadProps {
    pub title: String,
    pub accept: String,
    /// Megabytes
    pub max_size: u32,
    pub multiple: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for FileUploadProps {
    fn default() -> Self {
        Self {
            title: text("File Upload"),
            accept: text("*/*"),
            max_size: 10,
            multiple: false,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerProps {
    pub title: String,
    /// `countdown` or `stopwatch`
    #[serde(rename = "type")]
    pub timer_type: String,
    /// Seconds
    pub duration: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for TimerProps {
    fn default() -> Self {
        Self {
            title: text("Timer"),
            timer_type: text("countdown"),
            duration: 300,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CounterProps {
    pub title: String,
    pub initial_value: i64,
    pub step: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for CounterProps {
    fn default() -> Self {
        Self {
            title: text("Counter"),
            initial_value: 0,
            step: 1,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageProps {
    pub title: String,
    pub src: String,
    pub alt: String,
    pub caption: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ImageProps {
    fn default() -> Self {
        Self {
            title: text("Image"),
            src: String::new(),
            alt: text("Image"),
            caption: String::new(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoProps {
    pub title: String,
    pub src: String,
    pub controls: bool,
    pub autoplay: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for VideoProps {
    fn default() -> Self {
        Self {
            title: text("Video"),
            src: String::new(),
            controls: true,
            autoplay: false,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapProps {
    pub title: String,
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for MapProps {
    fn default() -> Self {
        Self {
            title: text("Map"),
            latitude: 0.0,
            longitude: 0.0,
            zoom: 10,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RatingProps {
    pub title: String,
    pub max_stars: u8,
    pub current_rating: u8,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for RatingProps {
    fn default() -> Self {
        Self {
            title: text("Rating"),
            max_stars: 5,
            current_rating: 0,
            extra: Map::new(),
        }
    }
}

macro_rules! widget_props {
    ($($variant:ident($props:ident)),* $(,)?) => {
        /// Type-specific configuration of a component, one variant per [`WidgetType`]
        ///
        /// Serializes as the bare props object; the discriminating `type`
        /// lives next to `props` on the component.
        #[derive(Debug, Clone, PartialEq)]
        pub enum WidgetProps {
            $($variant($props)),*
        }

        impl WidgetProps {
            /// The widget type this configuration belongs to
            pub fn widget_type(&self) -> WidgetType {
                match self {
                    $(WidgetProps::$variant(_) => WidgetType::$variant),*
                }
            }

            /// Palette defaults for a freshly created component of `widget_type`
            pub fn default_for(widget_type: WidgetType) -> Self {
                match widget_type {
                    $(WidgetType::$variant => WidgetProps::$variant($props::default())),*
                }
            }

            /// Decodes a props object for the given type
            ///
            /// `null` is treated as an empty object, so every field falls back
            /// to its palette default.
            pub fn from_value(widget_type: WidgetType, value: Value) -> Result<Self, serde_json::Error> {
                let value = match value {
                    Value::Null => Value::Object(Map::new()),
                    other => other,
                };
                match widget_type {
                    $(WidgetType::$variant => serde_json::from_value(value).map(WidgetProps::$variant)),*
                }
            }
        }

        impl Serialize for WidgetProps {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                match self {
                    $(WidgetProps::$variant(props) => props.serialize(serializer)),*
                }
            }
        }
    };
}

widget_props! {
    Text(TextProps),
    Button(ButtonProps),
    Form(FormProps),
    Table(TableProps),
    Chart(ChartProps),
    Calendar(CalendarProps),
    Kanban(KanbanProps),
    FileUpload(FileUploadProps),
    Timer(TimerProps),
    Counter(CounterProps),
    Image(ImageProps),
    Video(VideoProps),
    Map(MapProps),
    Rating(RatingProps),
}

/// CSS-like presentation attributes of a component
///
/// Purely cosmetic. Unknown attributes are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Styling {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_shadow: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Styling {
    /// Palette styling for a new component; currently identical for every type
    pub fn default_for(_widget_type: WidgetType) -> Self {
        Self {
            background_color: Some(text("#ffffff")),
            border_radius: Some(text("8px")),
            padding: Some(text("16px")),
            border: Some(text("1px solid #e5e7eb")),
            box_shadow: Some(text("0 1px 3px rgba(0, 0, 0, 0.1)")),
            extra: Map::new(),
        }
    }
}
