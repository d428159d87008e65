//! Layout editing core
//!
//! - [`widget`]: widget types, typed props and default tables
//! - [`document`]: the layout document and its mutation API
//! - [`gesture`]: snap-to-grid, drag and resize arithmetic
//! - [`session`]: an editing session (document + selection + gesture)

pub mod document;
pub mod gesture;
pub mod session;
pub mod widget;

pub use document::{
    Component, ComponentUpdate, EventBinding, LayoutDocument, Position, Theme, DUPLICATE_OFFSET,
};
pub use gesture::{Gesture, Point, ResizeHandle, MIN_HEIGHT, MIN_WIDTH};
pub use session::{EditorMode, EditorSession, SaveStatus};
pub use widget::{Styling, WidgetProps, WidgetType};

/// Errors raised by layout operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("component {id} is a {expected}, cannot apply {found} props")]
    TypeMismatch {
        id: String,
        expected: WidgetType,
        found: WidgetType,
    },

    #[error("duplicate component id: {0}")]
    DuplicateId(String),

    #[error("invalid color for {field}: {value:?}")]
    InvalidColor { field: &'static str, value: String },
}
