//! Direct manipulation: snap-to-grid, drag and resize arithmetic
//!
//! Pointer coordinates are floating point (client pixels); component
//! geometry is integral. Every coordinate produced here is a multiple of the
//! grid pitch.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::document::Position;

/// Smallest width a resize can produce
pub const MIN_WIDTH: u32 = 100;
/// Smallest height a resize can produce
pub const MIN_HEIGHT: u32 = 60;

/// A pointer location or displacement in canvas pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Displacement from `origin` to `self`
    pub fn delta_from(self, origin: Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }
}

/// Rounds `value` to the nearest multiple of `grid_size`
///
/// Halves round towards positive infinity: `snap(10.0, 20) == 20` and
/// `snap(-10.0, 20) == 0`. Results beyond the `i64` range saturate.
pub fn snap(value: f64, grid_size: NonZeroU32) -> i64 {
    let grid = grid_size.get();
    let steps = (value / f64::from(grid) + 0.5).floor() as i64;
    steps.saturating_mul(i64::from(grid))
}

/// Snaps `value` onto a canvas coordinate: never negative, never past the
/// largest multiple of `grid_size` that fits a `u32`
pub fn snap_coord(value: f64, grid_size: NonZeroU32) -> u32 {
    to_coord(snap(value, grid_size), grid_size)
}

fn to_coord(value: i64, grid_size: NonZeroU32) -> u32 {
    let grid = grid_size.get();
    let ceiling = u32::MAX - u32::MAX % grid;
    u32::try_from(value.max(0)).map_or(ceiling, |v| v.min(ceiling))
}

/// New position of a component dragged by `delta` from `origin`
///
/// Both axes are snapped, then clamped at zero. Size is unchanged.
pub fn drag_position(origin: Position, delta: Point, grid_size: NonZeroU32) -> Position {
    Position {
        x: snap_coord(f64::from(origin.x) + delta.x, grid_size),
        y: snap_coord(f64::from(origin.y) + delta.y, grid_size),
        ..origin
    }
}

/// One of the eight handles around a selected component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    Ne,
    Nw,
    Se,
    Sw,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::N,
        ResizeHandle::S,
        ResizeHandle::E,
        ResizeHandle::W,
        ResizeHandle::Ne,
        ResizeHandle::Nw,
        ResizeHandle::Se,
        ResizeHandle::Sw,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResizeHandle::N => "n",
            ResizeHandle::S => "s",
            ResizeHandle::E => "e",
            ResizeHandle::W => "w",
            ResizeHandle::Ne => "ne",
            ResizeHandle::Nw => "nw",
            ResizeHandle::Se => "se",
            ResizeHandle::Sw => "sw",
        }
    }

    fn moves_left_edge(self) -> bool {
        matches!(self, ResizeHandle::W | ResizeHandle::Nw | ResizeHandle::Sw)
    }

    fn moves_right_edge(self) -> bool {
        matches!(self, ResizeHandle::E | ResizeHandle::Ne | ResizeHandle::Se)
    }

    fn moves_top_edge(self) -> bool {
        matches!(self, ResizeHandle::N | ResizeHandle::Ne | ResizeHandle::Nw)
    }

    fn moves_bottom_edge(self) -> bool {
        matches!(self, ResizeHandle::S | ResizeHandle::Se | ResizeHandle::Sw)
    }
}

impl fmt::Display for ResizeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resize handle: {0}")]
pub struct UnknownHandle(pub String);

impl FromStr for ResizeHandle {
    type Err = UnknownHandle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResizeHandle::ALL
            .into_iter()
            .find(|h| h.as_str() == s)
            .ok_or_else(|| UnknownHandle(s.to_string()))
    }
}

/// Resizes one axis. Returns the new `(start, length)`.
///
/// When the leading edge moves, the trailing edge stays where it was: the
/// start is derived from the clamped length. If that would push the start
/// below zero, the start is pinned at zero and the length shrinks to the
/// trailing edge (never below `min`).
fn resize_axis(
    start: u32,
    length: u32,
    delta: f64,
    leading: bool,
    trailing: bool,
    min: u32,
    grid_size: NonZeroU32,
) -> (u32, u32) {
    let start = i64::from(start);
    let length = i64::from(length);
    let min = i64::from(min);

    if trailing {
        let new_length = snap(length as f64 + delta, grid_size).max(min);
        return (to_coord(start, grid_size), to_coord(new_length, grid_size));
    }
    if leading {
        let end = start + length;
        let new_length = snap(length as f64 - delta, grid_size).max(min);
        let new_start = snap((end - new_length) as f64, grid_size);
        if new_start < 0 {
            return (0, to_coord(end.max(min), grid_size));
        }
        return (to_coord(new_start, grid_size), to_coord(new_length, grid_size));
    }
    (to_coord(start, grid_size), to_coord(length, grid_size))
}

/// New geometry of a component resized through `handle` by `delta` from `origin`
///
/// Width never drops below [`MIN_WIDTH`] and height never below
/// [`MIN_HEIGHT`], whatever the delta. Handles on the left or top edge move
/// the position so that the opposite edge stays fixed.
pub fn resize_position(
    origin: Position,
    handle: ResizeHandle,
    delta: Point,
    grid_size: NonZeroU32,
) -> Position {
    let (x, width) = resize_axis(
        origin.x,
        origin.width,
        delta.x,
        handle.moves_left_edge(),
        handle.moves_right_edge(),
        MIN_WIDTH,
        grid_size,
    );
    let (y, height) = resize_axis(
        origin.y,
        origin.height,
        delta.y,
        handle.moves_top_edge(),
        handle.moves_bottom_edge(),
        MIN_HEIGHT,
        grid_size,
    );
    Position {
        x,
        y,
        width,
        height,
    }
}

/// Captured at pointer-down on a component body
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pub component_id: String,
    pub pointer_start: Point,
    pub origin: Position,
}

/// Captured at pointer-down on a resize handle
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeState {
    pub component_id: String,
    pub handle: ResizeHandle,
    pub pointer_start: Point,
    pub origin: Position,
}

/// The canvas gesture in progress; at most one at a time
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    Dragging(DragState),
    Resizing(ResizeState),
}

impl Gesture {
    pub fn is_active(&self) -> bool {
        !matches!(self, Gesture::Idle)
    }

    pub fn component_id(&self) -> Option<&str> {
        match self {
            Gesture::Idle => None,
            Gesture::Dragging(state) => Some(&state.component_id),
            Gesture::Resizing(state) => Some(&state.component_id),
        }
    }

    /// Geometry the gesture's component should have with the pointer at `pointer`
    pub fn target(&self, pointer: Point, grid_size: NonZeroU32) -> Option<(&str, Position)> {
        match self {
            Gesture::Idle => None,
            Gesture::Dragging(state) => {
                let delta = pointer.delta_from(state.pointer_start);
                Some((
                    state.component_id.as_str(),
                    drag_position(state.origin, delta, grid_size),
                ))
            }
            Gesture::Resizing(state) => {
                let delta = pointer.delta_from(state.pointer_start);
                Some((
                    state.component_id.as_str(),
                    resize_position(state.origin, state.handle, delta, grid_size),
                ))
            }
        }
    }
}
