//! Input abstraction layer.
//!
//! Normalizes host pointer and keyboard events into a unified `InputEvent`
//! consumed by the interaction session and the shortcut map. Pointer
//! coordinates are client (viewport) pixels; the session maps them into
//! document space.

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start, pen contact).
    PointerDown {
        pointer_id: i32,
        client_x: f32,
        client_y: f32,
    },

    PointerMove {
        pointer_id: i32,
        client_x: f32,
        client_y: f32,
    },

    /// Pointer released.
    PointerUp {
        pointer_id: i32,
        client_x: f32,
        client_y: f32,
    },

    /// The host took the pointer away (lost capture, touch cancelled).
    PointerCancel { pointer_id: i32 },

    /// Keyboard shortcut.
    Key {
        key: String,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
    },
}

impl InputEvent {
    pub fn pointer_down(pointer_id: i32, client_x: f32, client_y: f32) -> Self {
        Self::PointerDown {
            pointer_id,
            client_x,
            client_y,
        }
    }

    pub fn pointer_move(pointer_id: i32, client_x: f32, client_y: f32) -> Self {
        Self::PointerMove {
            pointer_id,
            client_x,
            client_y,
        }
    }

    pub fn pointer_up(pointer_id: i32, client_x: f32, client_y: f32) -> Self {
        Self::PointerUp {
            pointer_id,
            client_x,
            client_y,
        }
    }

    pub fn pointer_id(&self) -> Option<i32> {
        match self {
            Self::PointerDown { pointer_id, .. }
            | Self::PointerMove { pointer_id, .. }
            | Self::PointerUp { pointer_id, .. }
            | Self::PointerCancel { pointer_id } => Some(*pointer_id),
            Self::Key { .. } => None,
        }
    }

    /// Client position if this is a positioned pointer event.
    pub fn position(&self) -> Option<(f32, f32)> {
        match self {
            Self::PointerDown {
                client_x, client_y, ..
            }
            | Self::PointerMove {
                client_x, client_y, ..
            }
            | Self::PointerUp {
                client_x, client_y, ..
            } => Some((*client_x, *client_y)),
            _ => None,
        }
    }
}
