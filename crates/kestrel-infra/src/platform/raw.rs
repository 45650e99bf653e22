// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The toolkit's C event record.
//!
//! A [`RawEvent`] is a 128-byte record: a discriminator, a nanosecond
//! timestamp, and a union of per-kind payloads. Every payload is plain data, so
//! any bit pattern is a valid value; the accessors still only expose the
//! payload that matches the discriminator.

use std::ffi::c_void;
use std::fmt;

/// Discriminator values of the toolkit event record.
pub mod kind {
    /// The application was asked to quit.
    pub const QUIT: u32 = 0x100;

    /// First code of the window event range.
    pub const WINDOW_FIRST: u32 = 0x202;
    /// Window became visible.
    pub const WINDOW_SHOWN: u32 = 0x202;
    /// Window was hidden.
    pub const WINDOW_HIDDEN: u32 = 0x203;
    /// Window must be redrawn.
    pub const WINDOW_EXPOSED: u32 = 0x204;
    /// Window moved to `(data1, data2)`.
    pub const WINDOW_MOVED: u32 = 0x205;
    /// Window resized to `(data1, data2)`.
    pub const WINDOW_RESIZED: u32 = 0x206;
    /// Window pixel size changed to `(data1, data2)`.
    pub const WINDOW_PIXEL_SIZE_CHANGED: u32 = 0x207;
    /// Window was minimized.
    pub const WINDOW_MINIMIZED: u32 = 0x209;
    /// Window was maximized.
    pub const WINDOW_MAXIMIZED: u32 = 0x20A;
    /// Window was restored.
    pub const WINDOW_RESTORED: u32 = 0x20B;
    /// Mouse entered the window.
    pub const WINDOW_MOUSE_ENTER: u32 = 0x20C;
    /// Mouse left the window.
    pub const WINDOW_MOUSE_LEAVE: u32 = 0x20D;
    /// Window gained keyboard focus.
    pub const WINDOW_FOCUS_GAINED: u32 = 0x20E;
    /// Window lost keyboard focus.
    pub const WINDOW_FOCUS_LOST: u32 = 0x20F;
    /// The window manager asked the window to close.
    pub const WINDOW_CLOSE_REQUESTED: u32 = 0x210;
    /// Last code of the window event range.
    pub const WINDOW_LAST: u32 = 0x21A;

    /// A key was pressed.
    pub const KEY_DOWN: u32 = 0x300;
    /// A key was released.
    pub const KEY_UP: u32 = 0x301;

    /// The mouse moved.
    pub const MOUSE_MOTION: u32 = 0x400;
    /// A mouse button was pressed.
    pub const MOUSE_BUTTON_DOWN: u32 = 0x401;
    /// A mouse button was released.
    pub const MOUSE_BUTTON_UP: u32 = 0x402;

    /// A user event.
    pub const USER: u32 = 0x8000;

    /// Returns `true` if `code` lies in the window event range.
    #[inline]
    pub const fn is_window(code: u32) -> bool {
        code >= WINDOW_FIRST && code <= WINDOW_LAST
    }
}

/// Payload of the window event range.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawWindowEvent {
    /// The associated window.
    pub window_id: u32,
    /// Event dependent data.
    pub data1: i32,
    /// Event dependent data.
    pub data2: i32,
}

/// Payload of `KEY_DOWN` / `KEY_UP`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawKeyboardEvent {
    /// The window with keyboard focus.
    pub window_id: u32,
    /// The keyboard instance.
    pub which: u32,
    /// Physical key code.
    pub scancode: u32,
    /// Virtual key code.
    pub key: u32,
    /// Modifier state.
    pub modifiers: u16,
    /// Platform dependent scancode.
    pub raw: u16,
    /// Non-zero if the key is pressed.
    pub down: u8,
    /// Non-zero if this is a key repeat.
    pub repeat: u8,
}

/// Payload of `MOUSE_MOTION`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawMouseMotionEvent {
    /// The window with mouse focus.
    pub window_id: u32,
    /// The mouse instance.
    pub which: u32,
    /// Button state mask.
    pub state: u32,
    /// X coordinate, relative to the window.
    pub x: f32,
    /// Y coordinate, relative to the window.
    pub y: f32,
    /// Relative motion in X.
    pub xrel: f32,
    /// Relative motion in Y.
    pub yrel: f32,
}

/// Payload of `MOUSE_BUTTON_DOWN` / `MOUSE_BUTTON_UP`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawMouseButtonEvent {
    /// The window with mouse focus.
    pub window_id: u32,
    /// The mouse instance.
    pub which: u32,
    /// The button index.
    pub button: u8,
    /// Non-zero if the button is pressed.
    pub down: u8,
    /// 1 for single-click, 2 for double-click, etc.
    pub clicks: u8,
    /// Padding.
    pub padding: u8,
    /// X coordinate, relative to the window.
    pub x: f32,
    /// Y coordinate, relative to the window.
    pub y: f32,
}

/// Payload of `USER`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawUserEvent {
    /// The associated window, if any.
    pub window_id: u32,
    /// User defined event code.
    pub code: i32,
    /// User defined data pointer.
    pub data1: *mut c_void,
    /// User defined data pointer.
    pub data2: *mut c_void,
}

#[repr(C)]
#[derive(Clone, Copy)]
union RawEventData {
    window: RawWindowEvent,
    key: RawKeyboardEvent,
    motion: RawMouseMotionEvent,
    button: RawMouseButtonEvent,
    user: RawUserEvent,
    padding: [u8; 112],
}

/// The toolkit's event record.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct RawEvent {
    kind: u32,
    reserved: u32,
    timestamp_ns: u64,
    data: RawEventData,
}

impl RawEvent {
    /// Creates a record with the given discriminator and an all-zero payload.
    pub fn new(kind: u32, timestamp_ns: u64) -> Self {
        Self {
            kind,
            reserved: 0,
            timestamp_ns,
            data: RawEventData { padding: [0; 112] },
        }
    }

    /// A quit record.
    pub fn quit(timestamp_ns: u64) -> Self {
        Self::new(kind::QUIT, timestamp_ns)
    }

    /// A window record; `kind` must be in the window range.
    pub fn window(kind: u32, timestamp_ns: u64, payload: RawWindowEvent) -> Self {
        let mut event = Self::new(kind, timestamp_ns);
        event.data.window = payload;
        event
    }

    /// A key-down or key-up record.
    pub fn keyboard(down: bool, timestamp_ns: u64, payload: RawKeyboardEvent) -> Self {
        let kind = if down { kind::KEY_DOWN } else { kind::KEY_UP };
        let mut event = Self::new(kind, timestamp_ns);
        event.data.key = RawKeyboardEvent {
            down: down as u8,
            ..payload
        };
        event
    }

    /// A mouse-motion record.
    pub fn mouse_motion(timestamp_ns: u64, payload: RawMouseMotionEvent) -> Self {
        let mut event = Self::new(kind::MOUSE_MOTION, timestamp_ns);
        event.data.motion = payload;
        event
    }

    /// A mouse-button-down or mouse-button-up record.
    pub fn mouse_button(down: bool, timestamp_ns: u64, payload: RawMouseButtonEvent) -> Self {
        let kind = if down {
            kind::MOUSE_BUTTON_DOWN
        } else {
            kind::MOUSE_BUTTON_UP
        };
        let mut event = Self::new(kind, timestamp_ns);
        event.data.button = RawMouseButtonEvent {
            down: down as u8,
            ..payload
        };
        event
    }

    /// A user record.
    pub fn user(timestamp_ns: u64, payload: RawUserEvent) -> Self {
        let mut event = Self::new(kind::USER, timestamp_ns);
        event.data.user = payload;
        event
    }

    /// The record's discriminator.
    #[inline]
    pub fn kind(&self) -> u32 {
        self.kind
    }

    /// Nanoseconds since the toolkit started.
    #[inline]
    pub fn timestamp_ns(&self) -> u64 {
        self.timestamp_ns
    }

    /// The window payload, if this is a window record.
    pub fn window_data(&self) -> Option<&RawWindowEvent> {
        // SAFETY: the payload types are plain data valid for any bit pattern and
        // the record is fully initialised, by `new` or by the C toolkit.
        kind::is_window(self.kind).then(|| unsafe { &self.data.window })
    }

    /// The keyboard payload, if this is a key record.
    pub fn key_data(&self) -> Option<&RawKeyboardEvent> {
        let is_key = matches!(self.kind, kind::KEY_DOWN | kind::KEY_UP);
        // SAFETY: see `window_data`.
        is_key.then(|| unsafe { &self.data.key })
    }

    /// The motion payload, if this is a mouse-motion record.
    pub fn motion_data(&self) -> Option<&RawMouseMotionEvent> {
        // SAFETY: see `window_data`.
        (self.kind == kind::MOUSE_MOTION).then(|| unsafe { &self.data.motion })
    }

    /// The button payload, if this is a mouse-button record.
    pub fn button_data(&self) -> Option<&RawMouseButtonEvent> {
        let is_button = matches!(self.kind, kind::MOUSE_BUTTON_DOWN | kind::MOUSE_BUTTON_UP);
        // SAFETY: see `window_data`.
        is_button.then(|| unsafe { &self.data.button })
    }

    /// The user payload, if this is a user record.
    pub fn user_data(&self) -> Option<&RawUserEvent> {
        // SAFETY: see `window_data`.
        (self.kind == kind::USER).then(|| unsafe { &self.data.user })
    }
}

impl fmt::Debug for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawEvent")
            .field("kind", &format_args!("{:#06x}", self.kind))
            .field("timestamp_ns", &self.timestamp_ns)
            .finish_non_exhaustive()
    }
}
