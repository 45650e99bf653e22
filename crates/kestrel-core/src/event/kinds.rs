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

//! The closed set of built-in event variants.

use std::any::Any;
use std::borrow::Cow;
use std::ffi::c_void;

use super::base::{timestamp_now, Event, EventType};

macro_rules! impl_builtin_event {
    ($ty:ty, $code:expr) => {
        impl Event for $ty {
            fn event_type(&self) -> EventType {
                $code
            }

            fn timestamp(&self) -> u64 {
                self.timestamp
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

/// The application was asked to terminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuitEvent {
    /// Milliseconds since start-up.
    pub timestamp: u64,
}

impl QuitEvent {
    /// Creates a quit event stamped with the current time.
    pub fn new() -> Self {
        Self {
            timestamp: timestamp_now(),
        }
    }
}

impl Default for QuitEvent {
    fn default() -> Self {
        Self::new()
    }
}

impl_builtin_event!(QuitEvent, EventType::QUIT);

/// A mouse button was pressed or released.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseButtonEvent {
    /// Milliseconds since start-up.
    pub timestamp: u64,
    /// The window with mouse focus.
    pub window_id: u32,
    /// The mouse instance that produced the event.
    pub device_id: u32,
    /// Cursor x position, relative to the window.
    pub x: f32,
    /// Cursor y position, relative to the window.
    pub y: f32,
    /// The button index (1 = left, 2 = middle, 3 = right, ...).
    pub button: u8,
    /// `true` on press, `false` on release.
    pub pressed: bool,
    /// 1 for a single click, 2 for a double click, and so on.
    pub clicks: u8,
}

impl_builtin_event!(MouseButtonEvent, EventType::MOUSE_BUTTON);

/// The mouse moved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseMotionEvent {
    /// Milliseconds since start-up.
    pub timestamp: u64,
    /// The window with mouse focus.
    pub window_id: u32,
    /// The mouse instance that produced the event.
    pub device_id: u32,
    /// Cursor x position, relative to the window.
    pub x: f32,
    /// Cursor y position, relative to the window.
    pub y: f32,
    /// Relative motion along x.
    pub dx: f32,
    /// Relative motion along y.
    pub dy: f32,
    /// Buttons held during the motion; bit `n - 1` is button `n`.
    pub button_mask: u32,
}

impl MouseMotionEvent {
    /// Returns `true` if `button` was held while the mouse moved.
    pub fn is_button_held(&self, button: u8) -> bool {
        button != 0 && button <= 32 && self.button_mask & (1 << (button - 1)) != 0
    }
}

impl_builtin_event!(MouseMotionEvent, EventType::MOUSE_MOTION);

/// Resolves a key symbol into a display name.
pub type KeyNameResolver = fn(u32) -> Cow<'static, str>;

/// The fallback key-name resolver.
///
/// Printable ASCII symbols resolve to their upper-case character, anything
/// else to its hexadecimal code.
pub fn default_key_name(key: u32) -> Cow<'static, str> {
    match char::from_u32(key) {
        Some(c) if c.is_ascii_graphic() => Cow::Owned(c.to_ascii_uppercase().to_string()),
        Some(' ') => Cow::Borrowed("Space"),
        _ => Cow::Owned(format!("{key:#x}")),
    }
}

/// Keyboard modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyModifiers(pub u16);

impl KeyModifiers {
    /// No modifier held.
    pub const NONE: KeyModifiers = KeyModifiers(0x0000);
    /// Left shift.
    pub const LSHIFT: KeyModifiers = KeyModifiers(0x0001);
    /// Right shift.
    pub const RSHIFT: KeyModifiers = KeyModifiers(0x0002);
    /// Left control.
    pub const LCTRL: KeyModifiers = KeyModifiers(0x0040);
    /// Right control.
    pub const RCTRL: KeyModifiers = KeyModifiers(0x0080);
    /// Left alt.
    pub const LALT: KeyModifiers = KeyModifiers(0x0100);
    /// Right alt.
    pub const RALT: KeyModifiers = KeyModifiers(0x0200);
    /// Left GUI (Windows / Command) key.
    pub const LGUI: KeyModifiers = KeyModifiers(0x0400);
    /// Right GUI (Windows / Command) key.
    pub const RGUI: KeyModifiers = KeyModifiers(0x0800);
    /// Num lock is on.
    pub const NUM: KeyModifiers = KeyModifiers(0x1000);
    /// Caps lock is on.
    pub const CAPS: KeyModifiers = KeyModifiers(0x2000);
    /// Either shift key.
    pub const SHIFT: KeyModifiers = KeyModifiers(0x0003);
    /// Either control key.
    pub const CTRL: KeyModifiers = KeyModifiers(0x00C0);
    /// Either alt key.
    pub const ALT: KeyModifiers = KeyModifiers(0x0300);
    /// Either GUI key.
    pub const GUI: KeyModifiers = KeyModifiers(0x0C00);

    /// Returns `true` if any bit of `other` is set.
    #[inline]
    pub const fn intersects(self, other: KeyModifiers) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns `true` if no modifier is set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// A key was pressed or released.
#[derive(Debug, Clone, Copy)]
pub struct KeyboardEvent {
    /// Milliseconds since start-up.
    pub timestamp: u64,
    /// The window with keyboard focus.
    pub window_id: u32,
    /// The physical key code.
    pub scancode: u32,
    /// The virtual key symbol, layout dependent.
    pub key: u32,
    /// Resolves [`KeyboardEvent::key`] into a name.
    pub key_name_resolver: KeyNameResolver,
    /// `true` on press, `false` on release.
    pub pressed: bool,
    /// `true` if this is a key repeat.
    pub repeat: bool,
    /// Modifier state at the time of the event.
    pub modifiers: KeyModifiers,
}

impl KeyboardEvent {
    /// The display name of the key symbol.
    pub fn key_name(&self) -> Cow<'static, str> {
        (self.key_name_resolver)(self.key)
    }
}

impl_builtin_event!(KeyboardEvent, EventType::KEYBOARD);

/// The kind of window state change carried by a [`WindowEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowEventKind {
    /// The window became visible.
    Shown,
    /// The window was hidden.
    Hidden,
    /// Part of the window must be redrawn.
    Exposed,
    /// The window moved; the payload is the new position.
    Moved,
    /// The window was resized; the payload is the new size.
    Resized,
    /// The drawable size changed; the payload is the new pixel size.
    PixelSizeChanged,
    /// The window was minimized.
    Minimized,
    /// The window was maximized.
    Maximized,
    /// The window was restored from minimized or maximized.
    Restored,
    /// The mouse entered the window.
    MouseEnter,
    /// The mouse left the window.
    MouseLeave,
    /// The window gained keyboard focus.
    FocusGained,
    /// The window lost keyboard focus.
    FocusLost,
    /// The window manager asked the window to close.
    CloseRequested,
    /// Any other window notification, identified by its platform code.
    Other(u32),
}

/// A window changed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowEvent {
    /// Milliseconds since start-up.
    pub timestamp: u64,
    /// The window the change applies to.
    pub window_id: u32,
    /// What happened.
    pub kind: WindowEventKind,
    /// New position or size, for the kinds that carry one.
    pub data: Option<(i32, i32)>,
}

impl_builtin_event!(WindowEvent, EventType::WINDOW);

/// A pointer the event core carries but never dereferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpaquePtr(pub *mut c_void);

// SAFETY: the pointer is only ever moved around as a value. Whoever created it
// is responsible for what it points to and for synchronising access to it.
unsafe impl Send for OpaquePtr {}
// SAFETY: see above; no access goes through `&OpaquePtr`.
unsafe impl Sync for OpaquePtr {}

impl OpaquePtr {
    /// A null pointer.
    pub const fn null() -> Self {
        OpaquePtr(std::ptr::null_mut())
    }

    /// Returns the wrapped pointer.
    pub const fn as_ptr(self) -> *mut c_void {
        self.0
    }

    /// Returns `true` if the pointer is null.
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl Default for OpaquePtr {
    fn default() -> Self {
        Self::null()
    }
}

/// A toolkit-level user event with an integer code and two opaque pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserEvent {
    /// Milliseconds since start-up.
    pub timestamp: u64,
    /// The associated window, if any (0 otherwise).
    pub window_id: u32,
    /// A user-defined code.
    pub code: i32,
    /// User data.
    pub data1: OpaquePtr,
    /// User data.
    pub data2: OpaquePtr,
}

impl_builtin_event!(UserEvent, EventType::USER);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_events_report_their_canonical_codes() {
        let quit = QuitEvent { timestamp: 7 };
        assert_eq!(quit.event_type(), EventType::QUIT);
        assert_eq!(quit.timestamp(), 7);

        let window = WindowEvent {
            timestamp: 0,
            window_id: 1,
            kind: WindowEventKind::Resized,
            data: Some((800, 600)),
        };
        assert_eq!(window.event_type(), EventType::WINDOW);

        let user = UserEvent {
            timestamp: 0,
            window_id: 0,
            code: 3,
            data1: OpaquePtr::null(),
            data2: OpaquePtr::default(),
        };
        assert_eq!(user.event_type(), EventType::USER);
        assert!(user.data1.is_null());
    }

    #[test]
    fn motion_button_mask_maps_buttons_to_bits() {
        let motion = MouseMotionEvent {
            timestamp: 0,
            window_id: 1,
            device_id: 0,
            x: 0.0,
            y: 0.0,
            dx: 1.0,
            dy: -1.0,
            button_mask: 0b101,
        };
        assert!(motion.is_button_held(1));
        assert!(!motion.is_button_held(2));
        assert!(motion.is_button_held(3));
        assert!(!motion.is_button_held(0));
        assert!(!motion.is_button_held(40));
    }

    #[test]
    fn keyboard_event_uses_its_resolver() {
        fn resolver(key: u32) -> Cow<'static, str> {
            if key == 27 {
                Cow::Borrowed("Escape")
            } else {
                default_key_name(key)
            }
        }

        let mut key = KeyboardEvent {
            timestamp: 0,
            window_id: 1,
            scancode: 41,
            key: 27,
            key_name_resolver: resolver,
            pressed: true,
            repeat: false,
            modifiers: KeyModifiers::LSHIFT,
        };
        assert_eq!(key.key_name(), "Escape");
        assert!(key.modifiers.intersects(KeyModifiers::SHIFT));
        assert!(!key.modifiers.intersects(KeyModifiers::CTRL));

        key.key = 'a' as u32;
        assert_eq!(key.key_name(), "A");
    }

    #[test]
    fn default_key_name_falls_back_to_hex() {
        assert_eq!(default_key_name(' ' as u32), "Space");
        assert_eq!(default_key_name(0x4000_003a), "0x4000003a");
    }
}
