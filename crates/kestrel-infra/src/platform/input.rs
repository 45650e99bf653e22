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

//! Provides translation from the C toolkit's event records to Kestrel's domain
//! events.
//!
//! This module is the adaptor layer: nothing outside it knows the toolkit's
//! record layout or discriminator values.

use std::borrow::Cow;

use kestrel_core::event::{
    default_key_name, BoxedEvent, EventAdaptor, KeyModifiers, KeyboardEvent, MouseButtonEvent,
    MouseMotionEvent, OpaquePtr, QuitEvent, UserEvent, WindowEvent, WindowEventKind,
};
use kestrel_core::{Error, Result};

use super::raw::{kind, RawEvent};

const NANOS_PER_MILLI: u64 = 1_000_000;

/// Translates [`RawEvent`] records into domain events.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolkitEventAdaptor;

impl ToolkitEventAdaptor {
    /// Creates the adaptor.
    pub fn new() -> Self {
        Self
    }
}

impl EventAdaptor for ToolkitEventAdaptor {
    type Raw = RawEvent;

    fn adapt(&self, raw: &RawEvent) -> Result<BoxedEvent> {
        let timestamp = raw.timestamp_ns() / NANOS_PER_MILLI;

        if raw.kind() == kind::QUIT {
            return Ok(Box::new(QuitEvent { timestamp }));
        }
        if let Some(window) = raw.window_data() {
            let kind = map_window_kind(raw.kind());
            let data = match kind {
                WindowEventKind::Moved
                | WindowEventKind::Resized
                | WindowEventKind::PixelSizeChanged => Some((window.data1, window.data2)),
                _ => None,
            };
            return Ok(Box::new(WindowEvent {
                timestamp,
                window_id: window.window_id,
                kind,
                data,
            }));
        }
        if let Some(key) = raw.key_data() {
            return Ok(Box::new(KeyboardEvent {
                timestamp,
                window_id: key.window_id,
                scancode: key.scancode,
                key: key.key,
                key_name_resolver: toolkit_key_name,
                pressed: raw.kind() == kind::KEY_DOWN,
                repeat: key.repeat != 0,
                modifiers: KeyModifiers(key.modifiers),
            }));
        }
        if let Some(motion) = raw.motion_data() {
            return Ok(Box::new(MouseMotionEvent {
                timestamp,
                window_id: motion.window_id,
                device_id: motion.which,
                x: motion.x,
                y: motion.y,
                dx: motion.xrel,
                dy: motion.yrel,
                button_mask: motion.state,
            }));
        }
        if let Some(button) = raw.button_data() {
            return Ok(Box::new(MouseButtonEvent {
                timestamp,
                window_id: button.window_id,
                device_id: button.which,
                x: button.x,
                y: button.y,
                button: button.button,
                pressed: raw.kind() == kind::MOUSE_BUTTON_DOWN,
                clicks: button.clicks,
            }));
        }
        if let Some(user) = raw.user_data() {
            return Ok(Box::new(UserEvent {
                timestamp,
                window_id: user.window_id,
                code: user.code,
                data1: OpaquePtr(user.data1),
                data2: OpaquePtr(user.data2),
            }));
        }

        Err(Error::UnknownEvent(raw.kind()))
    }

    fn is_quit(&self, raw: &RawEvent) -> bool {
        raw.kind() == kind::QUIT
    }
}

// --- Private Helper Functions ---

fn map_window_kind(code: u32) -> WindowEventKind {
    match code {
        kind::WINDOW_SHOWN => WindowEventKind::Shown,
        kind::WINDOW_HIDDEN => WindowEventKind::Hidden,
        kind::WINDOW_EXPOSED => WindowEventKind::Exposed,
        kind::WINDOW_MOVED => WindowEventKind::Moved,
        kind::WINDOW_RESIZED => WindowEventKind::Resized,
        kind::WINDOW_PIXEL_SIZE_CHANGED => WindowEventKind::PixelSizeChanged,
        kind::WINDOW_MINIMIZED => WindowEventKind::Minimized,
        kind::WINDOW_MAXIMIZED => WindowEventKind::Maximized,
        kind::WINDOW_RESTORED => WindowEventKind::Restored,
        kind::WINDOW_MOUSE_ENTER => WindowEventKind::MouseEnter,
        kind::WINDOW_MOUSE_LEAVE => WindowEventKind::MouseLeave,
        kind::WINDOW_FOCUS_GAINED => WindowEventKind::FocusGained,
        kind::WINDOW_FOCUS_LOST => WindowEventKind::FocusLost,
        kind::WINDOW_CLOSE_REQUESTED => WindowEventKind::CloseRequested,
        other => WindowEventKind::Other(other),
    }
}

/// Virtual key codes outside the printable range carry this bit.
const SCANCODE_MASK: u32 = 1 << 30;

/// Names the toolkit's special keys, deferring to [`default_key_name`] for the rest.
fn toolkit_key_name(key: u32) -> Cow<'static, str> {
    let name = match key {
        0x08 => "Backspace",
        0x09 => "Tab",
        0x0D => "Return",
        0x1B => "Escape",
        0x7F => "Delete",
        k if k & SCANCODE_MASK != 0 => match k & !SCANCODE_MASK {
            sc @ 0x3A..=0x45 => return Cow::Owned(format!("F{}", sc - 0x3A + 1)),
            0x4F => "Right",
            0x50 => "Left",
            0x51 => "Down",
            0x52 => "Up",
            _ => return default_key_name(key),
        },
        _ => return default_key_name(key),
    };
    Cow::Borrowed(name)
}

// --- Unit Tests for Event Translation ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::raw::{
        RawKeyboardEvent, RawMouseButtonEvent, RawMouseMotionEvent, RawUserEvent, RawWindowEvent,
    };
    use kestrel_core::event::EventType;

    fn adapt(raw: RawEvent) -> BoxedEvent {
        ToolkitEventAdaptor::new().adapt(&raw).expect("known record")
    }

    #[test]
    fn quit_record_becomes_quit_event() {
        let adaptor = ToolkitEventAdaptor::new();
        let raw = RawEvent::quit(3_000_000);
        assert!(adaptor.is_quit(&raw));

        let event = adapt(raw);
        assert_eq!(event.event_type(), EventType::QUIT);
        assert_eq!(event.timestamp(), 3);
    }

    #[test]
    fn mouse_button_down_keeps_position_and_button() {
        let event = adapt(RawEvent::mouse_button(
            true,
            0,
            RawMouseButtonEvent {
                window_id: 1,
                button: 1,
                clicks: 2,
                x: 100.0,
                y: 200.0,
                ..Default::default()
            },
        ));
        let button = event.downcast_ref::<MouseButtonEvent>().unwrap();
        assert_eq!((button.x, button.y), (100.0, 200.0));
        assert_eq!(button.button, 1);
        assert_eq!(button.clicks, 2);
        assert!(button.pressed);
    }

    #[test]
    fn mouse_button_up_is_not_pressed() {
        let event = adapt(RawEvent::mouse_button(false, 0, RawMouseButtonEvent::default()));
        assert!(!event.downcast_ref::<MouseButtonEvent>().unwrap().pressed);
        assert!(!ToolkitEventAdaptor::new().is_quit(&RawEvent::mouse_button(
            false,
            0,
            RawMouseButtonEvent::default()
        )));
    }

    #[test]
    fn mouse_motion_carries_deltas_and_mask() {
        let event = adapt(RawEvent::mouse_motion(
            0,
            RawMouseMotionEvent {
                state: 0b1,
                x: 4.0,
                y: 5.0,
                xrel: -1.0,
                yrel: 2.0,
                ..Default::default()
            },
        ));
        let motion = event.downcast_ref::<MouseMotionEvent>().unwrap();
        assert_eq!((motion.dx, motion.dy), (-1.0, 2.0));
        assert!(motion.is_button_held(1));
        assert_eq!(event.event_type(), EventType::MOUSE_MOTION);
    }

    #[test]
    fn keyboard_records_resolve_toolkit_key_names() {
        let event = adapt(RawEvent::keyboard(
            true,
            0,
            RawKeyboardEvent {
                key: 0x1B,
                modifiers: KeyModifiers::LCTRL.0,
                repeat: 1,
                ..Default::default()
            },
        ));
        let key = event.downcast_ref::<KeyboardEvent>().unwrap();
        assert!(key.pressed);
        assert!(key.repeat);
        assert!(key.modifiers.intersects(KeyModifiers::CTRL));
        assert_eq!(key.key_name(), "Escape");
    }

    #[test]
    fn special_key_names() {
        assert_eq!(toolkit_key_name(SCANCODE_MASK | 0x3A), "F1");
        assert_eq!(toolkit_key_name(SCANCODE_MASK | 0x45), "F12");
        assert_eq!(toolkit_key_name(SCANCODE_MASK | 0x52), "Up");
        assert_eq!(toolkit_key_name('a' as u32), "A");
        assert_eq!(toolkit_key_name(' ' as u32), "Space");
    }

    #[test]
    fn resize_carries_size_but_focus_does_not() {
        let payload = RawWindowEvent {
            window_id: 9,
            data1: 640,
            data2: 480,
        };
        let resized = adapt(RawEvent::window(kind::WINDOW_RESIZED, 0, payload));
        let resized = resized.downcast_ref::<WindowEvent>().unwrap();
        assert_eq!(resized.kind, WindowEventKind::Resized);
        assert_eq!(resized.data, Some((640, 480)));

        let focus = adapt(RawEvent::window(kind::WINDOW_FOCUS_GAINED, 0, payload));
        assert_eq!(focus.downcast_ref::<WindowEvent>().unwrap().data, None);

        let other = adapt(RawEvent::window(0x211, 0, payload));
        assert_eq!(
            other.downcast_ref::<WindowEvent>().unwrap().kind,
            WindowEventKind::Other(0x211)
        );
    }

    #[test]
    fn user_record_keeps_code_and_pointers() {
        let mut slot = 0u8;
        let ptr = &mut slot as *mut u8 as *mut std::ffi::c_void;
        let event = adapt(RawEvent::user(
            0,
            RawUserEvent {
                window_id: 0,
                code: 42,
                data1: ptr,
                data2: std::ptr::null_mut(),
            },
        ));
        let user = event.downcast_ref::<UserEvent>().unwrap();
        assert_eq!(user.code, 42);
        assert_eq!(user.data1.as_ptr(), ptr);
        assert!(user.data2.is_null());
    }

    #[test]
    fn unrecognised_discriminator_is_reported() {
        let err = ToolkitEventAdaptor::new()
            .adapt(&RawEvent::new(0x600, 0))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownEvent(0x600)));
        assert!(err.is_benign());
    }
}
