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

use std::time::Duration;

use anyhow::Result;
use kestrel_infra::platform::raw::{kind, RawKeyboardEvent, RawMouseMotionEvent, RawWindowEvent};
use kestrel_infra::{HostDriver, RawEvent, ScriptedEvents, Timer};
use kestrel_sdk::prelude::*;

/// Published by the heartbeat timer from its own thread.
#[derive(Debug, Event)]
struct Heartbeat {
    timestamp: u64,
    beat: u32,
}

#[derive(Default, EventHandler)]
#[handles(MouseMotionEvent, WindowEvent)]
struct Tracker {
    distance: f32,
    size: Option<(i32, i32)>,
}

impl EventHandler<MouseMotionEvent> for Tracker {
    fn handle(&mut self, event: &MouseMotionEvent) -> Result<()> {
        self.distance += event.dx.hypot(event.dy);
        Ok(())
    }
}

impl EventHandler<WindowEvent> for Tracker {
    fn handle(&mut self, event: &WindowEvent) -> Result<()> {
        if event.kind == WindowEventKind::Resized {
            self.size = event.data;
            log::info!("Window resized to {:?}", event.data);
        }
        Ok(())
    }
}

#[derive(Default)]
struct SandboxApp {
    tracker: std::rc::Rc<std::cell::RefCell<Tracker>>,
    heartbeat: Option<Timer>,
    frames: u64,
}

impl Application for SandboxApp {
    fn init(&mut self, context: &mut AppContext<'_>) -> Result<bool> {
        context.register(std::rc::Rc::clone(&self.tracker));

        let sender = context.sender();
        context.on(move |key: &KeyboardEvent| {
            log::info!("Key {} {}", key.key_name(), if key.pressed { "down" } else { "up" });
            if key.pressed && key.key_name() == "Escape" {
                sender.publish(QuitEvent::new())?;
            }
            Ok(())
        });
        context.on(|beat: &Heartbeat| {
            log::info!("Heartbeat {} at {} ms", beat.beat, beat.timestamp);
            Ok(())
        });

        let sender = context.sender();
        let mut beat = 0;
        self.heartbeat = Some(Timer::start(Duration::from_millis(50), move || {
            beat += 1;
            match sender.publish(Heartbeat {
                timestamp: kestrel_core::event::timestamp_now(),
                beat,
            }) {
                Ok(()) => Duration::from_millis(50),
                Err(_) => Duration::ZERO,
            }
        })?);
        Ok(true)
    }

    fn iterate(&mut self, _context: &mut AppContext<'_>) -> Result<bool> {
        self.frames += 1;
        std::thread::sleep(Duration::from_millis(16));
        Ok(true)
    }

    fn quit(&mut self, _context: &mut AppContext<'_>) -> Result<()> {
        if let Some(mut timer) = self.heartbeat.take() {
            timer.stop();
        }
        let tracker = self.tracker.borrow();
        log::info!(
            "Sandbox ran {} frames; mouse travelled {:.1} px; last size {:?}.",
            self.frames,
            tracker.distance,
            tracker.size
        );
        Ok(())
    }
}

register_application!(SandboxApp, "sandbox");

/// A few seconds of synthetic input, ending with Escape.
fn script() -> ScriptedEvents {
    let mut script = ScriptedEvents::new();
    script.push(RawEvent::window(
        kind::WINDOW_RESIZED,
        0,
        RawWindowEvent {
            window_id: 1,
            data1: 1280,
            data2: 720,
        },
    ));
    for step in 0..30 {
        script
            .push(RawEvent::mouse_motion(
                0,
                RawMouseMotionEvent {
                    window_id: 1,
                    x: 10.0 * step as f32,
                    y: 5.0 * step as f32,
                    xrel: 10.0,
                    yrel: 5.0,
                    ..Default::default()
                },
            ))
            .end_frame();
    }
    script.push(RawEvent::keyboard(
        true,
        0,
        RawKeyboardEvent {
            window_id: 1,
            key: 0x1B,
            ..Default::default()
        },
    ));
    script.end_frame();
    script
}

fn main() -> Result<()> {
    kestrel_sdk::logging::init(&RunnerConfig::load()?);

    let driver = HostDriver::new().with_max_iterations(600);
    let result = kestrel_sdk::run(&driver, &["sandbox"], &mut script())?;
    std::process::exit(result.exit_code());
}
