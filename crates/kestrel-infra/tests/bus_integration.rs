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

//! Timers reaching handlers through the event bus.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use kestrel_core::event::{
    custom_event_type, timestamp_now, Event, EventBus, EventRouter, EventType, MouseButtonEvent,
};
use kestrel_infra::platform::raw::{kind, RawMouseButtonEvent};
use kestrel_infra::{RawEvent, Timer, ToolkitEventAdaptor};

#[derive(Debug)]
struct Tick {
    timestamp: u64,
    sequence: u32,
}

impl Event for Tick {
    fn event_type(&self) -> EventType {
        custom_event_type::<Self>()
    }

    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn wired_bus(router: Rc<RefCell<EventRouter>>) -> EventBus<ToolkitEventAdaptor> {
    let mut bus = EventBus::new(ToolkitEventAdaptor::new());
    bus.set_route_callback(move |event| router.borrow_mut().route(event))
        .unwrap();
    bus
}

#[test]
fn timer_events_are_routed_on_the_pumping_thread() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let router = Rc::new(RefCell::new(EventRouter::new()));
    {
        let seen = Rc::clone(&seen);
        router.borrow_mut().on(move |tick: &Tick| {
            seen.borrow_mut().push(tick.sequence);
            Ok(())
        });
    }
    let mut bus = wired_bus(Rc::clone(&router));

    let sender = bus.sender();
    let sequence = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&sequence);
    let mut timer = Timer::start(Duration::from_millis(2), move || {
        let next = counter.fetch_add(1, Ordering::SeqCst);
        let _ = sender.publish(Tick {
            timestamp: timestamp_now(),
            sequence: next,
        });
        if next == 4 {
            Duration::ZERO
        } else {
            Duration::from_millis(2)
        }
    })
    .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while seen.borrow().len() < 5 && Instant::now() < deadline {
        bus.pump().unwrap();
        std::thread::sleep(Duration::from_millis(1));
    }
    timer.stop();

    assert_eq!(*seen.borrow(), vec![0, 1, 2, 3, 4]);
    assert!(custom_event_type::<Tick>().is_custom());
}

#[test]
fn injected_click_reaches_a_mouse_handler() {
    let clicks = Rc::new(RefCell::new(Vec::new()));
    let router = Rc::new(RefCell::new(EventRouter::new()));
    {
        let clicks = Rc::clone(&clicks);
        router.borrow_mut().on(move |button: &MouseButtonEvent| {
            clicks.borrow_mut().push((button.x, button.y, button.pressed));
            Ok(())
        });
    }
    let mut bus = wired_bus(Rc::clone(&router));

    let payload = RawMouseButtonEvent {
        button: 1,
        clicks: 1,
        x: 100.0,
        y: 200.0,
        ..Default::default()
    };
    bus.inject(&RawEvent::mouse_button(true, 0, payload)).unwrap();
    bus.inject(&RawEvent::new(0x7777, 0)).unwrap();
    bus.inject(&RawEvent::mouse_button(false, 0, payload)).unwrap();

    assert_eq!(
        *clicks.borrow(),
        vec![(100.0, 200.0, true), (100.0, 200.0, false)]
    );
    assert!(!router.borrow().quit_requested());

    bus.inject(&RawEvent::new(kind::QUIT, 0)).unwrap();
    assert!(router.borrow().quit_requested());
}

#[test]
fn pulled_quit_record_ends_the_router_loop_after_one_event() {
    let mut bus = EventBus::new(ToolkitEventAdaptor::new());
    bus.inject(&RawEvent::quit(1_000_000)).unwrap();
    bus.inject(&RawEvent::new(kind::MOUSE_MOTION, 0)).unwrap();

    let mut router = EventRouter::new();
    router.run(&bus).unwrap();

    assert!(router.quit_requested());
    assert_eq!(router.routed_count(), 1);
    assert_eq!(bus.pending(), 1);
}
