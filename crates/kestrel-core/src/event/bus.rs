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

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::adaptor::EventAdaptor;
use super::base::{BoxedEvent, Event};
use crate::{Error, Result};

/// The sink the bus hands each domain event to.
pub type RouteCallback = Box<dyn FnMut(BoxedEvent) -> Result<()>>;

enum Envelope {
    Event(BoxedEvent),
    Close,
}

/// A cloneable, thread-safe handle that queues events on an [`EventBus`].
///
/// Events sent through a sender are never routed synchronously; they wait in
/// the bus queue until the owning thread calls [`EventBus::pump`] or pulls them
/// with [`EventBus::wait`] / [`EventBus::poll`].
#[derive(Clone)]
pub struct EventSender {
    sender: flume::Sender<Envelope>,
    closed: Arc<AtomicBool>,
}

impl EventSender {
    /// Queues `event` on the bus.
    ///
    /// # Errors
    /// Returns [`Error::BusClosed`] once the bus has been closed.
    pub fn publish<E: Event>(&self, event: E) -> Result<()> {
        self.publish_boxed(Box::new(event))
    }

    /// Queues an already boxed event on the bus.
    ///
    /// # Errors
    /// Returns [`Error::BusClosed`] once the bus has been closed.
    pub fn publish_boxed(&self, event: BoxedEvent) -> Result<()> {
        if self.is_closed() {
            log::warn!("Dropping {}: the event bus is closed.", event.name());
            return Err(Error::BusClosed);
        }
        self.sender
            .send(Envelope::Event(event))
            .map_err(|_| Error::BusClosed)
    }

    /// Closes the bus, waking any thread blocked in [`EventBus::wait`].
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            log::info!("Event bus closing.");
            // The receiver lives as long as the bus; a failed send means it is gone already.
            let _ = self.sender.send(Envelope::Close);
        }
    }

    /// Returns `true` once the bus has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for EventSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSender")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// A pull interface over a stream of domain events.
pub trait EventSource {
    /// Blocks until an event is available and returns it.
    ///
    /// # Errors
    /// Returns [`Error::BusClosed`] when the source is shut down.
    fn wait(&self) -> Result<BoxedEvent>;

    /// Returns an event if one is immediately available.
    fn poll(&self) -> Option<BoxedEvent>;
}

/// Owns the platform-to-domain conversion boundary and the route callback.
///
/// While a route callback is bound, [`inject`](EventBus::inject) and
/// [`publish`](EventBus::publish) deliver synchronously, in call order. Without
/// one, events are buffered; binding a callback replays the buffer through it
/// before anything else is routed.
///
/// Queued events are routed against a frame budget set by
/// [`begin_frame`](EventBus::begin_frame). Once it is spent, synchronous
/// deliveries queue behind the events still waiting.
pub struct EventBus<A: EventAdaptor> {
    adaptor: A,
    route: Option<RouteCallback>,
    frame_budget: usize,
    sender: EventSender,
    receiver: flume::Receiver<Envelope>,
}

impl<A: EventAdaptor> EventBus<A> {
    /// Creates a bus that converts platform records with `adaptor`.
    ///
    /// ## Returns
    /// A new, open bus with no route callback bound.
    pub fn new(adaptor: A) -> Self {
        let (sender, receiver) = flume::unbounded();
        log::info!("EventBus initialized.");
        Self {
            adaptor,
            route: None,
            frame_budget: usize::MAX,
            sender: EventSender {
                sender,
                closed: Arc::new(AtomicBool::new(false)),
            },
            receiver,
        }
    }

    /// The adaptor used by [`inject`](EventBus::inject).
    pub fn adaptor(&self) -> &A {
        &self.adaptor
    }

    /// Returns a handle other threads can publish through.
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Converts a platform record and delivers the resulting event.
    ///
    /// Records the adaptor does not recognise are skipped.
    ///
    /// # Errors
    /// Propagates failures of the route callback, and returns
    /// [`Error::BusClosed`] once the bus is closed.
    pub fn inject(&mut self, raw: &A::Raw) -> Result<()> {
        match self.adaptor.adapt(raw) {
            Ok(event) => self.deliver(event),
            Err(Error::UnknownEvent(kind)) => {
                log::debug!("Skipping unknown platform event {kind:#06x}.");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Converts a platform record and queues the event without routing it.
    ///
    /// The event is delivered by the next [`pump`](EventBus::pump) or pulled by
    /// [`wait`](EventBus::wait) / [`poll`](EventBus::poll).
    pub fn defer(&mut self, raw: &A::Raw) -> Result<()> {
        match self.adaptor.adapt(raw) {
            Ok(event) => self.sender.publish_boxed(event),
            Err(Error::UnknownEvent(kind)) => {
                log::debug!("Skipping unknown platform event {kind:#06x}.");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Delivers a domain event built by user code, bypassing the adaptor.
    pub fn publish<E: Event>(&mut self, event: E) -> Result<()> {
        self.deliver(Box::new(event))
    }

    /// Delivers an already boxed domain event, bypassing the adaptor.
    pub fn publish_boxed(&mut self, event: BoxedEvent) -> Result<()> {
        self.deliver(event)
    }

    fn deliver(&mut self, event: BoxedEvent) -> Result<()> {
        if self.sender.is_closed() {
            log::warn!("Dropping {}: the event bus is closed.", event.name());
            return Err(Error::BusClosed);
        }
        if self.route.is_none() {
            return self.sender.publish_boxed(event);
        }
        // Anything still queued was injected earlier and must go first.
        self.pump_frame()?;
        if !self.receiver.is_empty() {
            log::trace!("Frame budget spent; queueing {}.", event.name());
            return self.sender.publish_boxed(event);
        }
        match self.route.as_mut() {
            Some(route) => {
                log::trace!("Routing {} ({}).", event.name(), event.event_type());
                route(event)
            }
            None => self.sender.publish_boxed(event),
        }
    }

    /// Binds the route callback and replays any buffered events through it.
    ///
    /// A previously bound callback is replaced.
    pub fn set_route_callback<F>(&mut self, callback: F) -> Result<()>
    where
        F: FnMut(BoxedEvent) -> Result<()> + 'static,
    {
        self.route = Some(Box::new(callback));
        let replayed = self.pump()?;
        if replayed > 0 {
            log::debug!("Replayed {replayed} buffered event(s) through the new route.");
        }
        Ok(())
    }

    /// Unbinds the route callback; later events are buffered again.
    pub fn clear_route_callback(&mut self) -> Option<RouteCallback> {
        self.route.take()
    }

    /// Returns `true` if a route callback is bound.
    pub fn has_route(&self) -> bool {
        self.route.is_some()
    }

    /// Routes every queued event through the bound callback.
    ///
    /// ## Returns
    /// How many events were routed. Without a bound callback nothing happens.
    pub fn pump(&mut self) -> Result<usize> {
        self.pump_at_most(usize::MAX)
    }

    /// Starts a frame in which at most `budget` queued events are routed.
    ///
    /// The budget is shared by [`pump_frame`](EventBus::pump_frame) and by the
    /// queue flush that precedes every synchronous delivery. A fresh bus has
    /// an unbounded budget.
    pub fn begin_frame(&mut self, budget: usize) {
        self.frame_budget = budget;
    }

    /// Routes queued events until the queue or the frame budget runs out.
    pub fn pump_frame(&mut self) -> Result<usize> {
        let routed = self.pump_at_most(self.frame_budget)?;
        self.frame_budget -= routed;
        Ok(routed)
    }

    /// Routes at most `limit` queued events through the bound callback.
    pub fn pump_at_most(&mut self, limit: usize) -> Result<usize> {
        let Some(route) = self.route.as_mut() else {
            return Ok(0);
        };

        let mut routed = 0;
        while routed < limit {
            match self.receiver.try_recv() {
                Ok(Envelope::Event(event)) => {
                    log::trace!("Routing queued {} ({}).", event.name(), event.event_type());
                    routed += 1;
                    route(event)?;
                }
                Ok(Envelope::Close) | Err(_) => break,
            }
        }
        Ok(routed)
    }

    /// Number of queued events, approximately.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Closes the bus. Blocked and future [`wait`](EventBus::wait) calls fail.
    pub fn close(&self) {
        self.sender.close();
    }

    /// Returns `true` once the bus has been closed.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl<A: EventAdaptor> EventSource for EventBus<A> {
    fn wait(&self) -> Result<BoxedEvent> {
        if self.is_closed() {
            return Err(Error::BusClosed);
        }
        match self.receiver.recv() {
            Ok(Envelope::Event(event)) => Ok(event),
            Ok(Envelope::Close) | Err(_) => Err(Error::BusClosed),
        }
    }

    fn poll(&self) -> Option<BoxedEvent> {
        if self.is_closed() {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(Envelope::Event(event)) => Some(event),
            Ok(Envelope::Close) | Err(_) => None,
        }
    }
}

impl<A: EventAdaptor + fmt::Debug> fmt::Debug for EventBus<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("adaptor", &self.adaptor)
            .field("routed", &self.route.is_some())
            .field("pending", &self.pending())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{OpaquePtr, QuitEvent, UserEvent};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::{thread, time::Duration};

    /// A toy platform: records are plain codes, 1 = quit, 2 = user event.
    #[derive(Debug)]
    struct CodeAdaptor;

    impl EventAdaptor for CodeAdaptor {
        type Raw = u32;

        fn adapt(&self, raw: &u32) -> Result<BoxedEvent> {
            match *raw {
                1 => Ok(Box::new(QuitEvent { timestamp: 0 })),
                2 => Ok(Box::new(user(0))),
                other => Err(Error::UnknownEvent(other)),
            }
        }

        fn is_quit(&self, raw: &u32) -> bool {
            *raw == 1
        }
    }

    fn user(code: i32) -> UserEvent {
        UserEvent {
            timestamp: 0,
            window_id: 0,
            code,
            data1: OpaquePtr::null(),
            data2: OpaquePtr::null(),
        }
    }

    fn code_of(event: &BoxedEvent) -> i32 {
        event.downcast_ref::<UserEvent>().map_or(-1, |u| u.code)
    }

    fn recording_route(bus: &mut EventBus<CodeAdaptor>) -> Rc<RefCell<Vec<i32>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.set_route_callback(move |event| {
            sink.borrow_mut().push(code_of(&event));
            Ok(())
        })
        .expect("binding the route should succeed");
        seen
    }

    #[test]
    fn unbound_bus_buffers_events_for_polling() {
        let mut bus = EventBus::new(CodeAdaptor);
        bus.inject(&2).unwrap();
        bus.publish(user(5)).unwrap();

        assert_eq!(bus.pending(), 2);
        assert_eq!(code_of(&bus.poll().unwrap()), 0);
        assert_eq!(code_of(&bus.poll().unwrap()), 5);
        assert!(bus.poll().is_none());
    }

    #[test]
    fn bound_bus_routes_synchronously_in_order() {
        let mut bus = EventBus::new(CodeAdaptor);
        let seen = recording_route(&mut bus);

        bus.publish(user(1)).unwrap();
        bus.publish(user(2)).unwrap();
        bus.publish(user(3)).unwrap();

        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
        assert_eq!(bus.pending(), 0);
    }

    #[test]
    fn binding_a_route_replays_buffered_events_first() {
        let mut bus = EventBus::new(CodeAdaptor);
        bus.publish(user(10)).unwrap();
        bus.publish(user(11)).unwrap();

        let seen = recording_route(&mut bus);
        bus.publish(user(12)).unwrap();

        assert_eq!(*seen.borrow(), vec![10, 11, 12]);
    }

    #[test]
    fn unknown_records_are_skipped() {
        let mut bus = EventBus::new(CodeAdaptor);
        let seen = recording_route(&mut bus);

        bus.inject(&99).expect("unknown events are benign");
        assert!(seen.borrow().is_empty());
        assert!(bus.adaptor().is_quit(&1));
    }

    #[test]
    fn deferred_records_wait_for_pump() {
        let mut bus = EventBus::new(CodeAdaptor);
        let seen = recording_route(&mut bus);

        bus.defer(&2).unwrap();
        assert!(seen.borrow().is_empty());
        assert_eq!(bus.pump().unwrap(), 1);
        assert_eq!(*seen.borrow(), vec![0]);
    }

    #[test]
    fn pump_at_most_respects_the_limit() {
        let mut bus = EventBus::new(CodeAdaptor);
        let seen = recording_route(&mut bus);
        let sender = bus.sender();
        for code in 0..5 {
            sender.publish(user(code)).unwrap();
        }

        assert_eq!(bus.pump_at_most(2).unwrap(), 2);
        assert_eq!(bus.pending(), 3);
        assert_eq!(bus.pump().unwrap(), 3);
        assert_eq!(*seen.borrow(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn spent_frame_budget_queues_synchronous_events_behind_the_backlog() {
        let mut bus = EventBus::new(CodeAdaptor);
        let seen = recording_route(&mut bus);
        let sender = bus.sender();
        for code in 0..5 {
            sender.publish(user(code)).unwrap();
        }

        bus.begin_frame(1);
        bus.publish(user(50)).unwrap();
        assert_eq!(*seen.borrow(), vec![0]);
        assert_eq!(bus.pending(), 5);

        bus.begin_frame(2);
        assert_eq!(bus.pump_frame().unwrap(), 2);
        assert_eq!(bus.pump_frame().unwrap(), 0);

        bus.begin_frame(usize::MAX);
        bus.publish(user(51)).unwrap();
        assert_eq!(*seen.borrow(), vec![0, 1, 2, 3, 4, 50, 51]);
        assert_eq!(bus.pending(), 0);
    }

    #[test]
    fn route_errors_propagate_to_the_publisher() {
        let mut bus = EventBus::new(CodeAdaptor);
        bus.set_route_callback(|_| Err(Error::Handler(anyhow::anyhow!("boom"))))
            .unwrap();

        let err = bus.publish(user(1)).unwrap_err();
        assert!(matches!(err, Error::Handler(_)));
    }

    #[test]
    fn wait_returns_events_from_other_threads() {
        let bus = EventBus::new(CodeAdaptor);
        let sender = bus.sender();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            sender.publish(user(42)).expect("send from thread failed");
        });

        let event = bus.wait().expect("an event should arrive");
        assert_eq!(code_of(&event), 42);
        handle.join().expect("thread join failed");
    }

    #[test]
    fn close_wakes_a_blocked_wait() {
        let bus = EventBus::new(CodeAdaptor);
        let sender = bus.sender();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            sender.close();
        });

        assert!(matches!(bus.wait(), Err(Error::BusClosed)));
        handle.join().expect("thread join failed");
    }

    #[test]
    fn closed_bus_rejects_new_events() {
        let mut bus = EventBus::new(CodeAdaptor);
        let sender = bus.sender();
        bus.close();

        assert!(bus.is_closed());
        assert!(matches!(bus.publish(user(1)), Err(Error::BusClosed)));
        assert!(matches!(sender.publish(user(1)), Err(Error::BusClosed)));
        assert!(matches!(bus.wait(), Err(Error::BusClosed)));
        assert!(bus.poll().is_none());
    }
}
