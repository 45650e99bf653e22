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

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::base::{BoxedEvent, Event};
use super::bus::EventSource;
use super::handler::{try_handle, BaseEventHandler, EventHandler, FunctionEventHandler};
use super::kinds::QuitEvent;
use crate::{Error, Result};

/// A handler shared between its owner and the router.
pub type SharedHandler = Rc<RefCell<dyn BaseEventHandler>>;

enum HandlerSlot {
    /// Registered by reference; the caller keeps its own handle.
    Shared(SharedHandler),
    /// Wrapped and owned by the router.
    Owned(Box<dyn BaseEventHandler>),
}

/// The built-in handler that raises the router's quit flag.
struct QuitWatcher {
    flag: Rc<Cell<bool>>,
}

impl EventHandler<QuitEvent> for QuitWatcher {
    fn handle(&mut self, _event: &QuitEvent) -> anyhow::Result<()> {
        log::info!("Quit event routed, stopping the router.");
        self.flag.set(true);
        Ok(())
    }
}

impl BaseEventHandler for QuitWatcher {
    fn accept(&mut self, event: &dyn Any) -> anyhow::Result<bool> {
        match try_handle::<QuitEvent, _>(self, event) {
            Some(result) => result.map(|()| true),
            None => Ok(false),
        }
    }
}

/// Routes domain events to registered handlers.
///
/// Handlers are offered each event in registration order. The built-in quit
/// handler always comes first, so a [`QuitEvent`] has set the quit flag before
/// any user handler sees it.
pub struct EventRouter {
    handlers: Vec<HandlerSlot>,
    quit: Rc<Cell<bool>>,
    routed: u64,
}

impl EventRouter {
    /// Creates a router holding only the built-in quit handler.
    pub fn new() -> Self {
        let quit = Rc::new(Cell::new(false));
        Self {
            handlers: vec![HandlerSlot::Owned(Box::new(QuitWatcher {
                flag: Rc::clone(&quit),
            }))],
            quit,
            routed: 0,
        }
    }

    /// Appends a shared handler.
    ///
    /// The router keeps a handle, not ownership. Registering the same handler
    /// twice makes it run twice per event.
    pub fn register<H>(&mut self, handler: Rc<RefCell<H>>)
    where
        H: BaseEventHandler + 'static,
    {
        self.register_shared(handler);
    }

    /// Appends an already type-erased shared handler.
    pub fn register_shared(&mut self, handler: SharedHandler) {
        self.handlers.push(HandlerSlot::Shared(handler));
        log::debug!("Handler registered ({} total).", self.handlers.len());
    }

    /// Appends a handler the router takes ownership of.
    pub fn register_owned(&mut self, handler: Box<dyn BaseEventHandler>) {
        self.handlers.push(HandlerSlot::Owned(handler));
        log::debug!("Owned handler registered ({} total).", self.handlers.len());
    }

    /// Wraps `callable` in a [`FunctionEventHandler`] for events of type `E`
    /// and appends it. The router owns the wrapper.
    pub fn on<E, F>(&mut self, callable: F)
    where
        E: Event,
        F: FnMut(&E) -> anyhow::Result<()> + 'static,
    {
        self.register_owned(Box::new(FunctionEventHandler::<E, F>::new(callable)));
    }

    /// Offers `event` to every handler, in registration order.
    ///
    /// The event is dropped once dispatch finishes.
    ///
    /// # Errors
    /// The first failing handler aborts dispatch of this event and its error is
    /// returned as [`Error::Handler`].
    pub fn route(&mut self, event: BoxedEvent) -> Result<()> {
        log::trace!("Dispatching {} ({}).", event.name(), event.event_type());

        for slot in &mut self.handlers {
            let outcome = match slot {
                HandlerSlot::Shared(handler) => {
                    let mut handler = handler.try_borrow_mut().map_err(|_| {
                        Error::Handler(anyhow::anyhow!(
                            "handler is already borrowed while dispatching {}",
                            event.name()
                        ))
                    })?;
                    event.dispatch(&mut *handler)
                }
                HandlerSlot::Owned(handler) => event.dispatch(handler.as_mut()),
            };
            outcome.map_err(Error::Handler)?;
        }

        self.routed += 1;
        Ok(())
    }

    /// Pulls events from `source` and routes them until the quit flag is set.
    ///
    /// Returns normally when the source is closed. Unknown events are skipped.
    ///
    /// # Errors
    /// Handler failures end the loop and are returned.
    pub fn run(&mut self, source: &dyn EventSource) -> Result<()> {
        log::info!("Event router loop started.");
        while !self.quit_requested() {
            let event = match source.wait() {
                Ok(event) => event,
                Err(Error::BusClosed) => {
                    log::info!("Event source closed, leaving the router loop.");
                    return Ok(());
                }
                Err(e) => return Err(e),
            };
            match self.route(event) {
                Ok(()) => {}
                Err(e) if e.is_benign() => log::debug!("Skipped event: {e}"),
                Err(e) => {
                    log::error!("Router loop aborted: {e}");
                    return Err(e);
                }
            }
        }
        log::info!("Event router loop finished after {} event(s).", self.routed);
        Ok(())
    }

    /// Routes one event from `source` if one is immediately available.
    ///
    /// ## Returns
    /// `true` if an event was routed.
    pub fn process_next(&mut self, source: &dyn EventSource) -> Result<bool> {
        match source.poll() {
            Some(event) => match self.route(event) {
                Ok(()) => Ok(true),
                Err(e) if e.is_benign() => Ok(true),
                Err(e) => Err(e),
            },
            None => Ok(false),
        }
    }

    /// Returns `true` once a [`QuitEvent`] has been routed.
    pub fn quit_requested(&self) -> bool {
        self.quit.get()
    }

    /// Lowers the quit flag so the router can run again.
    pub fn clear_quit(&self) {
        self.quit.set(false);
    }

    /// Number of registered handlers, the built-in quit handler included.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Number of events fully dispatched so far.
    pub fn routed_count(&self) -> u64 {
        self.routed
    }
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRouter")
            .field("handlers", &self.handlers.len())
            .field("quit", &self.quit.get())
            .field("routed", &self.routed)
            .finish()
    }
}
