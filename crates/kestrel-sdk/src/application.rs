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

//! The application contract and its registration.

use std::cell::RefCell;
use std::rc::Rc;

use kestrel_core::event::{BaseEventHandler, Event, EventRouter, EventSender, QuitEvent};
use kestrel_core::ServiceRegistry;

use crate::config::RunnerConfig;

/// User code driven by the [`Runner`](crate::Runner).
///
/// Every method runs on the host driver thread. Errors and panics are
/// contained by the runner and reported to the host as a failure.
pub trait Application: 'static {
    /// Called once, after the event machinery exists. Register handlers and
    /// services here.
    ///
    /// ## Returns
    /// `true` to start running, `false` to end the run successfully right away.
    fn init(&mut self, context: &mut AppContext<'_>) -> anyhow::Result<bool>;

    /// Called once per frame.
    ///
    /// ## Returns
    /// `true` to keep running, `false` to end the run successfully.
    fn iterate(&mut self, context: &mut AppContext<'_>) -> anyhow::Result<bool>;

    /// Called once when the run ends, before the runner tears everything down.
    fn quit(&mut self, _context: &mut AppContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// What an [`Application`] can reach while one of its callbacks runs.
pub struct AppContext<'a> {
    pub(crate) router: &'a RefCell<EventRouter>,
    pub(crate) sender: &'a EventSender,
    pub(crate) services: &'a mut ServiceRegistry,
    pub(crate) args: &'a [String],
    pub(crate) config: &'a RunnerConfig,
}

impl<'a> AppContext<'a> {
    /// Registers a shared handler; the caller keeps its own handle.
    pub fn register<H>(&mut self, handler: Rc<RefCell<H>>)
    where
        H: BaseEventHandler + 'static,
    {
        self.router.borrow_mut().register(handler);
    }

    /// Registers `callable` as the handler for events of type `E`.
    pub fn on<E, F>(&mut self, callable: F)
    where
        E: Event,
        F: FnMut(&E) -> anyhow::Result<()> + 'static,
    {
        self.router.borrow_mut().on(callable);
    }

    /// Queues `event`; it is routed after the current callback returns.
    pub fn publish<E: Event>(&self, event: E) -> kestrel_core::Result<()> {
        self.sender.publish(event)
    }

    /// Queues a [`QuitEvent`].
    pub fn request_quit(&self) -> kestrel_core::Result<()> {
        self.publish(QuitEvent::new())
    }

    /// A sender that can be moved to other threads, e.g. into a timer callback.
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// The service registry.
    pub fn services(&mut self) -> &mut ServiceRegistry {
        self.services
    }

    /// The arguments the host passed to `init`.
    pub fn args(&self) -> &[String] {
        self.args
    }

    /// The runner configuration.
    pub fn config(&self) -> &RunnerConfig {
        self.config
    }

    /// Number of handlers currently registered, including the built-in quit handler.
    pub fn handler_count(&self) -> usize {
        self.router.borrow().handler_count()
    }
}

/// A factory for an [`Application`], collected at link time.
///
/// Submitted by [`register_application!`](crate::register_application); the
/// runner picks one up when no application was supplied directly.
pub struct ApplicationRegistration {
    /// The name matched against [`RunnerConfig::app_name`].
    pub name: &'static str,
    /// Builds a fresh application.
    pub factory: fn() -> Box<dyn Application>,
}

impl ApplicationRegistration {
    /// Creates a registration.
    pub const fn new(name: &'static str, factory: fn() -> Box<dyn Application>) -> Self {
        Self { name, factory }
    }

    /// Every registration linked into the process.
    pub fn all() -> impl Iterator<Item = &'static ApplicationRegistration> {
        inventory::iter::<ApplicationRegistration>.into_iter()
    }

    /// Picks the registration to run.
    ///
    /// With `name`, the registration of that name. Without, the only one.
    ///
    /// # Errors
    /// [`Error::NoApplication`](kestrel_core::Error::NoApplication) when no
    /// registration matches or the choice is ambiguous.
    pub fn select(name: Option<&str>) -> kestrel_core::Result<&'static ApplicationRegistration> {
        let mut candidates = Self::all().filter(|r| name.map_or(true, |n| r.name == n));
        match (candidates.next(), candidates.next()) {
            (Some(registration), None) => Ok(registration),
            (Some(_), Some(_)) => {
                log::warn!("Several applications are registered; set `app_name` to pick one.");
                Err(kestrel_core::Error::NoApplication)
            }
            (None, _) => Err(kestrel_core::Error::NoApplication),
        }
    }
}

impl std::fmt::Debug for ApplicationRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationRegistration")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

inventory::collect!(ApplicationRegistration);

/// Registers an [`Application`] type so the host callbacks can build it.
///
/// The type must implement [`Default`]. The registration is named after the
/// type unless a name is given.
///
/// ```ignore
/// #[derive(Default)]
/// struct Game;
/// # impl kestrel_sdk::Application for Game { /* ... */ }
/// kestrel_sdk::register_application!(Game);
/// ```
#[macro_export]
macro_rules! register_application {
    ($app:ty) => {
        $crate::register_application!($app, ::std::stringify!($app));
    };
    ($app:ty, $name:expr) => {
        const _: () = {
            fn factory() -> ::std::boxed::Box<dyn $crate::Application> {
                ::std::boxed::Box::new(<$app as ::std::default::Default>::default())
            }
            $crate::inventory::submit! {
                $crate::ApplicationRegistration::new($name, factory)
            }
        };
    };
}
