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

//! The application runner state machine.
//!
//! The [`Runner`] receives the host driver's four callbacks, owns the event
//! bus, the router, the service registry and the application, and moves
//! through these states:
//!
//! | State          | Entered when                          | Platform events        |
//! |----------------|---------------------------------------|------------------------|
//! | `Unregistered` | start-up, or after [`Runner::reset`]  | ignored                |
//! | `Registered`   | an application was supplied           | ignored                |
//! | `Initialized`  | the application's `init` returned true | queued                |
//! | `Running`      | the first `iterate`                   | routed                 |
//! | `Quitting`     | a run-ending result, or `quit`        | dropped                |
//! | `TornDown`     | everything owned has been released    | ignored                |

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use kestrel_core::event::{EventAdaptor, EventBus, EventRouter, EventSender};
use kestrel_core::{Error, ServiceRegistry};
use kestrel_infra::{AppResult, RawEvent, ToolkitEventAdaptor};

use crate::application::{AppContext, Application, ApplicationRegistration};
use crate::config::RunnerConfig;
use crate::guard::{contain, Failure};

/// Where the runner is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunnerState {
    /// No application supplied yet.
    Unregistered,
    /// An application is waiting for `init`.
    Registered,
    /// `init` succeeded; no frame has run yet.
    Initialized,
    /// Frames are running and events are dispatched.
    Running,
    /// The run is ending; events are dropped.
    Quitting,
    /// The application and everything the runner owned have been released.
    TornDown,
}

/// The bus and router, alive between `init` and teardown.
struct EventCore {
    bus: EventBus<ToolkitEventAdaptor>,
    router: Rc<RefCell<EventRouter>>,
    sender: EventSender,
}

impl EventCore {
    fn new() -> kestrel_core::Result<Self> {
        let router = Rc::new(RefCell::new(EventRouter::new()));
        let mut bus = EventBus::new(ToolkitEventAdaptor::new());
        let sink = Rc::clone(&router);
        bus.set_route_callback(move |event| sink.borrow_mut().route(event))?;
        let sender = bus.sender();
        Ok(Self {
            bus,
            router,
            sender,
        })
    }

    fn quit_requested(&self) -> bool {
        self.router.borrow().quit_requested()
    }
}

/// Drives an [`Application`] from host driver callbacks.
pub struct Runner {
    state: RunnerState,
    config: RunnerConfig,
    app: Option<Box<dyn Application>>,
    app_started: bool,
    core: Option<EventCore>,
    services: ServiceRegistry,
    args: Vec<String>,
    last_failure: Option<Failure>,
}

impl Runner {
    /// Creates an unregistered runner.
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            state: RunnerState::Unregistered,
            config,
            app: None,
            app_started: false,
            core: None,
            services: ServiceRegistry::new(),
            args: Vec::new(),
            last_failure: None,
        }
    }

    /// The current lifecycle state.
    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// The configuration the runner was created with.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// The most recent failure contained since the last `init`, kept across
    /// teardown so the host can report it.
    pub fn last_failure(&self) -> Option<&Failure> {
        self.last_failure.as_ref()
    }

    /// The service registry.
    pub fn services(&mut self) -> &mut ServiceRegistry {
        &mut self.services
    }

    /// Supplies the application to run.
    ///
    /// Only accepted before `init`; a second call before `init` replaces the
    /// first application.
    pub fn register_application(&mut self, app: Box<dyn Application>) {
        match self.state {
            RunnerState::Unregistered | RunnerState::Registered => {
                self.app = Some(app);
                self.state = RunnerState::Registered;
                log::info!("Application registered.");
            }
            state => log::warn!("Ignoring application registration in state {state:?}."),
        }
    }

    /// Supplies the application from the link-time registrations, selected by
    /// the configured `app_name`.
    pub fn register_from_inventory(&mut self) -> kestrel_core::Result<()> {
        let registration = ApplicationRegistration::select(self.config.app_name.as_deref())?;
        log::info!("Using registered application `{}`.", registration.name);
        self.register_application((registration.factory)());
        Ok(())
    }

    /// The host's `init` callback.
    ///
    /// Builds the bus and the router, binds the bus to the router, and calls
    /// the application's `init`.
    pub fn init(&mut self, args: Vec<String>) -> AppResult {
        if self.state == RunnerState::Unregistered {
            if let Err(e) = self.register_from_inventory() {
                log::error!("Cannot initialise: {e}");
                return AppResult::Failure;
            }
        }
        if self.state != RunnerState::Registered {
            log::error!("Cannot initialise in state {:?}.", self.state);
            return AppResult::Failure;
        }

        self.args = args;
        self.last_failure = None;
        let core = match contain("init", || Ok(EventCore::new()?)) {
            Ok(core) => self.core.insert(core),
            Err(failure) => {
                self.last_failure = Some(failure);
                return AppResult::Failure;
            }
        };
        let Some(app) = self.app.as_mut() else {
            return AppResult::Failure;
        };
        let mut context = AppContext {
            router: &core.router,
            sender: &core.sender,
            services: &mut self.services,
            args: &self.args,
            config: &self.config,
        };

        let outcome = contain("init", || app.init(&mut context));
        self.app_started = outcome.is_ok();
        match outcome {
            Ok(true) => {
                self.state = RunnerState::Initialized;
                log::info!("Application initialised.");
                AppResult::Continue
            }
            Ok(false) => {
                self.state = RunnerState::Quitting;
                log::info!("Application declined to start.");
                AppResult::Success
            }
            Err(failure) => {
                self.last_failure = Some(failure);
                self.state = RunnerState::Quitting;
                AppResult::Failure
            }
        }
    }

    /// The host's `iterate` callback.
    ///
    /// The first frame routes every event queued since `init`. Each frame then
    /// routes queued cross-thread events, up to the configured limit, and calls
    /// the application's `iterate`. Platform events delivered later in the
    /// frame share that limit; once it is spent they queue behind the backlog.
    pub fn iterate(&mut self) -> AppResult {
        let limit = match self.state {
            RunnerState::Initialized => {
                self.state = RunnerState::Running;
                log::debug!("First frame; flushing events queued during init.");
                usize::MAX
            }
            RunnerState::Running => self.config.pump_limit(),
            RunnerState::Quitting => return AppResult::Success,
            state => {
                log::error!("Iterate called in state {state:?}.");
                return AppResult::Failure;
            }
        };
        let (Some(core), Some(app)) = (self.core.as_mut(), self.app.as_mut()) else {
            return AppResult::Failure;
        };

        core.bus.begin_frame(limit);
        let pumped = contain("event dispatch", || {
            core.bus.pump_frame().or_else(benign)?;
            Ok(())
        });
        if let Err(failure) = pumped {
            self.last_failure = Some(failure);
            self.state = RunnerState::Quitting;
            return AppResult::Failure;
        }
        if core.quit_requested() {
            self.state = RunnerState::Quitting;
            return AppResult::Success;
        }

        let mut context = AppContext {
            router: &core.router,
            sender: &core.sender,
            services: &mut self.services,
            args: &self.args,
            config: &self.config,
        };
        match contain("iterate", || app.iterate(&mut context)) {
            Ok(true) if !core.quit_requested() => AppResult::Continue,
            Ok(_) => {
                self.state = RunnerState::Quitting;
                AppResult::Success
            }
            Err(failure) => {
                self.last_failure = Some(failure);
                self.state = RunnerState::Quitting;
                AppResult::Failure
            }
        }
    }

    /// The host's `event` callback.
    ///
    /// Returns [`AppResult::Success`] for the quit record, or once a handler
    /// has caused the router's quit flag to be set.
    pub fn event(&mut self, raw: &RawEvent) -> AppResult {
        let Some(core) = self.core.as_mut() else {
            log::debug!("Ignoring platform event {:#06x} in state {:?}.", raw.kind(), self.state);
            return AppResult::Continue;
        };
        let is_quit = core.bus.adaptor().is_quit(raw);

        match self.state {
            RunnerState::Initialized => {
                if let Err(failure) = contain("event", || Ok(core.bus.defer(raw)?)) {
                    self.last_failure = Some(failure);
                    return AppResult::Failure;
                }
                if is_quit {
                    self.state = RunnerState::Quitting;
                    return AppResult::Success;
                }
                AppResult::Continue
            }
            RunnerState::Running => {
                let delivered = contain("event dispatch", || {
                    core.bus.inject(raw).or_else(benign)?;
                    Ok(())
                });
                if let Err(failure) = delivered {
                    self.last_failure = Some(failure);
                    self.state = RunnerState::Quitting;
                    return AppResult::Failure;
                }
                if is_quit || core.quit_requested() {
                    log::info!("Quit requested.");
                    self.state = RunnerState::Quitting;
                    return AppResult::Success;
                }
                AppResult::Continue
            }
            RunnerState::Quitting => {
                log::warn!("Dropping platform event {:#06x}: the runner is quitting.", raw.kind());
                AppResult::Success
            }
            state => {
                log::debug!("Ignoring platform event {:#06x} in state {state:?}.", raw.kind());
                AppResult::Continue
            }
        }
    }

    /// The host's `quit` callback.
    ///
    /// Calls the application's `quit` if its `init` completed, then resets the
    /// runner. `result` is the host result that ended the run.
    pub fn quit(&mut self, result: AppResult) {
        log::info!("Quitting with {result:?}.");
        self.state = RunnerState::Quitting;

        if let (true, Some(core), Some(app)) =
            (self.app_started, self.core.as_ref(), self.app.as_mut())
        {
            let mut context = AppContext {
                router: &core.router,
                sender: &core.sender,
                services: &mut self.services,
                args: &self.args,
                config: &self.config,
            };
            if let Err(failure) = contain("quit", || app.quit(&mut context)) {
                self.last_failure = Some(failure);
            }
        }

        self.tear_down();
        self.reset();
    }

    /// Releases the router and its handlers, then the application, then every
    /// service in reverse creation order.
    fn tear_down(&mut self) {
        if let Some(core) = self.core.take() {
            let pending = core.bus.pending();
            if pending > 0 {
                log::warn!("Discarding {pending} undelivered event(s).");
            }
            core.bus.close();
        }
        self.app = None;
        self.app_started = false;
        self.services.clear();
        self.args.clear();
        self.state = RunnerState::TornDown;
        log::debug!("Runner torn down.");
    }

    /// Returns the runner to [`RunnerState::Unregistered`], releasing anything
    /// it still owns. Calling it again has no further effect.
    pub fn reset(&mut self) {
        if self.state != RunnerState::TornDown {
            self.tear_down();
        }
        self.state = RunnerState::Unregistered;
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(RunnerConfig::default())
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("state", &self.state)
            .field("has_application", &self.app.is_some())
            .field("services", &self.services.len())
            .finish_non_exhaustive()
    }
}

/// Swallows conditions the router treats as non-fatal.
fn benign<T: Default>(error: Error) -> kestrel_core::Result<T> {
    if error.is_benign() {
        log::debug!("Skipping event: {error}");
        Ok(T::default())
    } else {
        Err(error)
    }
}
