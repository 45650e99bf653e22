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

//! A simulated host driver.
//!
//! The real toolkit owns the program's entry point and drives the application
//! through four C callbacks. [`HostDriver`] reproduces that protocol in-process
//! so applications can be run headless, from tests or from a scripted source.

use std::collections::VecDeque;
use std::ffi::{c_char, c_int, c_void, CString};
use std::ptr;

use kestrel_core::{Error, Result};

use crate::platform::raw::RawEvent;
use crate::platform::AppResult;

/// `init(out state, argc, argv)`.
pub type AppInitFn = unsafe extern "C" fn(
    appstate: *mut *mut c_void,
    argc: c_int,
    argv: *mut *mut c_char,
) -> AppResult;
/// `iterate(state)`.
pub type AppIterateFn = unsafe extern "C" fn(appstate: *mut c_void) -> AppResult;
/// `event(state, platform_event)`.
pub type AppEventFn =
    unsafe extern "C" fn(appstate: *mut c_void, event: *mut RawEvent) -> AppResult;
/// `quit(state, last_result)`.
pub type AppQuitFn = unsafe extern "C" fn(appstate: *mut c_void, result: AppResult);

/// The four callbacks a host driver calls into.
#[derive(Debug, Clone, Copy)]
pub struct HostCallbacks {
    /// Called once before anything else.
    pub init: AppInitFn,
    /// Called once per frame.
    pub iterate: AppIterateFn,
    /// Called for every platform event.
    pub event: AppEventFn,
    /// Called once, last, with the result that ended the run.
    pub quit: AppQuitFn,
}

/// Where a [`HostDriver`] gets its platform events from.
pub trait PlatformEventSource {
    /// Returns the next event of the current frame, or `None` once the frame's
    /// events are exhausted.
    fn poll_event(&mut self) -> Option<RawEvent>;
}

/// A [`PlatformEventSource`] replaying a prepared script, frame by frame.
#[derive(Debug, Default)]
pub struct ScriptedEvents {
    queue: VecDeque<Option<RawEvent>>,
}

impl ScriptedEvents {
    /// Creates an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event to the frame being scripted.
    pub fn push(&mut self, event: RawEvent) -> &mut Self {
        self.queue.push_back(Some(event));
        self
    }

    /// Closes the frame being scripted; later events are delivered on the next frame.
    pub fn end_frame(&mut self) -> &mut Self {
        self.queue.push_back(None);
        self
    }

    /// Number of scripted events not yet delivered.
    pub fn remaining(&self) -> usize {
        self.queue.iter().filter(|slot| slot.is_some()).count()
    }
}

impl PlatformEventSource for ScriptedEvents {
    fn poll_event(&mut self) -> Option<RawEvent> {
        self.queue.pop_front().flatten()
    }
}

/// Drives a [`HostCallbacks`] table the way the toolkit's main loop does.
#[derive(Debug, Clone, Default)]
pub struct HostDriver {
    max_iterations: Option<u64>,
}

impl HostDriver {
    /// Creates a driver that runs until a callback stops it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops the run with [`AppResult::Success`] after `limit` iterate calls.
    pub fn with_max_iterations(mut self, limit: u64) -> Self {
        self.max_iterations = Some(limit);
        self
    }

    /// Runs the callbacks to completion.
    ///
    /// `init` is called with `args` as a C `argv`. While every result is
    /// [`AppResult::Continue`], each frame drains `source` into `event` and then
    /// calls `iterate`. `quit` is always called last, with the result that ended
    /// the run, and that result is returned.
    ///
    /// # Errors
    /// Returns [`Error::Toolkit`] if an argument contains an interior NUL byte.
    /// No callback has been called in that case.
    pub fn run(
        &self,
        callbacks: &HostCallbacks,
        args: &[&str],
        source: &mut dyn PlatformEventSource,
    ) -> Result<AppResult> {
        let owned = args
            .iter()
            .map(|arg| CString::new(*arg))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::toolkit("build argv", e))?;
        let mut argv: Vec<*mut c_char> = owned.iter().map(|s| s.as_ptr() as *mut c_char).collect();
        let argc = argv.len() as c_int;
        argv.push(ptr::null_mut());

        let mut appstate: *mut c_void = ptr::null_mut();
        // SAFETY: `argv` is a null-terminated array of valid C strings that
        // outlive the call, and `appstate` is a valid out-pointer.
        let mut result = unsafe { (callbacks.init)(&mut appstate, argc, argv.as_mut_ptr()) };
        log::debug!("Host init returned {:?}", result);

        let mut iterations = 0u64;
        'frames: while result.is_continue() {
            while let Some(mut event) = source.poll_event() {
                // SAFETY: `event` lives for the duration of the call.
                result = unsafe { (callbacks.event)(appstate, &mut event) };
                if !result.is_continue() {
                    log::debug!("Host event callback returned {:?}", result);
                    break 'frames;
                }
            }

            if self.max_iterations.is_some_and(|limit| iterations >= limit) {
                log::info!("Host driver reached its iteration cap ({iterations}).");
                result = AppResult::Success;
                break;
            }

            // SAFETY: `appstate` is whatever `init` stored.
            result = unsafe { (callbacks.iterate)(appstate) };
            iterations += 1;
        }

        // SAFETY: `appstate` is whatever `init` stored; `quit` is called exactly once.
        unsafe { (callbacks.quit)(appstate, result) };
        log::debug!("Host driver finished after {iterations} iteration(s) with {:?}", result);
        Ok(result)
    }
}
