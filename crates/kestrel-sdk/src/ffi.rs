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

//! C-ABI entry points for the host driver.
//!
//! The host owns the program and calls these four functions. The runner lives
//! behind the host's opaque application-state pointer from `app_init` until
//! `app_quit`. No panic crosses these functions. They are exported unmangled
//! as `kestrel_app_*` for hosts that link against them.

use std::ffi::{c_char, c_int, c_void, CStr};

use kestrel_infra::{AppResult, HostCallbacks, RawEvent};

use crate::config::RunnerConfig;
use crate::guard::contain;
use crate::logging;
use crate::runner::Runner;

/// The callback table to hand to a host driver.
pub const CALLBACKS: HostCallbacks = HostCallbacks {
    init: app_init,
    iterate: app_iterate,
    event: app_event,
    quit: app_quit,
};

/// Creates the runner, stores it in `*appstate` and initialises it.
///
/// # Safety
/// `appstate` must be a valid out-pointer, and `argv` must hold `argc` valid
/// C strings (or be null when `argc` is 0).
#[export_name = "kestrel_app_init"]
pub unsafe extern "C" fn app_init(
    appstate: *mut *mut c_void,
    argc: c_int,
    argv: *mut *mut c_char,
) -> AppResult {
    if appstate.is_null() {
        return AppResult::Failure;
    }
    // SAFETY: guaranteed by the caller.
    let args = unsafe { collect_args(argc, argv) };

    let runner = contain("start-up", || {
        let config = RunnerConfig::load()?;
        logging::init(&config);
        Ok(Box::new(Runner::new(config)))
    });
    let runner = match runner {
        Ok(runner) => runner,
        Err(_) => return AppResult::Failure,
    };
    // SAFETY: `appstate` was checked for null above.
    unsafe { install(appstate, runner, args) }
}

/// Initialises `runner` and hands it to the host through `appstate`.
///
/// # Safety
/// `appstate` must be a valid, non-null out-pointer.
unsafe fn install(
    appstate: *mut *mut c_void,
    mut runner: Box<Runner>,
    args: Vec<String>,
) -> AppResult {
    let result = contain("init", || Ok(runner.init(args))).unwrap_or(AppResult::Failure);
    // SAFETY: ownership passes to the host until `app_quit` takes it back.
    unsafe { *appstate = Box::into_raw(runner).cast() };
    result
}

/// Runs one frame.
///
/// # Safety
/// `appstate` must be the pointer stored by [`app_init`], not yet passed to [`app_quit`].
#[export_name = "kestrel_app_iterate"]
pub unsafe extern "C" fn app_iterate(appstate: *mut c_void) -> AppResult {
    // SAFETY: guaranteed by the caller.
    let Some(runner) = (unsafe { appstate.cast::<Runner>().as_mut() }) else {
        return AppResult::Failure;
    };
    contain("iterate", || Ok(runner.iterate())).unwrap_or(AppResult::Failure)
}

/// Delivers one platform event.
///
/// # Safety
/// As for [`app_iterate`]; `event` must be null or point to a valid record.
#[export_name = "kestrel_app_event"]
pub unsafe extern "C" fn app_event(appstate: *mut c_void, event: *mut RawEvent) -> AppResult {
    // SAFETY: guaranteed by the caller.
    let (Some(runner), Some(event)) =
        (unsafe { appstate.cast::<Runner>().as_mut() }, unsafe { event.as_ref() })
    else {
        return AppResult::Failure;
    };
    contain("event", || Ok(runner.event(event))).unwrap_or(AppResult::Failure)
}

/// Quits and releases the runner.
///
/// # Safety
/// As for [`app_iterate`]; the pointer is invalid once this returns.
#[export_name = "kestrel_app_quit"]
pub unsafe extern "C" fn app_quit(appstate: *mut c_void, result: AppResult) {
    if appstate.is_null() {
        return;
    }
    // SAFETY: the pointer came from `Box::into_raw` in `app_init` and is
    // reclaimed exactly once, here.
    let mut runner = unsafe { Box::from_raw(appstate.cast::<Runner>()) };
    let _ = contain("quit", move || {
        runner.quit(result);
        Ok(())
    });
}

unsafe fn collect_args(argc: c_int, argv: *mut *mut c_char) -> Vec<String> {
    if argv.is_null() {
        return Vec::new();
    }
    (0..argc.max(0) as usize)
        .filter_map(|i| {
            // SAFETY: `argv` holds `argc` entries.
            let arg = unsafe { *argv.add(i) };
            // SAFETY: non-null entries are valid C strings.
            (!arg.is_null()).then(|| unsafe { CStr::from_ptr(arg) }.to_string_lossy().into_owned())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{AppContext, Application};
    use crate::guard::FailureKind;
    use std::ptr;

    struct Volatile {
        panic_in_init: bool,
    }

    impl Application for Volatile {
        fn init(&mut self, _context: &mut AppContext<'_>) -> anyhow::Result<bool> {
            if self.panic_in_init {
                panic!("init exploded");
            }
            Ok(true)
        }

        fn iterate(&mut self, _context: &mut AppContext<'_>) -> anyhow::Result<bool> {
            panic!("frame exploded");
        }
    }

    fn installed(panic_in_init: bool) -> (*mut c_void, AppResult) {
        let mut runner = Box::new(Runner::default());
        runner.register_application(Box::new(Volatile { panic_in_init }));
        let mut state = ptr::null_mut();
        let result = unsafe { install(&mut state, runner, vec!["volatile".to_owned()]) };
        (state, result)
    }

    #[test]
    fn null_state_is_rejected_by_every_callback() {
        let init = unsafe { app_init(ptr::null_mut(), 0, ptr::null_mut()) };
        assert_eq!(init, AppResult::Failure);
        assert_eq!(unsafe { app_iterate(ptr::null_mut()) }, AppResult::Failure);
        let mut quit = RawEvent::quit(0);
        assert_eq!(unsafe { app_event(ptr::null_mut(), &mut quit) }, AppResult::Failure);
        unsafe { app_quit(ptr::null_mut(), AppResult::Failure) };
    }

    #[test]
    fn null_event_is_rejected() {
        let (state, result) = installed(false);
        assert_eq!(result, AppResult::Continue);
        assert!(!state.is_null());

        assert_eq!(unsafe { app_event(state, ptr::null_mut()) }, AppResult::Failure);
        let mut quit = RawEvent::quit(0);
        assert_eq!(unsafe { app_event(state, &mut quit) }, AppResult::Success);
        unsafe { app_quit(state, AppResult::Success) };
    }

    #[test]
    fn panic_in_init_fails_the_run() {
        let (state, result) = installed(true);
        assert_eq!(result, AppResult::Failure);
        assert!(!state.is_null());

        let runner = unsafe { &*state.cast::<Runner>() };
        let failure = runner.last_failure().cloned().unwrap();
        assert_eq!(failure.kind, FailureKind::Generic);
        assert_eq!(failure.message, "panicked: init exploded");
        unsafe { app_quit(state, result) };
    }

    #[test]
    fn panic_in_iterate_fails_the_frame() {
        let (state, result) = installed(false);
        assert_eq!(result, AppResult::Continue);
        assert_eq!(unsafe { app_iterate(state) }, AppResult::Failure);
        unsafe { app_quit(state, AppResult::Failure) };
    }
}
