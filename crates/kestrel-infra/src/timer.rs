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

//! Periodic timers running on auxiliary threads.
//!
//! Each [`Timer`] owns one driver thread. The user callback runs with the
//! timer's callback lock held for its whole duration, and [`Timer::stop`]
//! takes that same lock after cancelling, so once `stop` returns no callback
//! is executing and none will start.
//!
//! Callbacks run off the main thread. To reach handlers they should publish
//! through an [`EventSender`](kestrel_core::event::EventSender); the event is
//! queued and routed on the driver thread.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use kestrel_core::{Error, Result};

type TimerCallback = Box<dyn FnMut() -> Duration + Send>;

static NEXT_TIMER_ID: AtomicU32 = AtomicU32::new(1);

struct TimerShared {
    id: u32,
    running: AtomicBool,
    callback: Mutex<Option<TimerCallback>>,
    cancel: Sender<()>,
    thread: OnceLock<ThreadId>,
}

impl TimerShared {
    fn on_timer_thread(&self) -> bool {
        self.thread.get() == Some(&thread::current().id())
    }

    /// Cancels the timer. Returns `false` when called from the callback itself,
    /// in which case only the running flag is cleared.
    fn cancel(&self) -> bool {
        self.running.store(false, Ordering::SeqCst);
        // A full channel already holds a wake-up.
        let _ = self.cancel.try_send(());

        if self.on_timer_thread() {
            return false;
        }
        self.callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        true
    }
}

/// A periodic timer.
///
/// The callback returns the delay until its next call; returning
/// [`Duration::ZERO`] cancels the timer. Dropping the timer stops it.
pub struct Timer {
    shared: Arc<TimerShared>,
    handle: Option<JoinHandle<()>>,
}

impl Timer {
    /// Starts a timer that first fires after `interval`.
    ///
    /// # Errors
    /// Returns [`Error::Toolkit`] if `interval` is zero or the driver thread
    /// cannot be spawned.
    pub fn start<F>(interval: Duration, callback: F) -> Result<Self>
    where
        F: FnMut() -> Duration + Send + 'static,
    {
        if interval.is_zero() {
            return Err(Error::toolkit("add timer", "interval must be non-zero"));
        }

        let (cancel_tx, cancel_rx) = crossbeam_channel::bounded(1);
        let shared = Arc::new(TimerShared {
            id: NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed),
            running: AtomicBool::new(true),
            callback: Mutex::new(Some(Box::new(callback))),
            cancel: cancel_tx,
            thread: OnceLock::new(),
        });

        let worker = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(format!("kestrel-timer-{}", shared.id))
            .spawn(move || drive(&worker, &cancel_rx, interval))
            .map_err(|e| Error::toolkit("spawn timer thread", e))?;

        log::debug!("Timer {} started ({:?}).", shared.id, interval);
        Ok(Self {
            shared,
            handle: Some(handle),
        })
    }

    /// The timer's process-unique id.
    pub fn id(&self) -> u32 {
        self.shared.id
    }

    /// Returns `true` until the timer is stopped or its callback cancels it.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// A handle that can stop this timer from elsewhere, including its own callback.
    pub fn handle(&self) -> TimerHandle {
        TimerHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Stops the timer and waits for its thread to finish.
    ///
    /// After this returns no callback is executing and none will start.
    /// Calling it again is a no-op.
    pub fn stop(&mut self) {
        if !self.shared.cancel() {
            return;
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Timer {} callback panicked.", self.shared.id);
            }
            log::debug!("Timer {} stopped.", self.shared.id);
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("id", &self.shared.id)
            .field("running", &self.is_running())
            .finish()
    }
}

/// A cloneable, thread-safe way to stop a [`Timer`].
#[derive(Clone)]
pub struct TimerHandle {
    shared: Arc<TimerShared>,
}

impl TimerHandle {
    /// Stops the timer.
    ///
    /// From any thread but the timer's own, this has the same guarantee as
    /// [`Timer::stop`] except that the thread is not joined. From inside the
    /// callback it only clears the running flag; the callback is not called again.
    pub fn stop(&self) {
        self.shared.cancel();
    }

    /// Returns `true` until the timer is stopped or its callback cancels it.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("id", &self.shared.id)
            .finish_non_exhaustive()
    }
}

fn drive(shared: &TimerShared, cancel: &Receiver<()>, mut interval: Duration) {
    let _ = shared.thread.set(thread::current().id());

    loop {
        match cancel.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }

        let mut slot = shared
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !shared.running.load(Ordering::SeqCst) {
            break;
        }
        let Some(callback) = slot.as_mut() else {
            break;
        };
        let next = callback();
        drop(slot);

        if next.is_zero() {
            shared.running.store(false, Ordering::SeqCst);
            log::debug!("Timer {} cancelled by its callback.", shared.id);
            break;
        }
        interval = next;
    }
}
