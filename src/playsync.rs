// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Condvar, Mutex,
};
use std::time::Duration;

/// A cancel handle is shared between the player, the tempo driver and the
/// audio device. Any holder may request shutdown; blocking operations are
/// responsible for honoring it.
#[derive(Clone)]
pub struct CancelHandle {
    /// Set to true once cancellation has been requested.
    cancelled: Arc<AtomicBool>,
    /// Guards the condvar below. Cancellation takes this lock before setting
    /// the flag so waiters cannot miss the wakeup.
    mutex: Arc<Mutex<()>>,
    /// Wakes up waiters on cancellation.
    condvar: Arc<Condvar>,
}

impl CancelHandle {
    /// Creates a new cancel handle.
    pub fn new() -> CancelHandle {
        CancelHandle {
            cancelled: Arc::new(AtomicBool::new(false)),
            mutex: Arc::new(Mutex::new(())),
            condvar: Arc::new(Condvar::new()),
        }
    }

    /// Returns true once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Blocks until the handle is cancelled.
    pub fn wait(&self) {
        let mut guard = self.mutex.lock().expect("Error getting lock");
        while !self.is_cancelled() {
            guard = self.condvar.wait(guard).expect("Error getting lock");
        }
    }

    /// Blocks until the handle is cancelled or the timeout elapses. Returns
    /// true if the handle was cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.mutex.lock().expect("Error getting lock");
        let _unused = self
            .condvar
            .wait_timeout_while(guard, timeout, |_| !self.is_cancelled())
            .expect("Error getting lock");
        self.is_cancelled()
    }

    /// Requests cancellation and wakes all waiters.
    pub fn cancel(&self) {
        let _guard = self.mutex.lock().expect("Error getting lock");
        self.cancelled.store(true, Ordering::Relaxed);
        self.condvar.notify_all();
    }
}
