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
use crossbeam_channel::{bounded, Receiver, Sender};

/// How many unconsumed triggers the queue holds. Enough to absorb a few
/// beats of scheduling jitter; a longer backlog would only desynchronize
/// audible pulses from the beat, so anything past this is dropped instead.
pub const TRIGGER_QUEUE_CAPACITY: usize = 10;

/// A beat trigger. Carries no payload beyond "a beat happened".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trigger;

/// Creates the bounded trigger queue connecting the tempo driver to the
/// click generator. Neither end ever blocks.
pub fn channel() -> (TriggerSender, TriggerReceiver) {
    let (tx, rx) = bounded(TRIGGER_QUEUE_CAPACITY);
    (TriggerSender { tx }, TriggerReceiver { rx })
}

/// The tempo driver's end of the trigger queue.
#[derive(Clone)]
pub struct TriggerSender {
    tx: Sender<Trigger>,
}

impl TriggerSender {
    /// Posts a trigger without blocking. Returns false if the queue is full
    /// and the trigger was dropped.
    pub fn try_send(&self) -> bool {
        self.tx.try_send(Trigger).is_ok()
    }
}

/// The click generator's end of the trigger queue.
pub struct TriggerReceiver {
    rx: Receiver<Trigger>,
}

impl TriggerReceiver {
    /// Takes the oldest pending trigger without blocking.
    pub fn try_recv(&self) -> Option<Trigger> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod test {
    use super::{channel, TRIGGER_QUEUE_CAPACITY};

    #[test]
    fn test_overflow_drops_without_blocking() {
        let (tx, rx) = channel();

        for _ in 0..TRIGGER_QUEUE_CAPACITY {
            assert!(tx.try_send());
        }
        assert!(!tx.try_send());
        assert!(!tx.try_send());

        let mut drained = 0;
        while rx.try_recv().is_some() {
            drained += 1;
        }
        assert_eq!(TRIGGER_QUEUE_CAPACITY, drained);
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn test_empty_receive_does_not_block() {
        let (_tx, rx) = channel();
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn test_recovers_after_drain() {
        let (tx, rx) = channel();

        for _ in 0..TRIGGER_QUEUE_CAPACITY {
            assert!(tx.try_send());
        }
        assert!(!tx.try_send());

        assert!(rx.try_recv().is_some());
        assert!(tx.try_send());
    }
}
