/*
 *   Copyright (c) 2025 R3BL LLC
 *   All rights reserved.
 *
 *   Licensed under the Apache License, Version 2.0 (the "License");
 *   you may not use this file except in compliance with the License.
 *   You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 *   Unless required by applicable law or agreed to in writing, software
 *   distributed under the License is distributed on an "AS IS" BASIS,
 *   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *   See the License for the specific language governing permissions and
 *   limitations under the License.
 */

//! The drop-off point between asynchronous signal handlers and the synchronous
//! scheduler loop.
//!
//! A handler may interrupt any thread at any instruction, so the only thing it
//! is allowed to do is publish one byte into this pre-allocated ring using
//! atomics. No allocation, no locks. The scheduler is the single consumer and
//! drains the ring at its post-quantum safe point.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use smallvec::SmallVec;
use strum_macros::Display;

/// Raw event kinds children communicate through POSIX signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[repr(u8)]
pub enum SignalKind {
    /// SIGUSR1: the current process requests the I/O detour.
    Io = 1,
    /// SIGUSR2: the current process announces completion.
    Exit = 2,
}

impl SignalKind {
    #[must_use]
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::Io),
            2 => Some(Self::Exit),
            _ => None,
        }
    }
}

const EMPTY_SLOT: u8 = 0;

/// Upper bound on signals buffered between two drain points. A quantum is at
/// most a handful of time units, and each live child contributes at most two
/// pending events, so this never fills in practice; if it somehow does, the
/// push is counted in `dropped` instead of blocking inside a handler.
pub const SIGNAL_INBOX_CAPACITY: usize = 1024;

/// Bounded multi-producer / single-consumer ring. Producers are signal
/// handlers (any thread); the consumer is the scheduler loop. `head` and
/// `tail` are free-running counters; a slot holds `EMPTY_SLOT` until its
/// producer publishes the kind, which lets the consumer detect a reserved but
/// not-yet-published slot and stop there.
#[derive(Debug)]
pub struct SignalInbox {
    slots: [AtomicU8; SIGNAL_INBOX_CAPACITY],
    head: AtomicUsize,
    tail: AtomicUsize,
    dropped: AtomicUsize,
}

impl Default for SignalInbox {
    fn default() -> Self { Self::new() }
}

impl SignalInbox {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: [const { AtomicU8::new(EMPTY_SLOT) }; SIGNAL_INBOX_CAPACITY],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
        }
    }

    /// Append one event. Async-signal-safe: atomics only. Returns `false` (and
    /// counts the drop) when the ring is full.
    pub fn push(&self, kind: SignalKind) -> bool {
        loop {
            let head = self.head.load(Ordering::Acquire);
            let tail = self.tail.load(Ordering::Acquire);
            if head.wrapping_sub(tail) >= SIGNAL_INBOX_CAPACITY {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            if self
                .head
                .compare_exchange_weak(
                    head,
                    head.wrapping_add(1),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                self.slots[head % SIGNAL_INBOX_CAPACITY]
                    .store(kind as u8, Ordering::Release);
                return true;
            }
        }
    }

    /// Take every published event, oldest first. Single-consumer: only the
    /// scheduler loop calls this. A slot that is reserved but not yet
    /// published ends the drain; the remainder is picked up at the next safe
    /// point.
    pub fn drain(&self) -> SmallVec<[SignalKind; 8]> {
        let mut taken = SmallVec::new();
        loop {
            let tail = self.tail.load(Ordering::Acquire);
            if tail == self.head.load(Ordering::Acquire) {
                break;
            }
            let raw = self.slots[tail % SIGNAL_INBOX_CAPACITY]
                .swap(EMPTY_SLOT, Ordering::AcqRel);
            if raw == EMPTY_SLOT {
                break;
            }
            self.tail.store(tail.wrapping_add(1), Ordering::Release);
            if let Some(kind) = SignalKind::from_raw(raw) {
                taken.push(kind);
            }
        }
        taken
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tail.load(Ordering::Acquire) == self.head.load(Ordering::Acquire)
    }

    /// How many pushes were rejected because the ring was full.
    #[must_use]
    pub fn dropped_count(&self) -> usize { self.dropped.load(Ordering::Relaxed) }
}
