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

//! Installs the SIGUSR1/SIGUSR2 handlers that feed the [`SignalInbox`].
//!
//! POSIX handlers cannot carry arguments, so the inbox is reached through a
//! single process-wide pointer that is published exactly once, before
//! `sigaction` runs. The handler body is the minimum the contract allows:
//! look up the inbox, push one byte, return.

use std::{ptr,
          sync::{Arc,
                 atomic::{AtomicPtr, Ordering}}};

use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use thiserror::Error;

use super::{SignalInbox, SignalKind};

#[derive(Debug, Error)]
pub enum SignalSetupError {
    #[error("could not install handler for {signal}: {source}")]
    Sigaction {
        signal: Signal,
        source: nix::errno::Errno,
    },
}

/// Back-channel for the handlers. Holds a leaked `Arc` reference so the inbox
/// outlives every possible signal delivery.
static PROCESS_WIDE_INBOX: AtomicPtr<SignalInbox> = AtomicPtr::new(ptr::null_mut());

extern "C" fn forward_signal_to_inbox(signo: libc::c_int) {
    let inbox_ptr = PROCESS_WIDE_INBOX.load(Ordering::Acquire);
    if inbox_ptr.is_null() {
        return;
    }
    let kind = match signo {
        libc::SIGUSR1 => SignalKind::Io,
        libc::SIGUSR2 => SignalKind::Exit,
        _ => return,
    };
    // SAFETY: the pointer came from `Arc::into_raw` and is never released.
    let inbox = unsafe { &*inbox_ptr };
    let _ = inbox.push(kind);
}

/// Point the process-wide back-channel at `inbox` and install the SIGUSR1 /
/// SIGUSR2 handlers. Meant to be called once at startup, before any child can
/// run; calling it again re-points the channel (the previous inbox reference
/// stays leaked, since a handler may still be observing it).
///
/// # Errors
///
/// Returns [`SignalSetupError::Sigaction`] when the OS rejects the handler
/// installation.
pub fn install_signal_handlers(inbox: &Arc<SignalInbox>) -> Result<(), SignalSetupError> {
    let raw = Arc::into_raw(inbox.clone()).cast_mut();
    PROCESS_WIDE_INBOX.store(raw, Ordering::Release);

    let action = SigAction::new(
        SigHandler::Handler(forward_signal_to_inbox),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    for signal in [Signal::SIGUSR1, Signal::SIGUSR2] {
        // SAFETY: the handler touches only the lock-free inbox ring.
        unsafe {
            sigaction(signal, &action)
                .map_err(|source| SignalSetupError::Sigaction { signal, source })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use nix::{sys::signal::kill, unistd::getpid};
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn delivered_signals_land_in_the_inbox() {
        let inbox = Arc::new(SignalInbox::new());
        install_signal_handlers(&inbox).unwrap();

        kill(getpid(), Signal::SIGUSR1).unwrap();
        kill(getpid(), Signal::SIGUSR2).unwrap();

        // Delivery to self happens during the kill syscall, but don't rely on
        // it; give the kernel a beat.
        let mut drained = inbox.drain();
        for _ in 0..100 {
            if drained.len() >= 2 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
            drained.extend(inbox.drain());
        }

        assert_eq!(
            drained.as_slice(),
            [SignalKind::Io, SignalKind::Exit]
        );
    }
}
