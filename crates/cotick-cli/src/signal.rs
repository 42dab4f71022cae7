//! SIGINT handling: Ctrl+C raises a stop flag the host loop polls.

use std::sync::atomic::{AtomicBool, Ordering};

static STOP: AtomicBool = AtomicBool::new(false);

/// Flag set once SIGINT has been received
pub fn stop_flag() -> &'static AtomicBool {
    &STOP
}

#[cfg(unix)]
extern "C" fn on_sigint(_: libc::c_int) {
    // Only async-signal-safe work here
    STOP.store(true, Ordering::SeqCst);
}

/// Route SIGINT to the stop flag. Returns false if the handler could not be
/// installed.
#[cfg(unix)]
pub fn install() -> bool {
    let handler = on_sigint as extern "C" fn(libc::c_int) as libc::sighandler_t;
    let previous = unsafe { libc::signal(libc::SIGINT, handler) };
    previous != libc::SIG_ERR
}

#[cfg(not(unix))]
pub fn install() -> bool {
    false
}

