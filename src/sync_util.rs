//! Mutex/condvar helpers shared by the slot table, line-map, and reaper.

use std::sync::{Condvar, Mutex, MutexGuard};

/// Lock a mutex, recovering the inner value if a prior panic poisoned it.
///
/// A poisoned mutex here means some other thread panicked while holding the
/// lock. The supervisor's response to a truly fatal condition is to log and
/// exit (spec §7); a poisoned line buffer or line-map otherwise just means
/// "this value might be stale", which is tolerable, so callers keep going
/// rather than propagate the poison.
pub fn lock_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Wait on a condition variable, recovering the guard the same way `lock_recover` does.
pub fn wait_recover<'a, T>(
    condvar: &Condvar,
    guard: MutexGuard<'a, T>,
) -> MutexGuard<'a, T> {
    condvar
        .wait(guard)
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
