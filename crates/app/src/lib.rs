//! Blastoff application
//!
//! The flame animation engine and the lifecycle controller that starts and stops it
//! on behalf of any number of concurrent callers.

// Linter configuration
#![warn(unsafe_code, clippy::pedantic, clippy::use_self)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use blastoff_core as core;
pub use blastoff_core::{DriverError, DriverFactory, OperationError, StripConfig, StripDriver};

pub use crate::{
    cancel::CancellationToken,
    controller::{abort_process, Controller, LifecycleState, RenderFailureHandler},
    engine::AnimationEngine,
    observer::StateObserver,
};

pub mod drivers;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

mod cancel;
mod controller;
mod engine;
mod observer;

/// Exit status used when the strip fails in the middle of the animation.
pub const RENDER_FAILURE_EXIT_CODE: i32 = 70;

/// Locks the mutex even if another thread has panicked while holding it.
///
/// Every state guarded in this crate is written only after the corresponding driver
/// call has succeeded, so the data behind a poisoned lock is still consistent.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
