//! The boot/runtime execution phase predicate.
//!
//! Several services behave differently once the operating system has taken ownership of the
//! platform. The transition happens exactly once and is never undone.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};

/// Reports whether the platform has transitioned into the restricted runtime phase.
pub trait ExecutionPhase: Send + Sync {
    /// Returns `true` once boot services have been exited.
    fn at_runtime(&self) -> bool;
}

impl<T: ExecutionPhase + ?Sized> ExecutionPhase for &T {
    fn at_runtime(&self) -> bool {
        T::at_runtime(self)
    }
}

impl<T: ExecutionPhase + ?Sized> ExecutionPhase for Arc<T> {
    fn at_runtime(&self) -> bool {
        T::at_runtime(self)
    }
}

/// A one-way flag recording the boot to runtime transition.
#[derive(Debug, Default)]
pub struct PhaseFlag {
    /// Set when boot services have been exited.
    runtime: AtomicBool,
}

impl PhaseFlag {
    /// Creates a new [`PhaseFlag`] in the boot phase.
    pub const fn new() -> Self {
        Self {
            runtime: AtomicBool::new(false),
        }
    }

    /// Records the transition into the runtime phase.
    pub fn exit_boot_services(&self) {
        self.runtime.store(true, Ordering::Release);
    }
}

impl ExecutionPhase for PhaseFlag {
    fn at_runtime(&self) -> bool {
        self.runtime.load(Ordering::Acquire)
    }
}

/// A phase predicate that never leaves the boot phase.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct BootPhase;

impl ExecutionPhase for BootPhase {
    fn at_runtime(&self) -> bool {
        false
    }
}
