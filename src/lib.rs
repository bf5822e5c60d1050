#![cfg_attr(not(test), no_std)]
#![allow(clippy::missing_safety_doc)]

pub mod diag;
pub mod param;
pub mod proc;
pub mod sync;

pub use proc::{Process, ProcessError, ProcessState, SchedClass, SchedulerState};
pub use sync::interrupt::{push_intr_off, InterruptController, InterruptGuard};
pub use sync::spinlock::{Spinlock, SpinlockGuard};

/// The process table, scheduling engines, and their shared lock. The only
/// instance of [`SchedulerState`] a platform needs: every operation takes
/// the lock through this static, the way the reference kernel's single
/// global `proc` table and per-policy globals are all protected in turn by
/// `p->lock`/the policy's own lock.
pub static SCHEDULER: Spinlock<SchedulerState> = Spinlock::new(SchedulerState::new());

#[cfg(not(test))]
#[panic_handler]
fn panic_handler(_info: &core::panic::PanicInfo) -> ! {
    loop {
        core::hint::spin_loop();
    }
}
