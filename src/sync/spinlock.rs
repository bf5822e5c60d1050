//! A mutual-exclusion spinlock that owns the data it protects.
use super::interrupt::{pop_intr_off, push_intr_off};
use crate::proc::cpu::cpuid;
use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicI32, Ordering};

/// A spinlock wrapping the value it protects.
///
/// Acquiring disables interrupts on the current CPU for the duration of the
/// critical section (see `sync::interrupt`), so a held `Spinlock` never
/// yields to the scheduler through an interrupt on the same hart.
pub struct Spinlock<T> {
    locked: AtomicBool,
    /// CPU id holding the lock, for deadlock detection. -1 when unlocked.
    holder: AtomicI32,
    data: UnsafeCell<T>,
}
unsafe impl<T: Send> Sync for Spinlock<T> {}

impl<T> Spinlock<T> {
    pub const fn new(data: T) -> Spinlock<T> {
        Spinlock {
            locked: AtomicBool::new(false),
            holder: AtomicI32::new(-1),
            data: UnsafeCell::new(data),
        }
    }

    /// Returns whether this lock is currently held by the calling CPU.
    pub fn held_by_current_cpu(&self) -> bool {
        self.locked.load(Ordering::Acquire) && self.holder.load(Ordering::Acquire) == cpuid()
    }

    pub fn lock(&self) -> SpinlockGuard<'_, T> {
        push_intr_off();

        if self.held_by_current_cpu() {
            panic!("Spinlock: already held by this cpu");
        }

        while self.locked.swap(true, Ordering::Acquire) {
            core::hint::spin_loop();
        }
        self.holder.store(cpuid(), Ordering::Release);

        SpinlockGuard { lock: self }
    }

    unsafe fn unlock(&self) {
        self.holder.store(-1, Ordering::Release);
        self.locked.store(false, Ordering::Release);
        pop_intr_off();
    }
}

pub struct SpinlockGuard<'l, T> {
    lock: &'l Spinlock<T>,
}
impl<'l, T> core::ops::Deref for SpinlockGuard<'l, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}
impl<'l, T> core::ops::DerefMut for SpinlockGuard<'l, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}
impl<'l, T> Drop for SpinlockGuard<'l, T> {
    fn drop(&mut self) {
        unsafe { self.lock.unlock() }
    }
}
