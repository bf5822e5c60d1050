//! Per-CPU interrupt-disable nesting, independent of any real interrupt
//! controller.
//!
//! Real interrupt enable/disable is one of the out-of-scope hardware
//! collaborators: this module tracks nesting depth and the "were interrupts
//! enabled before the first disable" flag the way the reference kernel does,
//! but delegates the actual enable/disable to an [`InterruptController`] the
//! platform installs. The default controller used by tests is a plain
//! counter with no real effect.
use crate::proc::cpu::Cpu;
use core::sync::atomic::{AtomicBool, Ordering};

/// Backs `push_intr_off`/`pop_intr_off`. A real platform implements this
/// against its interrupt controller; the host test harness installs
/// [`CountingInterruptController`].
pub trait InterruptController: Sync {
    fn interrupts_enabled(&self) -> bool;
    fn enable(&self);
    fn disable(&self);
}

/// Test/host double: tracks enabled state with no real hardware effect.
pub struct CountingInterruptController {
    enabled: AtomicBool,
}
impl CountingInterruptController {
    pub const fn new() -> CountingInterruptController {
        CountingInterruptController {
            enabled: AtomicBool::new(true),
        }
    }
}
impl InterruptController for CountingInterruptController {
    fn interrupts_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
    fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }
    fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }
}

static DEFAULT_CONTROLLER: CountingInterruptController = CountingInterruptController::new();
static mut CONTROLLER: &'static dyn InterruptController = &DEFAULT_CONTROLLER;

/// Installs the platform's interrupt controller. Must be called at most once,
/// before any other CPU is brought up.
///
/// # Safety
/// Must not race with `push_intr_off`/`pop_intr_off` on another CPU.
pub unsafe fn set_interrupt_controller(controller: &'static dyn InterruptController) {
    CONTROLLER = controller;
}

fn controller() -> &'static dyn InterruptController {
    unsafe { CONTROLLER }
}

/// Whether interrupts are currently enabled on this CPU, according to the
/// installed controller.
pub fn interrupts_enabled() -> bool {
    controller().interrupts_enabled()
}

/// Disables interrupts on the current CPU, incrementing the nesting depth.
pub fn push_intr_off() {
    let was_enabled = controller().interrupts_enabled();
    let cpu = Cpu::current();

    controller().disable();
    if cpu.interrupt_disable_layers == 0 {
        cpu.previous_interrupts_enabled = was_enabled;
    }
    cpu.interrupt_disable_layers += 1;
}

/// Undoes one `push_intr_off`. Restores interrupts once the nesting depth
/// returns to zero and they were enabled beforehand.
pub fn pop_intr_off() {
    let cpu = Cpu::current();

    if controller().interrupts_enabled() {
        panic!("pop_intr_off - interruptible");
    } else if cpu.interrupt_disable_layers < 1 {
        panic!("pop_intr_off");
    }

    cpu.interrupt_disable_layers -= 1;

    if cpu.interrupt_disable_layers == 0 && cpu.previous_interrupts_enabled {
        controller().enable();
    }
}

/// RAII interrupt-disable guard, for call sites that don't otherwise hold a
/// `Spinlock`.
///
/// Holds a raw-pointer marker so it is neither `Send` nor `Sync`: it must be
/// dropped on the CPU that created it.
#[derive(Default)]
pub struct InterruptGuard(core::marker::PhantomData<*const ()>);
impl InterruptGuard {
    pub fn new() -> InterruptGuard {
        push_intr_off();
        InterruptGuard(core::marker::PhantomData)
    }
}
impl Drop for InterruptGuard {
    fn drop(&mut self) {
        pop_intr_off();
    }
}
