use super::context::Context;
use crate::param::NCPU;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Per-CPU state.
pub struct Cpu {
    /// Index into the process table of the process running on this CPU, or
    /// `usize::MAX` if none.
    pub proc: usize,
    /// `swtch()` here to enter the scheduler.
    pub context: Context,
    /// Depth of `push_intr_off()` nesting.
    pub interrupt_disable_layers: i32,
    /// Were interrupts enabled before the first `push_intr_off()`?
    pub previous_interrupts_enabled: bool,
}
impl Cpu {
    pub const fn new() -> Cpu {
        Cpu {
            proc: usize::MAX,
            context: Context::new(),
            interrupt_disable_layers: 0,
            previous_interrupts_enabled: false,
        }
    }

    /// Returns the calling CPU's state.
    #[allow(clippy::mut_from_ref)]
    pub fn current() -> &'static mut Cpu {
        unsafe { &mut CPUS[cpuid() as usize] }
    }
}
impl Default for Cpu {
    fn default() -> Cpu {
        Cpu::new()
    }
}

const NEW_CPU: Cpu = Cpu::new();
static mut CPUS: [Cpu; NCPU] = [NEW_CPU; NCPU];

/// Which hart is "this" CPU, for single- or multi-core test harnesses that
/// have no real `tp` register to read. Platform boot code calls
/// `set_current_cpu` once per core; this crate never reassigns it itself.
static CURRENT_CPU: AtomicUsize = AtomicUsize::new(0);

/// Must be called with interrupts disabled to prevent a race with the
/// process being moved to a different CPU.
pub fn cpuid() -> i32 {
    CURRENT_CPU.load(Ordering::Acquire) as i32
}

/// Sets which CPU table entry `cpuid()` reports for the calling hart. Real
/// boot code calls this once per core, before the dispatcher loop starts;
/// test code calls it directly to simulate a particular core.
pub fn set_current_cpu(id: usize) {
    CURRENT_CPU.store(id, Ordering::Release);
}
