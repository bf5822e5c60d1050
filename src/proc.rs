//! Process table, scheduling engines, and the single lock that guards both.
pub mod context;
pub mod cpu;
pub mod list;
pub mod mlfq;
pub mod process;
pub mod scheduler;
pub mod stride;
pub mod trapframe;

pub use context::Context;
pub use cpu::{cpuid, set_current_cpu, Cpu};
pub use process::{Process, ProcessError, ProcessState, SchedClass};
pub use scheduler::{set_context_switch, ContextSwitch, NoopContextSwitch, SchedulerState};
pub use trapframe::Trapframe;
