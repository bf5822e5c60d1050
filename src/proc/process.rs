use super::context::Context;
use super::trapframe::Trapframe;
use crate::param::NOFILE;

/// Lifecycle state of a process control block.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ProcessState {
    #[default]
    Unused,
    Embryo,
    Sleeping,
    Runnable,
    Running,
    Zombie,
}

/// Which policy owns this process's scheduling, and that policy's
/// per-process accounting.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SchedClass {
    /// Plain stride round-robin pool, no reservation.
    Default {
        /// Toggles each round; matches the engine's `switch_num` once this
        /// process has run in the current round.
        swtch: u8,
    },
    /// Multi-level feedback queue pool.
    Mlfq {
        /// 1, 2 or 3 (1 is highest priority), matching `getlev`'s contract.
        level: u8,
        exec_count: u32,
    },
    /// Reserved-percentage stride pool.
    Share { share: u8, stride: i64, pass: i64 },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProcessError {
    /// No UNUSED slot was available in the process table.
    TableFull,
    /// No pid in the table matched.
    NoSuchProcess,
    /// Caller has no children to reap.
    NoChildren,
    /// Caller was killed while waiting.
    Killed,
    /// `cpu_share` percentage was not in `1..=20`, or would push the
    /// aggregate share over the cap.
    InvalidShare,
    /// `run_MLFQ` called by a process already in the MLFQ pool.
    AlreadyMlfq,
    /// `run_MLFQ` called by a SHARE process: rejected rather than silently
    /// corrupting the share accounting (see the open-question resolution in
    /// DESIGN.md).
    ShareIneligible,
}

/// A process control block.
///
/// Fields unrelated to scheduling (`context`, `trapframe`, `kernel_stack`,
/// `pagetable`, `size`, `cwd`, `open_files`, `name`) are kept only as opaque
/// placeholders: their real contents are produced by collaborators outside
/// this crate (virtual memory, the filesystem, trap handling).
#[derive(Copy, Clone)]
pub struct Process {
    pub pid: i32,
    pub state: ProcessState,
    pub killed: bool,
    /// Opaque wait channel; `None` when not sleeping.
    pub chan: Option<usize>,
    /// Index of the parent in the process table.
    pub parent: Option<usize>,
    pub sched_class: SchedClass,

    pub context: Context,
    pub trapframe: Trapframe,
    pub kernel_stack: u64,
    pub pagetable: u64,
    pub size: u64,
    pub cwd: u64,
    pub open_files: [bool; NOFILE],
    pub name: [u8; 16],
}
impl Process {
    pub const fn new() -> Process {
        Process {
            pid: 0,
            state: ProcessState::Unused,
            killed: false,
            chan: None,
            parent: None,
            sched_class: SchedClass::Default { swtch: 0 },
            context: Context::new(),
            trapframe: Trapframe::new(),
            kernel_stack: 0,
            pagetable: 0,
            size: 0,
            cwd: 0,
            open_files: [false; NOFILE],
            name: [0; 16],
        }
    }

    pub fn is_runnable_or_running(&self) -> bool {
        matches!(self.state, ProcessState::Runnable | ProcessState::Running)
    }

    /// Resets every field to the UNUSED default, as the reaper does once a
    /// zombie has been collected by `wait`.
    pub fn free(&mut self) {
        *self = Process::new();
    }
}
impl Default for Process {
    fn default() -> Process {
        Process::new()
    }
}
