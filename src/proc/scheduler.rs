//! The arbiter, the dispatcher, and the lifecycle hooks that tie the MLFQ
//! and Stride engines to the process table under one coarse-grained lock.
use super::context::Context;
use super::cpu::Cpu;
use super::list::ListArena;
use super::mlfq::MlfqEngine;
use super::process::{Process, ProcessError, ProcessState, SchedClass};
use super::stride::StrideEngine;
use crate::param::{NPROC, STRIDE_INITIAL, STRIDE_SHARE_CAP};
use crate::sync::interrupt::interrupts_enabled;
use crate::sync::spinlock::SpinlockGuard;

/// Everything protected by the single global process-table lock: the
/// process table itself, both scheduling engines, and the list arena they
/// share.
pub struct SchedulerState {
    processes: [Process; NPROC],
    arena: ListArena,
    mlfq: MlfqEngine,
    stride: StrideEngine,
    next_pid: i32,
    pub initproc: Option<usize>,
    /// Diagnostic: the pass value of the last dispatched entity.
    pub min_pass: i64,
    /// The process dispatched by the previous `scheduler_step`, whose
    /// post-run bookkeeping (reap-if-unused, boost check) runs at the start
    /// of the next step -- there being no real `swtch()` boundary to hook in
    /// a hosted/test build.
    last_dispatched: Option<usize>,
}
impl SchedulerState {
    pub const fn new() -> SchedulerState {
        SchedulerState {
            processes: [Process::new(); NPROC],
            arena: ListArena::new(),
            mlfq: MlfqEngine::new(),
            stride: StrideEngine::new(STRIDE_INITIAL),
            next_pid: 1,
            initproc: None,
            min_pass: 0,
            last_dispatched: None,
        }
    }

    pub fn process(&self, index: usize) -> &Process {
        &self.processes[index]
    }
    pub fn process_mut(&mut self, index: usize) -> &mut Process {
        &mut self.processes[index]
    }
    pub fn find_by_pid(&self, pid: i32) -> Option<usize> {
        self.processes.iter().position(|p| p.pid == pid)
    }

    fn list_for(p: &Process) -> ListTarget {
        match p.sched_class {
            SchedClass::Default { .. } => ListTarget::StrideDefault,
            SchedClass::Mlfq { level, .. } => ListTarget::Mlfq(level as usize - 1),
            SchedClass::Share { .. } => ListTarget::None,
        }
    }
    fn remove_from_membership(&mut self, index: usize) {
        let target = Self::list_for(&self.processes[index]);
        match target {
            ListTarget::StrideDefault => self.stride.remove(&mut self.arena, index),
            ListTarget::Mlfq(level) => self.mlfq.remove(&mut self.arena, level, index),
            ListTarget::None => {}
        }
    }

    /// Finds an UNUSED slot and transitions it to EMBRYO, mirroring
    /// `allocproc`. The caller is responsible for anything that belongs to
    /// the out-of-scope VM/trap collaborators (kernel stack, trapframe
    /// contents).
    pub fn alloc_process(&mut self) -> Result<usize, ProcessError> {
        let index = self
            .processes
            .iter()
            .position(|p| p.state == ProcessState::Unused)
            .ok_or(ProcessError::TableFull)?;

        let pid = self.next_pid;
        self.next_pid += 1;

        let p = &mut self.processes[index];
        *p = Process::new();
        p.state = ProcessState::Embryo;
        p.pid = pid;
        p.sched_class = SchedClass::Default {
            swtch: self.stride.switch_num,
        };

        if pid == 1 {
            self.stride.push(&mut self.arena, index);
            self.initproc = Some(index);
        }

        Ok(index)
    }

    /// Duplicates `parent` into a freshly allocated child, mirroring `fork`.
    /// Returns the child's pid.
    pub fn fork(&mut self, parent: usize, name: [u8; 16]) -> Result<i32, ProcessError> {
        let child = self.alloc_process()?;

        self.processes[child].name = name;
        self.processes[child].parent = Some(parent);
        self.processes[child].cwd = self.processes[parent].cwd;
        self.processes[child].open_files = self.processes[parent].open_files;
        self.processes[child].size = self.processes[parent].size;

        let pid = self.processes[child].pid;

        self.processes[child].state = ProcessState::Runnable;
        if pid != 1 {
            self.stride.push(&mut self.arena, child);
        }

        crate::diag::log_lifecycle!(
            "fork: parent pid={} child pid={}",
            self.processes[parent].pid,
            pid
        );
        Ok(pid)
    }

    /// Passes `parent`'s children to `initproc` and marks it Zombie,
    /// mirroring `exit`. Does not context switch: the caller invokes `sched`
    /// separately (see `SpinlockGuard::sched`) once it has released whatever
    /// else it needs to.
    pub fn exit(&mut self, index: usize) -> Result<(), ProcessError> {
        if Some(index) == self.initproc {
            panic!("init exiting");
        }

        let parent = self.processes[index].parent;
        let initproc = self.initproc;
        for p in self.processes.iter_mut() {
            if p.parent == Some(index) {
                p.parent = initproc;
            }
        }
        self.wakeup_index(parent);
        self.wakeup_index(initproc);

        self.remove_from_membership(index);
        self.processes[index].state = ProcessState::Zombie;
        crate::diag::log_lifecycle!("exit: pid={}", self.processes[index].pid);
        Ok(())
    }

    fn wakeup_index(&mut self, target: Option<usize>) {
        if let Some(idx) = target {
            let p = &self.processes[idx];
            if p.state == ProcessState::Sleeping {
                self.processes[idx].state = ProcessState::Runnable;
            }
        }
    }

    /// Scans for a zombie child of `caller`, mirroring `wait`. Returns
    /// `Ok(Some(pid))` when one was reaped, `Ok(None)` when the caller
    /// should sleep (on `caller`'s own index as the channel) and retry, or
    /// `Err` when there are no children or the caller was killed.
    pub fn try_wait(&mut self, caller: usize) -> Result<Option<i32>, ProcessError> {
        let mut has_children = false;
        for i in 0..self.processes.len() {
            if self.processes[i].parent != Some(caller) {
                continue;
            }
            has_children = true;
            if self.processes[i].state == ProcessState::Zombie {
                let pid = self.processes[i].pid;
                self.processes[i].free();
                return Ok(Some(pid));
            }
        }

        if !has_children {
            return Err(ProcessError::NoChildren);
        }
        if self.processes[caller].killed {
            return Err(ProcessError::Killed);
        }
        Ok(None)
    }

    /// Transfers `index` into the MLFQ pool, mirroring `run_MLFQ`.
    pub fn run_mlfq(&mut self, index: usize) -> Result<(), ProcessError> {
        match self.processes[index].sched_class {
            SchedClass::Mlfq { .. } => return Err(ProcessError::AlreadyMlfq),
            SchedClass::Share { .. } => return Err(ProcessError::ShareIneligible),
            SchedClass::Default { .. } => {}
        }

        self.stride.remove(&mut self.arena, index);
        self.processes[index].sched_class = SchedClass::Mlfq {
            level: 1,
            exec_count: 0,
        };
        self.mlfq.admit(&mut self.arena, index);
        Ok(())
    }

    /// Returns 0/1/2 for an MLFQ process's level, or -1, mirroring `getlev`.
    pub fn getlev(&self, index: usize) -> i32 {
        match self.processes[index].sched_class {
            SchedClass::Mlfq { level, .. } => level as i32 - 1,
            _ => -1,
        }
    }

    /// Reserves `percent` CPU for `index`, mirroring `cpu_share`.
    pub fn cpu_share(&mut self, index: usize, percent: i32) -> Result<(), ProcessError> {
        let current_total: i32 = self
            .processes
            .iter()
            .filter_map(|p| match p.sched_class {
                SchedClass::Share { share, .. } => Some(share as i32),
                _ => None,
            })
            .sum();

        if percent <= 0 || current_total + percent > STRIDE_SHARE_CAP as i32 {
            return Err(ProcessError::InvalidShare);
        }

        self.remove_from_membership(index);
        self.processes[index].sched_class = SchedClass::Share {
            share: percent as u8,
            stride: 0,
            pass: self.stride.pass,
        };
        Ok(())
    }

    /// Marks the process with `pid` killed, waking it if sleeping, mirroring
    /// `kill`.
    pub fn kill(&mut self, pid: i32) -> Result<(), ProcessError> {
        let index = self.find_by_pid(pid).ok_or(ProcessError::NoSuchProcess)?;
        self.processes[index].killed = true;
        if self.processes[index].state == ProcessState::Sleeping {
            self.processes[index].state = ProcessState::Runnable;
        }
        Ok(())
    }

    /// Wakes every sleeper on `chan`, mirroring `wakeup`/`wakeup1`.
    pub fn wakeup(&mut self, chan: usize) {
        for p in self.processes.iter_mut() {
            if p.state == ProcessState::Sleeping && p.chan == Some(chan) {
                p.state = ProcessState::Runnable;
            }
        }
    }

    /// The arbiter: orders the three pools by pass and dispatches the
    /// winner, mirroring `choice`. Applies the exact pairwise tie-break
    /// comparisons the reference performs, rather than a plain sort, so
    /// behaviour matches when passes are equal.
    pub fn choice(&mut self) -> Option<usize> {
        let mut default_exists = false;
        let mut mlfq_exists = false;
        let mut share_min: Option<usize> = None;

        for (i, p) in self.processes.iter().enumerate() {
            if p.state != ProcessState::Runnable {
                continue;
            }
            match p.sched_class {
                SchedClass::Default { .. } => default_exists = true,
                SchedClass::Mlfq { .. } => mlfq_exists = true,
                SchedClass::Share { pass, .. } => {
                    share_min = match share_min {
                        None => Some(i),
                        Some(best) => {
                            let SchedClass::Share { pass: best_pass, .. } =
                                self.processes[best].sched_class
                            else {
                                unreachable!()
                            };
                            if best_pass > pass {
                                Some(i)
                            } else {
                                Some(best)
                            }
                        }
                    };
                }
            }
        }

        let share_exists = share_min.is_some();
        let share_pass = match share_min {
            Some(i) => {
                let SchedClass::Share { pass, .. } = self.processes[i].sched_class else {
                    unreachable!()
                };
                pass
            }
            None => 1,
        };

        // 1 = default, 2 = share, 3 = mlfq; 0 = absent. Mirrors the
        // reference's nested comparisons over (share_pass, mlfq.pass,
        // stride.pass) exactly, preserving its tie-break order.
        let order: [i32; 3] = if share_pass > self.mlfq.pass {
            if self.mlfq.pass < self.stride.pass {
                if self.stride.pass > share_pass {
                    [3, 2, 1]
                } else {
                    [3, 1, 2]
                }
            } else {
                [1, 3, 2]
            }
        } else if share_pass < self.stride.pass {
            if self.mlfq.pass < self.stride.pass {
                [2, 3, 1]
            } else {
                [2, 1, 3]
            }
        } else {
            [1, 2, 3]
        };

        let flags = |slot: i32| match slot {
            1 => default_exists,
            2 => share_exists,
            3 => mlfq_exists,
            _ => false,
        };

        for &slot in order.iter() {
            if !flags(slot) {
                continue;
            }
            match slot {
                3 => {
                    let chosen = self.mlfq.start(&mut self.processes, &mut self.arena);
                    self.min_pass = self.mlfq.pass;
                    return chosen;
                }
                2 => {
                    let idx = share_min.expect("share_exists implies share_min");
                    let SchedClass::Share { share, stride, pass } =
                        &mut self.processes[idx].sched_class
                    else {
                        unreachable!()
                    };
                    *stride = crate::param::STRIDE_SCALE / (*share as i64);
                    *pass += *stride;
                    let SchedClass::Share { pass, .. } = self.processes[idx].sched_class else {
                        unreachable!()
                    };
                    self.min_pass = pass;
                    return Some(idx);
                }
                1 => {
                    let mlfq_nonempty = !self.mlfq.is_empty();
                    let chosen =
                        self.stride
                            .start(&mut self.processes, &self.arena, mlfq_nonempty);
                    self.min_pass = self.stride.pass;
                    return chosen;
                }
                _ => {}
            }
        }
        None
    }

    /// One iteration of the dispatcher's main loop body, mirroring
    /// `scheduler`: finishes the previous dispatch's post-run bookkeeping,
    /// then picks and marks the next winner Running. Returns the dispatched
    /// pid, or `None` if nothing was runnable.
    pub fn scheduler_step(&mut self) -> Option<i32> {
        if let Some(prev) = self.last_dispatched.take() {
            if self.processes[prev].state == ProcessState::Unused {
                self.remove_from_membership(prev);
            }
            if self.mlfq.boosting_period >= crate::param::MLFQ_BOOST_PERIOD {
                self.mlfq.boost(&mut self.processes, &mut self.arena);
                crate::diag::log_boost!("mlfq boost: period reset, all levels -> L1");
            }
        }

        let chosen = self.choice()?;
        if self.processes[chosen].state != ProcessState::Runnable {
            return None;
        }
        crate::diag::log_dispatch!("dispatch pid={}", self.processes[chosen].pid);
        self.processes[chosen].state = ProcessState::Running;
        self.last_dispatched = Some(chosen);
        Cpu::current().proc = chosen;
        Some(self.processes[chosen].pid)
    }
}
impl Default for SchedulerState {
    fn default() -> SchedulerState {
        SchedulerState::new()
    }
}

enum ListTarget {
    StrideDefault,
    Mlfq(usize),
    None,
}

/// Backs `sched()`'s real context switch. A real platform implements this
/// against `swtch`; the host/test double performs no real transfer since
/// there is nothing else to run to.
pub trait ContextSwitch: Sync {
    /// # Safety
    /// Must only be called with the preconditions `SpinlockGuard::sched`
    /// documents: the scheduler lock held, exactly one interrupt-disable
    /// layer, and the calling process not RUNNING.
    unsafe fn switch(&self, from: *mut Context, to: *mut Context);
}
pub struct NoopContextSwitch;
impl ContextSwitch for NoopContextSwitch {
    unsafe fn switch(&self, _from: *mut Context, _to: *mut Context) {}
}
static DEFAULT_CONTEXT_SWITCH: NoopContextSwitch = NoopContextSwitch;
static mut CONTEXT_SWITCH: &'static dyn ContextSwitch = &DEFAULT_CONTEXT_SWITCH;

/// Installs the platform's context switch primitive.
///
/// # Safety
/// Must not race with `SpinlockGuard::sched` on another CPU.
pub unsafe fn set_context_switch(cs: &'static dyn ContextSwitch) {
    CONTEXT_SWITCH = cs;
}

impl<'l> SpinlockGuard<'l, SchedulerState> {
    /// Switches from the calling process into the per-CPU scheduler context,
    /// mirroring `sched()`'s preconditions and register-save discipline.
    pub fn sched(&mut self, index: usize) {
        let previous_interrupts_enabled = {
            let cpu = Cpu::current();
            if cpu.interrupt_disable_layers != 1 {
                panic!("sched locks");
            } else if self.process(index).state == ProcessState::Running {
                panic!("sched running");
            } else if interrupts_enabled() {
                panic!("sched interruptible");
            }
            cpu.previous_interrupts_enabled
        };

        let proc_context: *mut Context = &mut self.process_mut(index).context;
        let cpu_context: *mut Context = &mut Cpu::current().context;
        let context_switch = unsafe { CONTEXT_SWITCH };
        unsafe { context_switch.switch(proc_context, cpu_context) };
        Cpu::current().previous_interrupts_enabled = previous_interrupts_enabled;
    }

    /// Gives up the CPU for one scheduling round, mirroring `yield`.
    pub fn yield_process(&mut self, index: usize) {
        self.process_mut(index).state = ProcessState::Runnable;
        self.sched(index);
    }

    /// Sleeps `index` on `chan` until `wakeup(chan)` is called, mirroring
    /// `sleep`.
    pub fn sleep(&mut self, index: usize, chan: usize) {
        self.process_mut(index).chan = Some(chan);
        self.process_mut(index).state = ProcessState::Sleeping;
        self.sched(index);
        self.process_mut(index).chan = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::spinlock::Spinlock;
    use serial_test::serial;

    // Cpu::current()/cpuid() read a process-wide singleton, the same as on
    // real hardware where there is exactly one table per physical CPU.
    // Tests that touch it pin themselves to CPU 0 and are marked #[serial]
    // so the test runner doesn't race two of them across threads.
    fn pin_to_cpu_zero() {
        super::super::cpu::set_current_cpu(0);
    }

    fn new_runnable(state: &mut SchedulerState) -> usize {
        let idx = state.alloc_process().unwrap();
        state.process_mut(idx).state = ProcessState::Runnable;
        idx
    }

    mod lifecycle {
        use super::*;

        #[test]
        fn first_allocation_becomes_initproc_and_joins_the_default_pool() {
            let mut state = SchedulerState::new();
            let idx = state.alloc_process().unwrap();
            assert_eq!(state.initproc, Some(idx));
            assert_eq!(state.process(idx).pid, 1);
            assert_eq!(state.process(idx).state, ProcessState::Embryo);
        }

        #[test]
        fn table_full_is_reported_once_every_slot_is_taken() {
            let mut state = SchedulerState::new();
            for _ in 0..NPROC {
                state.alloc_process().unwrap();
            }
            assert_eq!(state.alloc_process(), Err(ProcessError::TableFull));
        }

        #[test]
        fn fork_copies_parent_metadata_into_a_runnable_child() {
            let mut state = SchedulerState::new();
            let parent = new_runnable(&mut state);
            state.process_mut(parent).cwd = 42;

            let child_pid = state.fork(parent, *b"child\0\0\0\0\0\0\0\0\0\0\0").unwrap();
            let child = state.find_by_pid(child_pid).unwrap();
            assert_eq!(state.process(child).parent, Some(parent));
            assert_eq!(state.process(child).cwd, 42);
            assert_eq!(state.process(child).state, ProcessState::Runnable);
        }

        #[test]
        fn exit_reparents_children_to_initproc_and_becomes_a_zombie() {
            let mut state = SchedulerState::new();
            let init = new_runnable(&mut state);
            state.initproc = Some(init);
            let parent = new_runnable(&mut state);
            let child_pid = state.fork(parent, *b"child\0\0\0\0\0\0\0\0\0\0\0").unwrap();
            let child = state.find_by_pid(child_pid).unwrap();

            state.exit(parent).unwrap();

            assert_eq!(state.process(parent).state, ProcessState::Zombie);
            assert_eq!(state.process(child).parent, Some(init));
        }

        #[test]
        #[should_panic(expected = "init exiting")]
        fn initproc_may_not_exit() {
            let mut state = SchedulerState::new();
            let init = state.alloc_process().unwrap();
            state.initproc = Some(init);
            let _ = state.exit(init);
        }
    }

    mod waiting {
        use super::*;

        #[test]
        fn reaps_a_zombie_child_and_frees_its_slot() {
            let mut state = SchedulerState::new();
            let parent = new_runnable(&mut state);
            let child_pid = state.fork(parent, *b"child\0\0\0\0\0\0\0\0\0\0\0").unwrap();
            let child = state.find_by_pid(child_pid).unwrap();
            state.process_mut(child).state = ProcessState::Zombie;

            assert_eq!(state.try_wait(parent), Ok(Some(child_pid)));
            assert_eq!(state.process(child).state, ProcessState::Unused);
        }

        #[test]
        fn a_childless_caller_gets_no_children() {
            let mut state = SchedulerState::new();
            let parent = new_runnable(&mut state);
            assert_eq!(state.try_wait(parent), Err(ProcessError::NoChildren));
        }

        #[test]
        fn a_caller_with_only_live_children_is_told_to_retry() {
            let mut state = SchedulerState::new();
            let parent = new_runnable(&mut state);
            state.fork(parent, *b"child\0\0\0\0\0\0\0\0\0\0\0").unwrap();
            assert_eq!(state.try_wait(parent), Ok(None));
        }

        #[test]
        fn a_killed_caller_with_live_children_is_told_it_was_killed() {
            let mut state = SchedulerState::new();
            let parent = new_runnable(&mut state);
            state.fork(parent, *b"child\0\0\0\0\0\0\0\0\0\0\0").unwrap();
            state.process_mut(parent).killed = true;
            assert_eq!(state.try_wait(parent), Err(ProcessError::Killed));
        }
    }

    mod policy_transitions {
        use super::*;

        #[test]
        fn run_mlfq_moves_a_default_process_into_level_one() {
            let mut state = SchedulerState::new();
            let idx = new_runnable(&mut state);
            state.run_mlfq(idx).unwrap();
            assert_eq!(state.getlev(idx), 0);
        }

        #[test]
        fn run_mlfq_twice_is_rejected() {
            let mut state = SchedulerState::new();
            let idx = new_runnable(&mut state);
            state.run_mlfq(idx).unwrap();
            assert_eq!(state.run_mlfq(idx), Err(ProcessError::AlreadyMlfq));
        }

        #[test]
        fn a_share_process_cannot_join_the_mlfq_pool() {
            let mut state = SchedulerState::new();
            let idx = new_runnable(&mut state);
            state.cpu_share(idx, 10).unwrap();
            assert_eq!(state.run_mlfq(idx), Err(ProcessError::ShareIneligible));
        }

        #[test]
        fn getlev_of_a_non_mlfq_process_is_negative_one() {
            let mut state = SchedulerState::new();
            let idx = new_runnable(&mut state);
            assert_eq!(state.getlev(idx), -1);
        }

        #[test]
        fn cpu_share_rejects_a_reservation_that_would_exceed_the_cap() {
            let mut state = SchedulerState::new();
            let a = new_runnable(&mut state);
            let b = new_runnable(&mut state);
            state.cpu_share(a, 15).unwrap();
            assert_eq!(state.cpu_share(b, 10), Err(ProcessError::InvalidShare));
        }

        #[test]
        fn cpu_share_rejects_a_non_positive_percentage() {
            let mut state = SchedulerState::new();
            let idx = new_runnable(&mut state);
            assert_eq!(state.cpu_share(idx, 0), Err(ProcessError::InvalidShare));
        }
    }

    mod kill_and_wakeup {
        use super::*;

        #[test]
        fn kill_wakes_a_sleeper() {
            let mut state = SchedulerState::new();
            let idx = new_runnable(&mut state);
            let pid = state.process(idx).pid;
            state.process_mut(idx).state = ProcessState::Sleeping;
            state.kill(pid).unwrap();
            assert!(state.process(idx).killed);
            assert_eq!(state.process(idx).state, ProcessState::Runnable);
        }

        #[test]
        fn kill_of_an_unknown_pid_fails() {
            let mut state = SchedulerState::new();
            assert_eq!(state.kill(9999), Err(ProcessError::NoSuchProcess));
        }

        #[test]
        fn wakeup_only_affects_sleepers_on_the_matching_channel() {
            let mut state = SchedulerState::new();
            let a = new_runnable(&mut state);
            let b = new_runnable(&mut state);
            state.process_mut(a).state = ProcessState::Sleeping;
            state.process_mut(a).chan = Some(1);
            state.process_mut(b).state = ProcessState::Sleeping;
            state.process_mut(b).chan = Some(2);

            state.wakeup(1);

            assert_eq!(state.process(a).state, ProcessState::Runnable);
            assert_eq!(state.process(b).state, ProcessState::Sleeping);
        }
    }

    mod arbiter {
        use super::*;

        #[test]
        fn with_only_a_default_process_runnable_the_stride_pool_is_chosen() {
            let mut state = SchedulerState::new();
            let idx = new_runnable(&mut state);
            assert_eq!(state.choice(), Some(idx));
        }

        #[test]
        fn a_share_process_outranks_an_empty_default_and_mlfq_pool() {
            let mut state = SchedulerState::new();
            let idx = new_runnable(&mut state);
            state.cpu_share(idx, 10).unwrap();
            assert_eq!(state.choice(), Some(idx));
        }

        #[test]
        fn share_pass_advances_by_scale_over_share_on_every_dispatch() {
            let mut state = SchedulerState::new();
            let idx = new_runnable(&mut state);
            state.cpu_share(idx, 10).unwrap();
            state.choice();
            let SchedClass::Share { pass, .. } = state.process(idx).sched_class else {
                panic!("expected share class");
            };
            assert_eq!(pass, crate::param::STRIDE_SCALE / 10);
        }

        #[test]
        fn an_mlfq_process_is_chosen_over_an_idle_default_pool() {
            let mut state = SchedulerState::new();
            let idx = new_runnable(&mut state);
            state.run_mlfq(idx).unwrap();
            assert_eq!(state.choice(), Some(idx));
        }

        #[test]
        fn nothing_runnable_means_no_dispatch() {
            let mut state = SchedulerState::new();
            state.alloc_process().unwrap();
            assert_eq!(state.choice(), None);
        }
    }

    mod dispatch_loop {
        use super::*;

        #[test]
        #[serial]
        fn scheduler_step_marks_the_winner_running_and_records_it_on_the_cpu() {
            pin_to_cpu_zero();
            let mut state = SchedulerState::new();
            let idx = new_runnable(&mut state);
            let pid = state.scheduler_step();
            assert_eq!(pid, Some(state.process(idx).pid));
            assert_eq!(state.process(idx).state, ProcessState::Running);
        }

        #[test]
        #[serial]
        fn a_process_freed_between_steps_is_dropped_from_its_queue() {
            pin_to_cpu_zero();
            let mut state = SchedulerState::new();
            let idx = new_runnable(&mut state);
            state.scheduler_step();
            state.process_mut(idx).state = ProcessState::Unused;
            // The next step's bookkeeping reaps `idx` before choosing again;
            // with nothing else runnable this returns None rather than
            // re-dispatching the freed slot.
            assert_eq!(state.scheduler_step(), None);
        }

        #[test]
        #[serial]
        fn boosting_period_reaching_the_threshold_resets_mlfq_levels() {
            pin_to_cpu_zero();
            let mut state = SchedulerState::new();
            let idx = new_runnable(&mut state);
            state.run_mlfq(idx).unwrap();
            state.mlfq.boosting_period = crate::param::MLFQ_BOOST_PERIOD - 1;

            state.scheduler_step();
            // boosting_period was bumped to the threshold by this dispatch;
            // the *next* step's leading bookkeeping performs the boost.
            state.process_mut(idx).state = ProcessState::Runnable;
            state.scheduler_step();

            let SchedClass::Mlfq { level, .. } = state.process(idx).sched_class else {
                panic!("expected mlfq class");
            };
            assert_eq!(level, 1);
            assert_eq!(state.mlfq.boosting_period, 0);
        }
    }

    mod guard_operations {
        use super::*;

        #[test]
        #[serial]
        fn yield_marks_runnable_then_returns_through_sched() {
            pin_to_cpu_zero();
            let lock: Spinlock<SchedulerState> = Spinlock::new(SchedulerState::new());
            let mut guard = lock.lock();
            let idx = new_runnable(&mut guard);
            guard.process_mut(idx).state = ProcessState::Running;
            guard.yield_process(idx);
            assert_eq!(guard.process(idx).state, ProcessState::Runnable);
        }

        #[test]
        #[serial]
        fn sleep_records_the_channel_then_clears_it_on_return() {
            pin_to_cpu_zero();
            let lock: Spinlock<SchedulerState> = Spinlock::new(SchedulerState::new());
            let mut guard = lock.lock();
            let idx = new_runnable(&mut guard);
            guard.sleep(idx, 7);
            assert_eq!(guard.process(idx).chan, None);
            assert_eq!(guard.process(idx).state, ProcessState::Sleeping);
        }

        #[test]
        #[serial]
        #[should_panic(expected = "sched running")]
        fn sched_refuses_a_still_running_process() {
            pin_to_cpu_zero();
            let lock: Spinlock<SchedulerState> = Spinlock::new(SchedulerState::new());
            let mut guard = lock.lock();
            let idx = new_runnable(&mut guard);
            guard.process_mut(idx).state = ProcessState::Running;
            guard.sched(idx);
        }
    }
}
