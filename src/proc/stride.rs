//! The stride-scheduling engine: a default round-robin pool plus a
//! reserved-percentage SHARE pool, both ordered by a fixed-point `pass`.
use super::list::{ListArena, Queue};
use super::process::{Process, ProcessState, SchedClass};
use crate::param::STRIDE_SCALE;

/// State for the default (unreserved) stride pool. SHARE processes are not
/// tracked by a list here: the arbiter locates the minimum-pass SHARE
/// process directly by scanning the process table (see `proc::scheduler`).
pub struct StrideEngine {
    list: Queue,
    pub pass: i64,
    pub stride: i64,
    /// Flips every time a full round of the default list completes.
    pub switch_num: u8,
}
impl StrideEngine {
    pub const fn new(initial_stride: i64) -> StrideEngine {
        StrideEngine {
            list: Queue::new(),
            pass: 0,
            stride: initial_stride,
            switch_num: 0,
        }
    }

    pub fn queue(&self) -> &Queue {
        &self.list
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn push(&mut self, arena: &mut ListArena, proc_index: usize) {
        arena.push(&mut self.list, proc_index);
    }
    pub fn remove(&mut self, arena: &mut ListArena, proc_index: usize) {
        arena.pop(&mut self.list, proc_index);
    }

    /// Recomputes the default pool's stride from the current share
    /// reservation and MLFQ occupancy, mirroring `return_stride`. Returns 0
    /// (stride never advances the pass) when there is no DEFAULT process to
    /// schedule.
    pub fn recompute_stride(processes: &[Process], mlfq_nonempty: bool) -> i64 {
        let mut share_percent: i64 = 0;
        let mut default_count: i64 = 0;
        for p in processes {
            if p.state != ProcessState::Runnable {
                continue;
            }
            match p.sched_class {
                SchedClass::Share { share, .. } => share_percent += share as i64,
                SchedClass::Default { .. } => default_count += 1,
                SchedClass::Mlfq { .. } => {}
            }
        }
        if default_count == 0 {
            return 0;
        }
        let denom = (100 - share_percent) - if mlfq_nonempty { 20 } else { 0 };
        STRIDE_SCALE / (denom / default_count)
    }

    /// Selects the next default-pool process to run, advancing the round and
    /// recomputing `stride` whenever a full pass over the list finds no
    /// runnable candidate that hasn't already run this round. Mirrors the
    /// reference `stride_start`'s `again`/`runnable`/`flp` labels as a
    /// structured retry loop.
    pub fn start(
        &mut self,
        processes: &mut [Process],
        arena: &ListArena,
        mlfq_nonempty: bool,
    ) -> Option<usize> {
        loop {
            let candidate = arena.iter(&self.list).find(|&idx| {
                let p = &processes[idx];
                let SchedClass::Default { swtch } = p.sched_class else {
                    return false;
                };
                swtch == self.switch_num && p.state == ProcessState::Runnable
            });

            match candidate {
                Some(idx) => {
                    if let SchedClass::Default { swtch } = &mut processes[idx].sched_class {
                        *swtch = 1 - self.switch_num;
                    }
                    return Some(idx);
                }
                None => {
                    self.switch_num = 1 - self.switch_num;
                    self.pass += self.stride;
                    self.stride = Self::recompute_stride(processes, mlfq_nonempty);
                    if self.list.is_empty() {
                        return None;
                    }
                }
            }
        }
    }
}
