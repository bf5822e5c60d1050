//! The multi-level feedback queue engine: three priority levels, quantum
//! rotation, allotment-based demotion, and periodic boosting.
use super::list::{ListArena, ListId, Queue};
use super::process::{Process, ProcessState, SchedClass};
use crate::param::{MLFQ_BOOST_PERIOD, MLFQ_TIME_ALLOT, MLFQ_TIME_QUANTUM};

/// State shared by the three MLFQ levels.
pub struct MlfqEngine {
    /// Coarse pass counter, advanced by every MLFQ dispatch regardless of
    /// level, used only by the arbiter's ordering.
    pub pass: i64,
    pub boosting_period: u32,
    levels: [Queue; 3],
}
impl MlfqEngine {
    pub const fn new() -> MlfqEngine {
        MlfqEngine {
            pass: 0,
            boosting_period: 0,
            levels: [Queue::new(), Queue::new(), Queue::new()],
        }
    }

    pub fn queue(&self, level: usize) -> &Queue {
        &self.levels[level]
    }

    pub fn total_num(&self) -> usize {
        self.levels.iter().map(Queue::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_num() == 0
    }

    /// Admits `proc_index` to level 0 (highest priority), as `run_MLFQ` does.
    pub fn admit(&mut self, arena: &mut ListArena, proc_index: usize) {
        arena.push(&mut self.levels[0], proc_index);
    }

    /// Removes `proc_index` from whichever level it currently occupies.
    pub fn remove(&mut self, arena: &mut ListArena, level: usize, proc_index: usize) {
        arena.pop(&mut self.levels[level], proc_index);
    }

    /// Selects the next MLFQ process to run, applying quantum rotation and
    /// allotment demotion to the chosen process. Mirrors the reference
    /// `mlfq_start`'s priority-then-fallthrough search, reshaped into a
    /// structured loop instead of `goto`.
    pub fn start(&mut self, processes: &mut [Process], arena: &mut ListArena) -> Option<usize> {
        let mut cur_level = 0usize;
        let candidate = loop {
            if cur_level >= self.levels.len() {
                return None;
            }
            if self.levels[cur_level].is_empty() {
                cur_level += 1;
                continue;
            }
            let found = arena
                .iter(&self.levels[cur_level])
                .find(|&idx| processes[idx].state == ProcessState::Runnable);
            match found {
                Some(idx) => break idx,
                None => {
                    cur_level += 1;
                    continue;
                }
            }
        };

        let p = &mut processes[candidate];
        let SchedClass::Mlfq { level, exec_count } = &mut p.sched_class else {
            unreachable!("mlfq queue held a non-mlfq process");
        };
        debug_assert_eq!(*level as usize, cur_level + 1);

        *exec_count += 1;
        self.pass += 50;
        self.boosting_period += 1;

        if cur_level <= 1 && *exec_count % MLFQ_TIME_ALLOT[cur_level] == 0 {
            let new_level = cur_level + 1;
            arena.pop(&mut self.levels[cur_level], candidate);
            arena.push(&mut self.levels[new_level], candidate);
            let p = &mut processes[candidate];
            let SchedClass::Mlfq { level, exec_count } = &mut p.sched_class else {
                unreachable!()
            };
            *exec_count = 0;
            *level = (new_level + 1) as u8;
            return Some(candidate);
        }

        if *exec_count % MLFQ_TIME_QUANTUM[cur_level] == 0 {
            arena.pop(&mut self.levels[cur_level], candidate);
            arena.push(&mut self.levels[cur_level], candidate);
            if cur_level == 2 {
                let p = &mut processes[candidate];
                let SchedClass::Mlfq { exec_count, .. } = &mut p.sched_class else {
                    unreachable!()
                };
                *exec_count -= MLFQ_TIME_QUANTUM[2];
            }
        }

        Some(candidate)
    }

    /// Moves every process in levels 2 and 3 back to level 1, and clears the
    /// exec_count of every process already at level 1. Invoked by the
    /// dispatcher once `boosting_period` reaches 100.
    pub fn boost(&mut self, processes: &mut [Process], arena: &mut ListArena) {
        for idx in arena.iter(&self.levels[0]) {
            if let SchedClass::Mlfq { exec_count, .. } = &mut processes[idx].sched_class {
                *exec_count = 0;
            }
        }

        for level in [2usize, 1usize] {
            while !self.levels[level].is_empty() {
                let idx = arena
                    .iter(&self.levels[level])
                    .next()
                    .expect("just checked non-empty");
                arena.pop(&mut self.levels[level], idx);
                arena.push(&mut self.levels[0], idx);
                if let SchedClass::Mlfq { level, exec_count } = &mut processes[idx].sched_class {
                    *level = 1;
                    *exec_count = 0;
                }
            }
        }

        self.boosting_period = 0;
    }

    pub fn list_id(level: usize) -> ListId {
        ListId::Mlfq(level)
    }
}
impl Default for MlfqEngine {
    fn default() -> MlfqEngine {
        MlfqEngine::new()
    }
}
