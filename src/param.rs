/// Maximum number of processes
pub const NPROC: usize = 64;
/// Maximum number of CPUs
pub const NCPU: usize = 8;
/// Maximum number of open files per process
///
/// Kept for PCB layout fidelity; file-descriptor duplication itself lives
/// outside this crate.
pub const NOFILE: usize = 16;

/// MLFQ time quantum per level, in ticks. Index 0 is the highest priority.
pub const MLFQ_TIME_QUANTUM: [u32; 3] = [1, 2, 4];
/// MLFQ time allotment per level, in ticks. Level 3 (index 2) has none:
/// once demoted there a process stays until the next boost.
pub const MLFQ_TIME_ALLOT: [u32; 2] = [5, 10];
/// Number of scheduling decisions between priority boosts.
pub const MLFQ_BOOST_PERIOD: u32 = 100;

/// Maximum total share percentage reserved across all SHARE processes.
pub const STRIDE_SHARE_CAP: u8 = 20;
/// Fixed-point scale shared by `Pass`/`Stride` (mirrors the reference's
/// "times 1000" unit).
pub const STRIDE_SCALE: i64 = 1000;
/// Initial stride value before the first recomputation.
pub const STRIDE_INITIAL: i64 = 100;
