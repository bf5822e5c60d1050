//! Structured diagnostics for dispatch decisions, boosts, and lifecycle
//! transitions.
//!
//! Mirrors the lock-guarded `print!`/`println!` macros the reference console
//! driver builds around a single sink, generalized to a pluggable [`Sink`]
//! trait so the host test harness can install one that records lines
//! instead of writing to a UART. Sinks own their synchronization the way
//! the reference `PRINT_LOCK` wraps the console, since a `&dyn Sink` here is
//! shared, not exclusive.
use core::fmt;

pub trait Sink: Sync {
    fn write_line(&self, line: &str);
}

/// Default sink: discards everything. Installed until a platform or test
/// harness calls [`set_sink`].
struct NullSink;
impl Sink for NullSink {
    fn write_line(&self, _line: &str) {}
}

static DEFAULT_SINK: NullSink = NullSink;
static mut SINK: &'static dyn Sink = &DEFAULT_SINK;

/// Installs the process-wide diagnostic sink.
///
/// # Safety
/// Must not race with `log_line` on another CPU.
pub unsafe fn set_sink(sink: &'static dyn Sink) {
    SINK = sink;
}

fn sink() -> &'static dyn Sink {
    unsafe { SINK }
}

struct LineBuf {
    buf: [u8; 128],
    len: usize,
}
impl fmt::Write for LineBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buf.len() - self.len;
        let take = remaining.min(bytes.len());
        self.buf[self.len..self.len + take].copy_from_slice(&bytes[..take]);
        self.len += take;
        Ok(())
    }
}

/// Formats `args` and routes the line through the installed sink. Never
/// panics: invariant violations go through `panic!` directly, never here.
pub fn log_line(args: fmt::Arguments<'_>) {
    use fmt::Write;
    let mut line = LineBuf {
        buf: [0; 128],
        len: 0,
    };
    let _ = line.write_fmt(args);
    let text = core::str::from_utf8(&line.buf[..line.len]).unwrap_or("<non-utf8 log line>");
    sink().write_line(text);
}

macro_rules! log_dispatch {
    ($($arg:tt)*) => {
        $crate::diag::log_line(core::format_args!($($arg)*))
    };
}
pub(crate) use log_dispatch;

macro_rules! log_boost {
    ($($arg:tt)*) => {
        $crate::diag::log_line(core::format_args!($($arg)*))
    };
}
pub(crate) use log_boost;

macro_rules! log_lifecycle {
    ($($arg:tt)*) => {
        $crate::diag::log_line(core::format_args!($($arg)*))
    };
}
pub(crate) use log_lifecycle;
