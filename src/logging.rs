//! Non-blocking logging for pot-tone.
//!
//! # Architecture
//!
//! ```text
//! Foreground             LogRing              Debugger / host
//! ──────────             ───────              ───────────────
//!
//! fw_info!() ─────────▶ [L0][L1][L2] ──────▶ get() / latest()
//! bounded time           fixed ring           after the fact
//! never blocks           in RAM
//! ```
//!
//! # Rules
//!
//! - The interrupt path never logs: compare-match latency must stay constant
//! - Only the foreground pushes
//! - A full ring overwrites its oldest entry, counting the loss
//! - Timestamps are foreground loop cycles; there is no wall clock

use core::cell::RefCell;
use core::sync::atomic::{AtomicU8, Ordering};

use critical_section::Mutex;

/// Maximum message length.
pub const MAX_MSG_LEN: usize = 32;

/// Log buffer size (number of entries).
pub const LOG_BUFFER_SIZE: usize = 16;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    /// Convert to string for output.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    /// Convert from raw u8 value, saturating at `Trace`.
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

/// A single log entry.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct LogEntry {
    /// Foreground loop cycle the message was logged in.
    pub timestamp: u32,
    /// Log level.
    pub level: LogLevel,
    /// Message length.
    pub len: u8,
    /// Message bytes (not null-terminated).
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    const EMPTY: LogEntry = LogEntry {
        timestamp: 0,
        level: LogLevel::Info,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// Message text, `"<invalid utf8>"` if truncation split a character.
    pub fn message(&self) -> &str {
        core::str::from_utf8(&self.msg[..self.len as usize]).unwrap_or("<invalid utf8>")
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Fixed-capacity ring of the most recent log entries.
///
/// Nothing on the target drains it: a debugger (or a host test) reads it
/// after the fact. When full, a push replaces the oldest entry, so the ring
/// always holds the latest history. Entries are copied in and out inside a
/// critical section, the only mutual exclusion an 8-bit core offers.
pub struct LogRing<const N: usize = LOG_BUFFER_SIZE> {
    state: Mutex<RefCell<RingState<N>>>,
    max_level: AtomicU8,
}

struct RingState<const N: usize> {
    entries: [LogEntry; N],
    /// Slot the next push writes.
    head: usize,
    len: usize,
    /// Entries replaced before anyone read them.
    overwritten: u32,
}

impl<const N: usize> LogRing<N> {
    /// Create a new empty ring passing `Info` and above.
    pub const fn new() -> Self {
        assert!(N > 0, "Log ring needs at least one slot");

        Self {
            state: Mutex::new(RefCell::new(RingState {
                entries: [LogEntry::EMPTY; N],
                head: 0,
                len: 0,
                overwritten: 0,
            })),
            max_level: AtomicU8::new(LogLevel::Info as u8),
        }
    }

    /// Most verbose level still recorded.
    #[inline]
    pub fn max_level(&self) -> LogLevel {
        LogLevel::from_u8(self.max_level.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set_max_level(&self, level: LogLevel) {
        self.max_level.store(level as u8, Ordering::Relaxed);
    }

    /// True if messages at `level` are recorded.
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= self.max_level()
    }

    /// Record an entry, replacing the oldest one if the ring is full.
    ///
    /// Returns `true` if an entry was overwritten. Longer messages are
    /// truncated to [`MAX_MSG_LEN`].
    pub fn push(&self, timestamp: u32, level: LogLevel, msg: &[u8]) -> bool {
        let len = msg.len().min(MAX_MSG_LEN);
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let head = state.head;

            let entry = &mut state.entries[head];
            entry.timestamp = timestamp;
            entry.level = level;
            entry.len = len as u8;
            entry.msg[..len].copy_from_slice(&msg[..len]);

            state.head = (head + 1) % N;
            if state.len == N {
                state.overwritten = state.overwritten.saturating_add(1);
                true
            } else {
                state.len += 1;
                false
            }
        })
    }

    /// Entry `index`, counting from the oldest one held.
    pub fn get(&self, index: usize) -> Option<LogEntry> {
        critical_section::with(|cs| {
            let state = self.state.borrow_ref(cs);
            if index >= state.len {
                return None;
            }
            let oldest = (state.head + N - state.len) % N;
            Some(state.entries[(oldest + index) % N])
        })
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<LogEntry> {
        critical_section::with(|cs| {
            let state = self.state.borrow_ref(cs);
            if state.len == 0 {
                return None;
            }
            Some(state.entries[(state.head + N - 1) % N])
        })
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.state.borrow_ref(cs).len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries lost to newer ones since the last [`clear`](Self::clear).
    pub fn overwritten(&self) -> u32 {
        critical_section::with(|cs| self.state.borrow_ref(cs).overwritten)
    }

    /// Forget every entry. The level filter is kept.
    pub fn clear(&self) {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            state.head = 0;
            state.len = 0;
            state.overwritten = 0;
        });
    }
}

impl<const N: usize> Default for LogRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Firmware log history, inspected by the debugger.
pub static LOG: LogRing = LogRing::new();

/// Format a message into a buffer.
///
/// Returns the number of bytes written. Output past the end is cut off.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    use core::fmt::Write;

    struct BufWriter<'a> {
        buf: &'a mut [u8],
        pos: usize,
    }

    impl<'a> Write for BufWriter<'a> {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            let bytes = s.as_bytes();
            let remaining = self.buf.len() - self.pos;
            let to_write = bytes.len().min(remaining);
            self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
            self.pos += to_write;
            Ok(())
        }
    }

    let mut writer = BufWriter { buf, pos: 0 };
    let _ = core::fmt::write(&mut writer, args);
    writer.pos
}

/// Foreground log macro.
///
/// Formats only when the level passes the stream's filter.
///
/// # Example
///
/// ```ignore
/// fw_log!(LogLevel::Info, LOG, cycle, "period {}", period);
/// ```
#[macro_export]
macro_rules! fw_log {
    ($level:expr, $stream:expr, $timestamp:expr, $($arg:tt)*) => {{
        let level = $level;
        if $stream.enabled(level) {
            let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
            let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
            $stream.push($timestamp, level, &buf[..len]);
        }
    }};
}

/// Info log.
#[macro_export]
macro_rules! fw_info {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::fw_log!($crate::logging::LogLevel::Info, $stream, $timestamp, $($arg)*)
    };
}

/// Error log.
#[macro_export]
macro_rules! fw_error {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::fw_log!($crate::logging::LogLevel::Error, $stream, $timestamp, $($arg)*)
    };
}

/// Debug log.
#[macro_export]
macro_rules! fw_debug {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::fw_log!($crate::logging::LogLevel::Debug, $stream, $timestamp, $($arg)*)
    };
}
