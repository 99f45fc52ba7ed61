//! Reporting for internal contract violations.
//!
//! Everything reaching the host-side core has already been validated by the command decoder,
//! so a malformed value here (a compose request with no payload, a zero-sized viewport,
//! out-of-order coalescer input, a zero-capacity cache) is a bug upstream rather than a runtime
//! condition. These paths log at `error` and then panic.
//!
//! Recoverable conditions (unavailable context, unknown format, cache miss) never go through
//! this module.

use thiserror::Error;

/// Base code for reasons that do not originate from a driver result.
const ABORT_REASON_OTHER: i64 = -0x1_0000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbortReason {
    Other,
    /// A post/compose command is missing fields required by its kind.
    InvalidCommand,
    /// Input that must arrive in non-decreasing order did not.
    OutOfOrderInput,
    /// A fixed-capacity structure was configured with capacity 0.
    InvalidCapacity,
    /// A driver-level result code surfaced by a backend.
    Backend(i32),
}

impl AbortReason {
    /// Numeric code reported alongside the abort message.
    ///
    /// Driver results keep their own (small, signed) value; every other reason lives below
    /// `-2^32` so the two ranges never collide.
    pub fn code(self) -> i64 {
        match self {
            AbortReason::Backend(result) => i64::from(result),
            AbortReason::Other => ABORT_REASON_OTHER,
            AbortReason::InvalidCommand => ABORT_REASON_OTHER - 1,
            AbortReason::OutOfOrderInput => ABORT_REASON_OTHER - 2,
            AbortReason::InvalidCapacity => ABORT_REASON_OTHER - 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("fatal error (code {}, {:?})", .reason.code(), .reason)]
pub struct FatalError {
    pub reason: AbortReason,
}

impl FatalError {
    pub fn new(reason: AbortReason) -> Self {
        Self { reason }
    }

    pub fn abort_code(&self) -> i64 {
        self.reason.code()
    }
}

impl From<AbortReason> for FatalError {
    fn from(reason: AbortReason) -> Self {
        Self::new(reason)
    }
}

/// Logs `err` with its source location and panics. Use [`gfx_abort!`](crate::gfx_abort).
#[doc(hidden)]
#[cold]
#[track_caller]
pub fn abort(
    err: FatalError,
    file: &'static str,
    line: u32,
    module: &'static str,
    msg: std::fmt::Arguments<'_>,
) -> ! {
    tracing::error!(
        file,
        line,
        module,
        code = err.abort_code(),
        "FATAL: {msg}"
    );
    panic!("{err}: {msg}");
}

/// Abort on an internal contract violation.
///
/// ```should_panic
/// use vgpu_base::fatal::AbortReason;
///
/// vgpu_base::gfx_abort!(AbortReason::InvalidCommand, "viewport {}x{} is empty", 0, 0);
/// ```
#[macro_export]
macro_rules! gfx_abort {
    ($reason:expr, $($arg:tt)+) => {
        $crate::fatal::abort(
            $crate::fatal::FatalError::from($reason),
            file!(),
            line!(),
            module_path!(),
            format_args!($($arg)+),
        )
    };
}
