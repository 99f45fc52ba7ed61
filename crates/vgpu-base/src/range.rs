use crate::fatal::AbortReason;
use crate::gfx_abort;

/// A maximal run of address-contiguous bytes produced by [`RangeCoalescer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: u64,
    pub size: u64,
}

impl Range {
    pub fn new(start: u64, size: u64) -> Self {
        Self { start, size }
    }

    /// One past the last byte of the range.
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.size)
    }
}

/// Merges a stream of address-ordered elements into contiguous runs.
///
/// Each call to [`add`](Self::add) either extends the open run in place (when the element
/// starts exactly where the run ends) or finalizes the open run through the callback and
/// starts a new one. With a batch size configured, a run is also finalized as soon as it
/// reaches that many bytes, so one contiguous region may be reported as several adjacent
/// ranges.
///
/// Element start addresses must be non-decreasing between two calls to
/// [`finish`](RangeCoalescer::finish). Each finish starts a new batch.
pub struct RangeCoalescer<F: FnMut(Range)> {
    on_range: F,
    batch_size: u64,
    open: Option<Range>,
    last_start: Option<u64>,
}

impl<F: FnMut(Range)> RangeCoalescer<F> {
    pub fn new(on_range: F) -> Self {
        Self::with_batch_size(on_range, 0)
    }

    /// `batch_size == 0` disables batching.
    pub fn with_batch_size(on_range: F, batch_size: u64) -> Self {
        Self {
            on_range,
            batch_size,
            open: None,
            last_start: None,
        }
    }

    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    /// The run that the next [`finish`](Self::finish) would emit.
    pub fn pending(&self) -> Option<Range> {
        self.open
    }

    pub fn add(&mut self, start: u64, size: u64) {
        if let Some(last) = self.last_start {
            if start < last {
                gfx_abort!(
                    AbortReason::OutOfOrderInput,
                    "range coalescer input went backwards: 0x{start:x} after 0x{last:x}"
                );
            }
        }
        self.last_start = Some(start);

        match self.open {
            Some(ref mut open) if open.end() == start => {
                open.size = open.size.saturating_add(size);
            }
            _ => {
                self.emit_open();
                self.open = Some(Range::new(start, size));
            }
        }

        if self.batch_size != 0 && self.open.is_some_and(|open| open.size >= self.batch_size) {
            self.emit_open();
        }
    }

    /// Emits the open run, if any, and ends the batch. The coalescer stays usable afterwards
    /// and the next element may start at any address.
    pub fn finish(&mut self) {
        self.emit_open();
        self.last_start = None;
    }

    fn emit_open(&mut self) {
        if let Some(open) = self.open.take() {
            (self.on_range)(open);
        }
    }
}
