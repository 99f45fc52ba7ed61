use vgpu_base::{Range, RangeCoalescer};

use crate::config::HostConfig;

/// Receives each contiguous guest range that should be mapped into host memory.
pub trait HostMemoryMapper {
    fn map_range(&mut self, range: Range);
}

impl<F: FnMut(Range)> HostMemoryMapper for F {
    fn map_range(&mut self, range: Range) {
        self(range)
    }
}

/// Turns address-sorted guest pages into as few mapping calls as possible.
///
/// Adjacent pages are merged; with a nonzero batch size, a merged run is split once it reaches
/// that many bytes.
pub struct HostMappingBatcher<M: HostMemoryMapper> {
    mapper: M,
    batch_bytes: u64,
}

impl<M: HostMemoryMapper> HostMappingBatcher<M> {
    pub fn new(mapper: M, batch_bytes: u64) -> Self {
        Self {
            mapper,
            batch_bytes,
        }
    }

    pub fn from_config(mapper: M, config: &HostConfig) -> Self {
        Self::new(mapper, config.mapping_batch_bytes)
    }

    /// Maps `page_size`-byte pages starting at each of `pages` (non-decreasing). Returns the
    /// number of ranges handed to the mapper.
    pub fn map_pages(&mut self, pages: impl IntoIterator<Item = u64>, page_size: u64) -> usize {
        self.map_elements(pages.into_iter().map(|page| (page, page_size)))
    }

    /// Maps `(start, size)` elements sorted by start. Returns the number of ranges handed to
    /// the mapper.
    pub fn map_elements(&mut self, elements: impl IntoIterator<Item = (u64, u64)>) -> usize {
        let mapper = &mut self.mapper;
        let mut emitted = 0;
        let mut coalescer = RangeCoalescer::with_batch_size(
            |range| {
                emitted += 1;
                mapper.map_range(range);
            },
            self.batch_bytes,
        );
        for (start, size) in elements {
            coalescer.add(start, size);
        }
        coalescer.finish();
        drop(coalescer);

        tracing::trace!(ranges = emitted, "host mapping batch flushed");
        emitted
    }

    pub fn batch_bytes(&self) -> u64 {
        self.batch_bytes
    }

    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    pub fn into_mapper(self) -> M {
        self.mapper
    }
}
