use std::sync::Arc;

use vgpu_base::{CacheStats, LruCache};
use vgpu_formats::{Format, FormatError, FormatRegistry, TransferInfo};

use crate::config::HostConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct StagingKey {
    format: Format,
    width: u32,
    height: u32,
}

/// Memoizes staging-copy geometry per `(format, width, height)`.
///
/// Image transfers for the same surface repeat every frame; the layout only needs computing
/// once. Lookup failures are not cached.
pub struct StagingLayoutCache {
    registry: Arc<FormatRegistry>,
    layouts: LruCache<StagingKey, Arc<TransferInfo>>,
}

impl StagingLayoutCache {
    pub fn new(registry: Arc<FormatRegistry>, capacity: usize) -> Self {
        Self {
            registry,
            layouts: LruCache::new(capacity),
        }
    }

    pub fn from_config(registry: Arc<FormatRegistry>, config: &HostConfig) -> Self {
        Self::new(registry, config.staging_cache_capacity)
    }

    pub fn transfer_info(
        &mut self,
        format: Format,
        width: u32,
        height: u32,
    ) -> Result<Arc<TransferInfo>, FormatError> {
        let key = StagingKey {
            format,
            width,
            height,
        };
        if let Some(info) = self.layouts.get(&key) {
            return Ok(Arc::clone(info));
        }

        let info = Arc::new(self.registry.transfer_info(format, width, height)?);
        self.layouts.set(key, Arc::clone(&info));
        Ok(info)
    }

    /// Like [`transfer_info`](Self::transfer_info) keyed by the wire value.
    pub fn transfer_info_raw(
        &mut self,
        raw_format: u32,
        width: u32,
        height: u32,
    ) -> Result<Arc<TransferInfo>, FormatError> {
        let Some(format) = Format::from_raw(raw_format) else {
            tracing::warn!(raw_format, "unhandled format");
            return Err(FormatError::UnknownRaw(raw_format));
        };
        self.transfer_info(format, width, height)
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.layouts.stats()
    }

    pub fn clear(&mut self) {
        self.layouts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn repeated_lookups_hit_the_cache() {
        let mut cache = StagingLayoutCache::new(Arc::new(FormatRegistry::new()), 2);
        let first = cache
            .transfer_info(Format::G8B8R8TwoPlane420Unorm, 16, 16)
            .unwrap();
        let second = cache
            .transfer_info(Format::G8B8R8TwoPlane420Unorm, 16, 16)
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.copy_size, 384);
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                evictions: 0,
            }
        );
    }

    #[test]
    fn least_recent_extent_is_evicted() {
        let mut cache = StagingLayoutCache::new(Arc::new(FormatRegistry::new()), 2);
        for (w, h) in [(1, 1), (2, 2), (1, 1), (3, 3)] {
            cache.transfer_info(Format::R8G8B8A8Unorm, w, h).unwrap();
        }
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 1);

        // (2, 2) was evicted, so this is a miss.
        let misses = cache.stats().misses;
        cache.transfer_info(Format::R8G8B8A8Unorm, 2, 2).unwrap();
        assert_eq!(cache.stats().misses, misses + 1);
    }

    #[test]
    fn errors_are_not_cached() {
        let config = HostConfig::default();
        let mut cache = StagingLayoutCache::from_config(Arc::new(FormatRegistry::empty()), &config);
        assert_eq!(
            cache.transfer_info(Format::R8Unorm, 4, 4),
            Err(FormatError::Unsupported(Format::R8Unorm))
        );
        assert_eq!(
            cache.transfer_info_raw(12345, 4, 4),
            Err(FormatError::UnknownRaw(12345))
        );
        assert!(cache.is_empty());
        assert!(cache.registry().is_empty());
    }
}
