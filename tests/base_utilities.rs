use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use vgpu_host::base::fatal::{AbortReason, FatalError};
use vgpu_host::base::{HandleCloser, LruCache, ManagedHandle, Range, RangeCoalescer};

#[derive(Clone, Default)]
struct CloseLog(Rc<RefCell<Vec<u64>>>);

impl HandleCloser for CloseLog {
    type Handle = u64;

    fn close(&self, handle: u64) {
        self.0.borrow_mut().push(handle);
    }
}

#[test]
fn handles_in_a_cache_are_closed_on_eviction() {
    let log = CloseLog::default();
    let mut cache = LruCache::new(2);
    for id in 1..=3u64 {
        if let Some((_, evicted)) = cache.set(id, ManagedHandle::new(id * 10, log.clone())) {
            drop(evicted);
        }
    }
    assert_eq!(*log.0.borrow(), vec![10]);

    cache.remove(&2);
    assert_eq!(*log.0.borrow(), vec![10, 20]);
    assert_eq!(cache.remove(&2).map(|h| h.get()), None);

    drop(cache);
    assert_eq!(*log.0.borrow(), vec![10, 20, 30]);
}

#[test]
fn released_handles_survive_the_wrapper() {
    let log = CloseLog::default();
    let mut handle = ManagedHandle::new(5, log.clone());
    assert_eq!(handle.release(), Some(5));
    assert_eq!(handle.release(), None);
    assert_eq!(handle.get(), None);
    drop(handle);
    assert!(log.0.borrow().is_empty());
}

#[test]
fn coalescer_finish_is_idempotent() {
    let mut ranges = Vec::new();
    let mut coalescer = RangeCoalescer::new(|range| ranges.push(range));
    coalescer.finish();
    coalescer.add(0, 4);
    coalescer.finish();
    coalescer.finish();
    drop(coalescer);
    assert_eq!(ranges, vec![Range::new(0, 4)]);
}

#[test]
fn abort_codes_stay_below_driver_results() {
    assert_eq!(FatalError::new(AbortReason::Other).abort_code(), -0x1_0000_0000);
    assert_eq!(FatalError::new(AbortReason::Backend(-4)).abort_code(), -4);
    assert!(FatalError::new(AbortReason::InvalidCapacity).abort_code() < -0x1_0000_0000);
}
