//! `vgpu-base` contains the small ownership and bookkeeping primitives shared by the
//! host-side GPU layers.
//!
//! Currently this crate provides:
//! - Exactly-once release of external handles (see [`ManagedHandle`]).
//! - Coalescing of address-ordered elements into contiguous runs (see [`RangeCoalescer`]).
//! - A fixed-capacity least-recently-used cache (see [`LruCache`]).
//! - Reporting for internal contract violations (see [`fatal`] and [`gfx_abort!`]).
//!
//! None of these types are internally synchronized. Each is expected to be owned by a single
//! worker (the post queue, a resource manager); callers sharing one across threads provide
//! their own locking.

pub mod fatal;

mod handle;
mod lru_cache;
mod range;

#[cfg(unix)]
pub use handle::FdCloser;
pub use handle::{HandleCloser, ManagedHandle};
pub use lru_cache::{CacheStats, LruCache};
pub use range::{Range, RangeCoalescer};
