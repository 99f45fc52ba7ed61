//! Pixel formats and the staging-buffer geometry used to move images between guest memory and
//! host GPU images.
//!
//! [`FormatRegistry`] maps each [`Format`] to its plane layout. Multi-planar YUV formats carry
//! hand-specified layouts; every linear format is a single color plane.
//! [`FormatRegistry::transfer_info`] turns a layout plus image extent into the copy size and the
//! per-plane copy regions a buffer <-> image transfer needs.

mod error;
mod format;
mod layout;
mod transfer;

pub use error::FormatError;
pub use format::Format;
pub use layout::{FormatPlaneLayouts, FormatRegistry, ImageAspect, PlaneLayout};
pub use transfer::{BufferImageCopy, Extent3d, ImageSubresourceLayers, Offset3d, TransferInfo};
