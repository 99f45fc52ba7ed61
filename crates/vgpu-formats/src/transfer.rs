//! Staging-buffer geometry for image uploads and readbacks.
//!
//! Planes are packed back to back in the staging buffer with no padding between them. For a
//! `width` x `height` image:
//!
//! - the width is first rounded up to the format's horizontal alignment (the height never is);
//! - each plane is `aligned_width / h_sub` samples wide and `height / v_sub` rows tall;
//! - a plane's row stride is its width times its sample increment;
//! - a plane starts where the previous one ended.

use crate::error::FormatError;
use crate::format::Format;
use crate::layout::{FormatPlaneLayouts, FormatRegistry, ImageAspect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Offset3d {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent3d {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSubresourceLayers {
    pub aspect: ImageAspect,
    pub mip_level: u32,
    pub base_array_layer: u32,
    pub layer_count: u32,
}

/// One buffer <-> image copy, laid out like `VkBufferImageCopy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferImageCopy {
    pub buffer_offset: u64,
    /// Row length in samples of the plane (not bytes).
    pub buffer_row_length: u32,
    /// 0 means "tightly packed rows", which is always the case here.
    pub buffer_image_height: u32,
    pub image_subresource: ImageSubresourceLayers,
    pub image_offset: Offset3d,
    pub image_extent: Extent3d,
}

/// Result of [`FormatRegistry::transfer_info`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferInfo {
    /// Total packed size of all planes.
    pub copy_size: u64,
    /// One copy region per plane, in plane order.
    pub copies: Vec<BufferImageCopy>,
}

impl TransferInfo {
    /// Byte size of the plane described by `copies[plane]`.
    pub fn plane_size(&self, plane: usize) -> Option<u64> {
        let start = self.copies.get(plane)?.buffer_offset;
        let end = self
            .copies
            .get(plane + 1)
            .map_or(self.copy_size, |next| next.buffer_offset);
        Some(end - start)
    }
}

fn align_to_power_of_two(value: u64, alignment: u64) -> u64 {
    debug_assert!(alignment.is_power_of_two());
    (value + (alignment - 1)) & !(alignment - 1)
}

fn compute_transfer_info(
    format: Format,
    layouts: &FormatPlaneLayouts,
    width: u32,
    height: u32,
) -> Result<TransferInfo, FormatError> {
    let too_large = || FormatError::ExtentTooLarge {
        format,
        width,
        height,
    };

    let aligned_width = align_to_power_of_two(
        u64::from(width),
        u64::from(layouts.horizontal_alignment_pixels()),
    );
    let aligned_height = u64::from(height);

    let mut offset = 0u64;
    let mut copies = Vec::with_capacity(layouts.planes().len());
    for plane in layouts.planes() {
        let plane_width = aligned_width / u64::from(plane.horizontal_subsampling);
        let plane_height = aligned_height / u64::from(plane.vertical_subsampling);
        let stride_bytes = plane_width * u64::from(plane.sample_increment_bytes);
        let plane_size = stride_bytes.checked_mul(plane_height).ok_or_else(too_large)?;

        copies.push(BufferImageCopy {
            buffer_offset: offset,
            buffer_row_length: u32::try_from(plane_width).map_err(|_| too_large())?,
            buffer_image_height: 0,
            image_subresource: ImageSubresourceLayers {
                aspect: plane.aspect,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            },
            image_offset: Offset3d::default(),
            image_extent: Extent3d {
                width: u32::try_from(plane_width).map_err(|_| too_large())?,
                height: u32::try_from(plane_height).map_err(|_| too_large())?,
                depth: 1,
            },
        });

        offset = offset.checked_add(plane_size).ok_or_else(too_large)?;
    }

    Ok(TransferInfo {
        copy_size: offset,
        copies,
    })
}

impl FormatRegistry {
    /// Computes the staging copy size and per-plane copy regions for a `width` x `height`
    /// image of `format`.
    pub fn transfer_info(
        &self,
        format: Format,
        width: u32,
        height: u32,
    ) -> Result<TransferInfo, FormatError> {
        let Some(layouts) = self.plane_layouts(format) else {
            tracing::warn!(?format, "unhandled format");
            return Err(FormatError::Unsupported(format));
        };
        compute_transfer_info(format, layouts, width, height)
    }

    /// Like [`transfer_info`](Self::transfer_info) but keyed by the wire value.
    pub fn transfer_info_raw(
        &self,
        raw_format: u32,
        width: u32,
        height: u32,
    ) -> Result<TransferInfo, FormatError> {
        let Some(format) = Format::from_raw(raw_format) else {
            tracing::warn!(raw_format, "unhandled format");
            return Err(FormatError::UnknownRaw(raw_format));
        };
        self.transfer_info(format, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn copy(offset: u64, row_length: u32, aspect: ImageAspect, w: u32, h: u32) -> BufferImageCopy {
        BufferImageCopy {
            buffer_offset: offset,
            buffer_row_length: row_length,
            buffer_image_height: 0,
            image_subresource: ImageSubresourceLayers {
                aspect,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            },
            image_offset: Offset3d { x: 0, y: 0, z: 0 },
            image_extent: Extent3d {
                width: w,
                height: h,
                depth: 1,
            },
        }
    }

    #[test]
    fn invalid_format_is_reported() {
        let registry = FormatRegistry::new();
        assert_eq!(
            registry.transfer_info(Format::Undefined, 16, 16),
            Err(FormatError::Unsupported(Format::Undefined))
        );
        assert_eq!(
            registry.transfer_info_raw(1, 16, 16),
            Err(FormatError::UnknownRaw(1))
        );
    }

    #[test]
    fn rgba() {
        let info = FormatRegistry::new()
            .transfer_info(Format::R8G8B8A8Unorm, 16, 16)
            .unwrap();
        assert_eq!(info.copy_size, 1024);
        assert_eq!(info.copies, vec![copy(0, 16, ImageAspect::COLOR, 16, 16)]);
    }

    #[test]
    fn nv12_or_nv21() {
        let info = FormatRegistry::new()
            .transfer_info(Format::G8B8R8TwoPlane420Unorm, 16, 16)
            .unwrap();
        assert_eq!(info.copy_size, 384);
        assert_eq!(
            info.copies,
            vec![
                copy(0, 16, ImageAspect::PLANE_0, 16, 16),
                copy(256, 8, ImageAspect::PLANE_1, 8, 8),
            ]
        );
    }

    #[test]
    fn yv12_or_yv21() {
        let info = FormatRegistry::new()
            .transfer_info(Format::G8B8R8ThreePlane420Unorm, 32, 32)
            .unwrap();
        assert_eq!(info.copy_size, 1536);
        assert_eq!(
            info.copies,
            vec![
                copy(0, 32, ImageAspect::PLANE_0, 32, 32),
                copy(1024, 16, ImageAspect::PLANE_1, 16, 16),
                copy(1280, 16, ImageAspect::PLANE_2, 16, 16),
            ]
        );
    }

    #[test]
    fn p010_uses_two_byte_luma_samples() {
        let info = FormatRegistry::new()
            .transfer_info_raw(1_000_156_013, 4, 2)
            .unwrap();
        // Luma: 4 samples * 2 bytes * 2 rows; chroma: 2 samples * 4 bytes * 1 row.
        assert_eq!(info.copy_size, 16 + 8);
        assert_eq!(
            info.copies,
            vec![
                copy(0, 4, ImageAspect::PLANE_0, 4, 2),
                copy(16, 2, ImageAspect::PLANE_1, 2, 1),
            ]
        );
    }

    #[test]
    fn width_is_aligned_but_height_is_not() {
        let info = FormatRegistry::new()
            .transfer_info(Format::G8B8R8ThreePlane420Unorm, 33, 10)
            .unwrap();
        // 33 rounds up to 64; chroma planes are 32 wide and 5 tall.
        assert_eq!(
            info.copies,
            vec![
                copy(0, 64, ImageAspect::PLANE_0, 64, 10),
                copy(640, 32, ImageAspect::PLANE_1, 32, 5),
                copy(800, 32, ImageAspect::PLANE_2, 32, 5),
            ]
        );
        assert_eq!(info.copy_size, 960);
        assert_eq!(info.plane_size(0), Some(640));
        assert_eq!(info.plane_size(2), Some(160));
        assert_eq!(info.plane_size(3), None);
    }

    #[test]
    fn zero_sized_image_has_empty_planes() {
        let info = FormatRegistry::new()
            .transfer_info(Format::G8B8R8TwoPlane420Unorm, 0, 0)
            .unwrap();
        assert_eq!(info.copy_size, 0);
        assert_eq!(info.copies.len(), 2);
    }

    #[test]
    fn oversized_extent_is_reported() {
        let registry = FormatRegistry::new();
        assert_eq!(
            registry.transfer_info(Format::G8B8R8TwoPlane420Unorm, u32::MAX, 1),
            Err(FormatError::ExtentTooLarge {
                format: Format::G8B8R8TwoPlane420Unorm,
                width: u32::MAX,
                height: 1,
            })
        );
    }

    #[test]
    fn plane_sizes_sum_to_copy_size_for_every_format() {
        let registry = FormatRegistry::new();
        let extents = [(1, 1), (2, 2), (15, 7), (16, 16), (33, 10), (640, 480), (1921, 1080)];
        for format in registry.formats() {
            let layouts = registry.plane_layouts(format).unwrap();
            for &(width, height) in &extents {
                let info = registry.transfer_info(format, width, height).unwrap();
                assert_eq!(info.copies.len(), layouts.planes().len());

                let mut expected_offset = 0u64;
                for (copy, plane) in info.copies.iter().zip(layouts.planes()) {
                    assert_eq!(copy.buffer_offset, expected_offset, "{format:?} {width}x{height}");
                    let size = u64::from(copy.buffer_row_length)
                        * u64::from(plane.sample_increment_bytes)
                        * u64::from(copy.image_extent.height);
                    expected_offset += size;
                }
                assert_eq!(info.copy_size, expected_offset, "{format:?} {width}x{height}");

                let summed: u64 = (0..info.copies.len())
                    .map(|plane| info.plane_size(plane).unwrap())
                    .sum();
                assert_eq!(summed, info.copy_size);
            }
        }
    }
}
