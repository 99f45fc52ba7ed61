use std::collections::HashMap;

use bitflags::bitflags;
use vgpu_base::fatal::AbortReason;
use vgpu_base::gfx_abort;

use crate::format::{Format, LINEAR_FORMATS};

bitflags! {
    /// Image aspect selector carried by a copy region (Vulkan `VkImageAspectFlags` values).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageAspect: u32 {
        const COLOR = 0x0000_0001;
        const DEPTH = 0x0000_0002;
        const STENCIL = 0x0000_0004;
        const PLANE_0 = 0x0000_0010;
        const PLANE_1 = 0x0000_0020;
        const PLANE_2 = 0x0000_0040;
    }
}

/// Sampling geometry of one plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneLayout {
    pub horizontal_subsampling: u32,
    pub vertical_subsampling: u32,
    /// Bytes between horizontally adjacent samples of this plane.
    pub sample_increment_bytes: u32,
    pub aspect: ImageAspect,
}

impl PlaneLayout {
    pub const fn new(
        horizontal_subsampling: u32,
        vertical_subsampling: u32,
        sample_increment_bytes: u32,
        aspect: ImageAspect,
    ) -> Self {
        Self {
            horizontal_subsampling,
            vertical_subsampling,
            sample_increment_bytes,
            aspect,
        }
    }
}

/// Plane layout of a whole format, in the order copy regions are emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatPlaneLayouts {
    horizontal_alignment_pixels: u32,
    planes: Vec<PlaneLayout>,
}

impl FormatPlaneLayouts {
    /// `horizontal_alignment_pixels` must be a power of two, every subsampling factor must be
    /// at least 1, and there must be at least one plane.
    pub fn new(horizontal_alignment_pixels: u32, planes: Vec<PlaneLayout>) -> Self {
        if !horizontal_alignment_pixels.is_power_of_two() {
            gfx_abort!(
                AbortReason::Other,
                "horizontal alignment {horizontal_alignment_pixels} is not a power of two"
            );
        }
        if planes.is_empty() {
            gfx_abort!(AbortReason::Other, "format layout has no planes");
        }
        for plane in &planes {
            if plane.horizontal_subsampling == 0 || plane.vertical_subsampling == 0 {
                gfx_abort!(AbortReason::Other, "plane subsampling must be >= 1: {plane:?}");
            }
        }
        Self {
            horizontal_alignment_pixels,
            planes,
        }
    }

    /// A one-plane, unaligned color layout.
    pub fn single_plane(bytes_per_pixel: u32) -> Self {
        Self::new(
            1,
            vec![PlaneLayout::new(1, 1, bytes_per_pixel, ImageAspect::COLOR)],
        )
    }

    pub fn horizontal_alignment_pixels(&self) -> u32 {
        self.horizontal_alignment_pixels
    }

    pub fn planes(&self) -> &[PlaneLayout] {
        &self.planes
    }
}

/// Immutable table of plane layouts, built once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    layouts: HashMap<Format, FormatPlaneLayouts>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatRegistry {
    /// The built-in registry: every linear format plus the hand-specified YUV 4:2:0 layouts.
    pub fn new() -> Self {
        let mut layouts: HashMap<Format, FormatPlaneLayouts> = LINEAR_FORMATS
            .iter()
            .map(|&(format, bpp)| (format, FormatPlaneLayouts::single_plane(bpp)))
            .collect();

        layouts.insert(
            Format::G10X6B10X6R10X6TwoPlane420Unorm3Pack16,
            FormatPlaneLayouts::new(
                2,
                vec![
                    PlaneLayout::new(1, 1, 2, ImageAspect::PLANE_0),
                    PlaneLayout::new(2, 2, 4, ImageAspect::PLANE_1),
                ],
            ),
        );
        layouts.insert(
            Format::G8B8R8TwoPlane420Unorm,
            FormatPlaneLayouts::new(
                2,
                vec![
                    PlaneLayout::new(1, 1, 1, ImageAspect::PLANE_0),
                    PlaneLayout::new(2, 2, 2, ImageAspect::PLANE_1),
                ],
            ),
        );
        // The chroma planes' stride must stay 16-byte aligned, hence 32-pixel luma alignment.
        layouts.insert(
            Format::G8B8R8ThreePlane420Unorm,
            FormatPlaneLayouts::new(
                32,
                vec![
                    PlaneLayout::new(1, 1, 1, ImageAspect::PLANE_0),
                    PlaneLayout::new(2, 2, 1, ImageAspect::PLANE_1),
                    PlaneLayout::new(2, 2, 1, ImageAspect::PLANE_2),
                ],
            ),
        );

        Self { layouts }
    }

    /// A registry with no formats; combine with [`with_layouts`](Self::with_layouts).
    pub fn empty() -> Self {
        Self {
            layouts: HashMap::new(),
        }
    }

    /// Adds (or replaces) the layout for `format` while the registry is being built.
    pub fn with_layouts(mut self, format: Format, layouts: FormatPlaneLayouts) -> Self {
        self.layouts.insert(format, layouts);
        self
    }

    pub fn plane_layouts(&self, format: Format) -> Option<&FormatPlaneLayouts> {
        self.layouts.get(&format)
    }

    pub fn contains(&self, format: Format) -> bool {
        self.layouts.contains_key(&format)
    }

    /// Registered formats, in wire-value order.
    pub fn formats(&self) -> Vec<Format> {
        let mut formats: Vec<Format> = self.layouts.keys().copied().collect();
        formats.sort_unstable();
        formats
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}
