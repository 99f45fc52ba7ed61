/// Declares [`Format`] with its wire value (the Vulkan `VkFormat` numbering the guest uses).
macro_rules! formats {
    ($($(#[$meta:meta])* $name:ident = $raw:literal,)+) => {
        /// Pixel formats the host understands, keyed by their wire value.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u32)]
        pub enum Format {
            $($(#[$meta])* $name = $raw,)+
        }

        impl Format {
            pub const ALL: &'static [Format] = &[$(Format::$name,)+];

            pub fn from_raw(raw: u32) -> Option<Self> {
                match raw {
                    $($raw => Some(Format::$name),)+
                    _ => None,
                }
            }

            pub fn raw(self) -> u32 {
                self as u32
            }
        }
    };
}

formats! {
    Undefined = 0,
    R4G4B4A4UnormPack16 = 2,
    R5G6B5UnormPack16 = 4,
    B5G6R5UnormPack16 = 5,
    R5G5B5A1UnormPack16 = 6,
    R8Unorm = 9,
    R8G8Unorm = 16,
    R8G8B8Unorm = 23,
    B8G8R8Unorm = 30,
    R8G8B8A8Unorm = 37,
    R8G8B8A8Srgb = 43,
    B8G8R8A8Unorm = 44,
    B8G8R8A8Srgb = 50,
    A2R10G10B10UnormPack32 = 58,
    A2B10G10R10UnormPack32 = 64,
    R16Unorm = 70,
    R16Sfloat = 76,
    R16G16Unorm = 77,
    R16G16Sfloat = 83,
    R16G16B16A16Unorm = 91,
    R16G16B16A16Sfloat = 97,
    R32Uint = 98,
    R32Sfloat = 100,
    R32G32Sfloat = 103,
    R32G32B32A32Sfloat = 109,
    B10G11R11UfloatPack32 = 122,
    /// YV12-style layout: full-resolution luma followed by two quarter-resolution chroma planes.
    G8B8R8ThreePlane420Unorm = 1_000_156_002,
    /// NV12-style layout: full-resolution luma followed by one interleaved chroma plane.
    G8B8R8TwoPlane420Unorm = 1_000_156_003,
    /// P010-style layout: 10-bit samples stored in 16-bit words.
    G10X6B10X6R10X6TwoPlane420Unorm3Pack16 = 1_000_156_013,
}

/// Single-plane formats and their bytes per pixel.
///
/// Every entry becomes a one-plane, unaligned, color-aspect layout in
/// [`FormatRegistry::new`](crate::FormatRegistry::new).
pub(crate) const LINEAR_FORMATS: &[(Format, u32)] = &[
    (Format::R4G4B4A4UnormPack16, 2),
    (Format::R5G6B5UnormPack16, 2),
    (Format::B5G6R5UnormPack16, 2),
    (Format::R5G5B5A1UnormPack16, 2),
    (Format::R8Unorm, 1),
    (Format::R8G8Unorm, 2),
    (Format::R8G8B8Unorm, 3),
    (Format::B8G8R8Unorm, 3),
    (Format::R8G8B8A8Unorm, 4),
    (Format::R8G8B8A8Srgb, 4),
    (Format::B8G8R8A8Unorm, 4),
    (Format::B8G8R8A8Srgb, 4),
    (Format::A2R10G10B10UnormPack32, 4),
    (Format::A2B10G10R10UnormPack32, 4),
    (Format::R16Unorm, 2),
    (Format::R16Sfloat, 2),
    (Format::R16G16Unorm, 4),
    (Format::R16G16Sfloat, 4),
    (Format::R16G16B16A16Unorm, 8),
    (Format::R16G16B16A16Sfloat, 8),
    (Format::R32Uint, 4),
    (Format::R32Sfloat, 4),
    (Format::R32G32Sfloat, 8),
    (Format::R32G32B32A32Sfloat, 16),
    (Format::B10G11R11UfloatPack32, 4),
];
