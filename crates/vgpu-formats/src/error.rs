use crate::format::Format;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("format {0:?} has no registered plane layout")]
    Unsupported(Format),
    #[error("unknown format wire value {0}")]
    UnknownRaw(u32),
    #[error("{width}x{height} image of format {format:?} does not fit a copy region")]
    ExtentTooLarge {
        format: Format,
        width: u32,
        height: u32,
    },
}
