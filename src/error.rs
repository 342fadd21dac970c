//! The crate-wide error type.

use std::result;

/// Everything that can go wrong while opening or navigating a guide.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The underlying file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A primitive value failed to decode out of an in-memory byte slice.
    #[error("binary decode error: {0}")]
    Scroll(#[from] scroll::Error),

    /// A read ran past the end of the file, or an entry body was truncated
    /// mid-read. Navigating past the last entry also surfaces this.
    #[error("unexpected end of guide")]
    Eof,

    /// An entry's type tag was neither `0` (short), `1` (long), nor the
    /// `0xFFFF` end-of-guide sentinel.
    #[error("unknown entry type tag: 0x{0:04x}")]
    UnknownEntryType(u16),

    /// Reserved for on-disk variants this crate deliberately declines to
    /// decode. Not produced by the current format revision.
    #[error("unsupported guide feature: {0}")]
    Unsupported(&'static str),
}

/// `NotAGuide` is deliberately not a variant of [`Error`]: per the format
/// contract an unrecognised magic leaves the [`crate::Guide`] constructed
/// with `is_a() == false` rather than failing to open. See
/// [`crate::Guide::is_a`].
pub type Result<T> = result::Result<T, Error>;
