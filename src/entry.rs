//! Entry types and the binary codec that loads them.
//!
//! An entry record always starts with a fixed 20-byte header (type tag,
//! line count, body byte size, parent triple, previous/next offsets)
//! followed by a body whose shape depends on the type tag. [`load`] decodes
//! a whole entry non-destructively; [`span`] reads only the fixed header to
//! learn how many bytes to skip, which is what [`crate::Guide::skip`] uses
//! so it never has to pay for a full body decode it is about to discard.

use crate::error::{Error, Result};
use crate::reader::Reader;

/// The type-tag value signalling "no more entries".
pub const END_OF_GUIDE_TAG: u16 = 0xFFFF;
/// A guide's see-also table holds at most this many cross-references.
pub const MAX_SEE_ALSO: usize = 20;

const FIXED_HEADER_LEN: usize = 20;

/// Where a loaded entry came from: the menu/prompt/line indices that led a
/// caller here, or none if it was reached some other way (e.g. `goto`).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EntryParent {
    pub menu: Option<usize>,
    pub prompt: Option<usize>,
    pub line: Option<usize>,
}

impl EntryParent {
    pub fn has_menu(&self) -> bool {
        self.menu.is_some()
    }

    pub fn has_prompt(&self) -> bool {
        self.prompt.is_some()
    }

    pub fn has_line(&self) -> bool {
        self.line.is_some()
    }
}

/// A single cross-reference in a [`LongEntry`]'s see-also table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeeAlso {
    pub text: String,
    pub offset: Option<usize>,
}

/// Fields shared by [`ShortEntry`] and [`LongEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryCommon {
    /// Byte offset this entry was loaded from.
    pub offset: usize,
    pub parent: EntryParent,
    pub line_count: usize,
    pub lines: Vec<String>,
    pub previous: Option<usize>,
    pub next: Option<usize>,
}

/// A flat menu of cross-references: each line jumps to another entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortEntry {
    pub common: EntryCommon,
    /// One jump offset per line, same length and order as `common.lines`.
    pub jumps: Vec<Option<usize>>,
}

/// A scrollable body of text with an optional see-also table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongEntry {
    pub common: EntryCommon,
    pub see_also: Vec<SeeAlso>,
}

/// The polymorphic result of loading an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Short(ShortEntry),
    Long(LongEntry),
}

impl EntryKind {
    pub fn common(&self) -> &EntryCommon {
        match self {
            EntryKind::Short(e) => &e.common,
            EntryKind::Long(e) => &e.common,
        }
    }

    pub fn offset(&self) -> usize {
        self.common().offset
    }

    pub fn parent(&self) -> EntryParent {
        self.common().parent
    }

    pub fn lines(&self) -> &[String] {
        &self.common().lines
    }

    pub fn line_count(&self) -> usize {
        self.common().line_count
    }

    pub fn previous(&self) -> Option<usize> {
        self.common().previous
    }

    pub fn next(&self) -> Option<usize> {
        self.common().next
    }

    pub fn is_short(&self) -> bool {
        matches!(self, EntryKind::Short(_))
    }

    pub fn is_long(&self) -> bool {
        matches!(self, EntryKind::Long(_))
    }
}

fn to_offset(raw: i32) -> Option<usize> {
    if raw < 0 {
        None
    } else {
        Some(raw as usize)
    }
}

fn to_index(raw: i16) -> Option<usize> {
    if raw < 0 {
        None
    } else {
        Some(raw as usize)
    }
}

struct FixedHeader {
    type_tag: u16,
    line_count: u16,
    byte_size: u16,
    parent: EntryParent,
    previous: Option<usize>,
    next: Option<usize>,
}

/// Read the 20-byte fixed entry header at the reader's current position.
///
/// Classifies the type tag as it goes: `0xFFFF` (or a short read landing on
/// it) is a clean end-of-guide and surfaces as [`Error::Eof`]; anything
/// other than `0` (short) or `1` (long) is [`Error::UnknownEntryType`].
fn read_fixed_header(reader: &mut Reader) -> Result<FixedHeader> {
    let type_tag = reader.read_u16()?;
    if type_tag == END_OF_GUIDE_TAG {
        log::debug!("end-of-guide sentinel reached");
        return Err(Error::Eof);
    }
    if type_tag != 0 && type_tag != 1 {
        log::warn!("unknown entry type tag 0x{type_tag:04x}");
        return Err(Error::UnknownEntryType(type_tag));
    }
    let line_count = reader.read_u16()?;
    let byte_size = reader.read_u16()?;
    let parent_menu = reader.read_i16()?;
    let parent_prompt = reader.read_i16()?;
    let parent_line = reader.read_i16()?;
    let previous = reader.read_i32()?;
    let next = reader.read_i32()?;
    Ok(FixedHeader {
        type_tag,
        line_count,
        byte_size,
        parent: EntryParent {
            menu: to_index(parent_menu),
            prompt: to_index(parent_prompt),
            line: to_index(parent_line),
        },
        previous: to_offset(previous),
        next: to_offset(next),
    })
}

fn read_see_also(reader: &mut Reader) -> Result<Vec<SeeAlso>> {
    let count = reader.read_u16()? as usize;
    let mut offsets = Vec::with_capacity(count.min(MAX_SEE_ALSO));
    for _ in 0..count {
        offsets.push(to_offset(reader.read_i32()?));
    }
    let mut see_also = Vec::with_capacity(offsets.len());
    for offset in offsets {
        let text = reader.read_prefixed_string()?;
        see_also.push(SeeAlso { text, offset });
    }
    Ok(see_also)
}

fn load_at(reader: &mut Reader, start: usize) -> Result<EntryKind> {
    let header = read_fixed_header(reader)?;
    let body_start = reader.position();
    let line_count = header.line_count as usize;

    if header.type_tag == 0 {
        let mut lines = Vec::with_capacity(line_count);
        let mut jumps = Vec::with_capacity(line_count);
        for _ in 0..line_count {
            jumps.push(to_offset(reader.read_i32()?));
            lines.push(reader.read_prefixed_string()?);
        }
        let common = EntryCommon {
            offset: start,
            parent: header.parent,
            line_count,
            lines,
            previous: header.previous,
            next: header.next,
        };
        Ok(EntryKind::Short(ShortEntry { common, jumps }))
    } else {
        let mut lines = Vec::with_capacity(line_count);
        for _ in 0..line_count {
            lines.push(reader.read_prefixed_string()?);
        }
        let body_consumed = reader.position() - body_start;
        let see_also = if body_consumed < header.byte_size as usize {
            read_see_also(reader)?
        } else {
            Vec::new()
        };
        let common = EntryCommon {
            offset: start,
            parent: header.parent,
            line_count,
            lines,
            previous: header.previous,
            next: header.next,
        };
        Ok(EntryKind::Long(LongEntry { common, see_also }))
    }
}

/// Fully decode the entry at the reader's current position. On success the
/// reader is left exactly where it started — loading is non-destructive.
/// On failure the reader is left wherever the failing read landed.
pub(crate) fn load(reader: &mut Reader) -> Result<EntryKind> {
    let start = reader.position();
    log::debug!("loading entry at {start:#x}");
    let entry = load_at(reader, start)?;
    reader.seek(start);
    Ok(entry)
}

/// Read only the fixed header to learn this entry's total on-disk length
/// (header + body), without decoding the body. The reader is restored to
/// its starting position; the caller (`Guide::skip`) performs the actual
/// advance.
pub(crate) fn span(reader: &mut Reader) -> Result<usize> {
    let start = reader.position();
    let header = read_fixed_header(reader)?;
    reader.seek(start);
    Ok(FIXED_HEADER_LEN + header.byte_size as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obfuscate(bytes: &[u8]) -> Vec<u8> {
        bytes.iter().map(|b| b ^ 0x1A).collect()
    }

    fn prefixed(text: &[u8]) -> Vec<u8> {
        let mut out = (text.len() as u16).to_le_bytes().to_vec();
        out.extend_from_slice(text);
        out
    }

    #[test]
    fn loads_a_short_entry_and_is_non_destructive() {
        let mut body = vec![];
        // fixed header: type=0, line_count=2, byte_size=0 (unused by Short), parent=-1,-1,-1, prev=-1, next=-1
        body.extend_from_slice(&0u16.to_le_bytes());
        body.extend_from_slice(&2u16.to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes());
        body.extend_from_slice(&(-1i16).to_le_bytes());
        body.extend_from_slice(&(-1i16).to_le_bytes());
        body.extend_from_slice(&(-1i16).to_le_bytes());
        body.extend_from_slice(&(-1i32).to_le_bytes());
        body.extend_from_slice(&(-1i32).to_le_bytes());
        // line 1: jump 0x100, "Hello"
        body.extend_from_slice(&0x100i32.to_le_bytes());
        body.extend(prefixed(b"Hello"));
        // line 2: jump 0x200, "World"
        body.extend_from_slice(&0x200i32.to_le_bytes());
        body.extend(prefixed(b"World"));

        let mut reader = Reader::from_bytes(obfuscate(&body));
        let entry = load(&mut reader).unwrap();
        assert_eq!(reader.position(), 0, "load must not move the cursor");
        match entry {
            EntryKind::Short(short) => {
                assert_eq!(short.common.lines, vec!["Hello", "World"]);
                assert_eq!(short.jumps, vec![Some(0x100), Some(0x200)]);
                assert_eq!(short.common.line_count, 2);
            }
            EntryKind::Long(_) => panic!("expected Short"),
        }
    }

    #[test]
    fn loads_a_long_entry_with_see_also() {
        let mut line_bytes = prefixed(b"line one");
        line_bytes.extend(prefixed(b"line two"));
        let mut see_also_bytes = vec![];
        see_also_bytes.extend_from_slice(&1u16.to_le_bytes());
        see_also_bytes.extend_from_slice(&0x500i32.to_le_bytes());
        see_also_bytes.extend(prefixed(b"Related"));

        let byte_size = (line_bytes.len() + see_also_bytes.len()) as u16;

        let mut body = vec![];
        body.extend_from_slice(&1u16.to_le_bytes());
        body.extend_from_slice(&2u16.to_le_bytes());
        body.extend_from_slice(&byte_size.to_le_bytes());
        body.extend_from_slice(&0i16.to_le_bytes());
        body.extend_from_slice(&1i16.to_le_bytes());
        body.extend_from_slice(&(-1i16).to_le_bytes());
        body.extend_from_slice(&42i32.to_le_bytes());
        body.extend_from_slice(&84i32.to_le_bytes());
        body.extend(line_bytes);
        body.extend(see_also_bytes);

        let mut reader = Reader::from_bytes(obfuscate(&body));
        let entry = load(&mut reader).unwrap();
        match entry {
            EntryKind::Long(long) => {
                assert_eq!(long.common.lines, vec!["line one", "line two"]);
                assert_eq!(long.common.parent.menu, Some(0));
                assert_eq!(long.common.parent.prompt, Some(1));
                assert!(!long.common.parent.has_line());
                assert_eq!(long.common.previous, Some(42));
                assert_eq!(long.common.next, Some(84));
                assert_eq!(long.see_also.len(), 1);
                assert_eq!(long.see_also[0].text, "Related");
                assert_eq!(long.see_also[0].offset, Some(0x500));
            }
            EntryKind::Short(_) => panic!("expected Long"),
        }
    }

    #[test]
    fn long_entry_without_remaining_bytes_has_no_see_also() {
        let line_bytes = prefixed(b"only line");
        let byte_size = line_bytes.len() as u16;
        let mut body = vec![];
        body.extend_from_slice(&1u16.to_le_bytes());
        body.extend_from_slice(&1u16.to_le_bytes());
        body.extend_from_slice(&byte_size.to_le_bytes());
        body.extend_from_slice(&(-1i16).to_le_bytes());
        body.extend_from_slice(&(-1i16).to_le_bytes());
        body.extend_from_slice(&(-1i16).to_le_bytes());
        body.extend_from_slice(&(-1i32).to_le_bytes());
        body.extend_from_slice(&(-1i32).to_le_bytes());
        body.extend(line_bytes);

        let mut reader = Reader::from_bytes(obfuscate(&body));
        match load(&mut reader).unwrap() {
            EntryKind::Long(long) => assert!(long.see_also.is_empty()),
            EntryKind::Short(_) => panic!("expected Long"),
        }
    }

    #[test]
    fn end_of_guide_sentinel_is_eof() {
        let body = 0xFFFFu16.to_le_bytes().to_vec();
        let mut reader = Reader::from_bytes(obfuscate(&body));
        assert!(matches!(load(&mut reader), Err(Error::Eof)));
    }

    #[test]
    fn unknown_type_tag_is_an_error() {
        let body = 7u16.to_le_bytes().to_vec();
        let mut reader = Reader::from_bytes(obfuscate(&body));
        assert!(matches!(load(&mut reader), Err(Error::UnknownEntryType(7))));
    }

    #[test]
    fn span_lets_skip_advance_without_decoding_the_body() {
        let mut body = vec![];
        body.extend_from_slice(&0u16.to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes());
        body.extend_from_slice(&123u16.to_le_bytes()); // byte_size, deliberately not matching real body
        body.extend_from_slice(&(-1i16).to_le_bytes());
        body.extend_from_slice(&(-1i16).to_le_bytes());
        body.extend_from_slice(&(-1i16).to_le_bytes());
        body.extend_from_slice(&(-1i32).to_le_bytes());
        body.extend_from_slice(&(-1i32).to_le_bytes());

        let mut reader = Reader::from_bytes(obfuscate(&body));
        let expected = FIXED_HEADER_LEN + 123;
        assert_eq!(span(&mut reader).unwrap(), expected);
        assert_eq!(reader.position(), 0, "span must not move the cursor");
    }

    #[test]
    fn zero_length_line_tolerated() {
        let mut body = vec![];
        body.extend_from_slice(&1u16.to_le_bytes());
        body.extend_from_slice(&1u16.to_le_bytes());
        let line = 0xFFFFu16.to_le_bytes().to_vec(); // length 0xFFFF -> empty
        body.extend_from_slice(&(line.len() as u16).to_le_bytes());
        body.extend_from_slice(&(-1i16).to_le_bytes());
        body.extend_from_slice(&(-1i16).to_le_bytes());
        body.extend_from_slice(&(-1i16).to_le_bytes());
        body.extend_from_slice(&(-1i32).to_le_bytes());
        body.extend_from_slice(&(-1i32).to_le_bytes());
        body.extend(line);

        let mut reader = Reader::from_bytes(obfuscate(&body));
        match load(&mut reader).unwrap() {
            EntryKind::Long(long) => assert_eq!(long.common.lines, vec![""]),
            EntryKind::Short(_) => panic!("expected Long"),
        }
    }
}
