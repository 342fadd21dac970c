//! The menu chain: the guide's root-level navigational structure, distinct
//! from the jumps embedded in individual entries.

use crate::error::Result;
use crate::reader::Reader;

/// On-disk fixed width of a menu's title field.
const MENU_TITLE_LEN: usize = 40;
/// Size of the fixed part of a menu record header (type, byte size, prompt
/// count, padded out to this width).
const MENU_HEADER_LEN: usize = 20;

/// A `(text, offset)` pair: a prompt's label and where it jumps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub offset: Option<usize>,
}

/// One entry in the guide's top-level menu chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub title: String,
    pub prompts: Vec<Prompt>,
}

fn to_offset(raw: i32) -> Option<usize> {
    if raw < 0 {
        None
    } else {
        Some(raw as usize)
    }
}

/// Read one menu record at the reader's current position, advancing past it.
fn read_menu(reader: &mut Reader) -> Result<Menu> {
    let _menu_type = reader.read_u16()?;
    let _byte_size = reader.read_u16()?;
    let prompt_count = reader.read_u16()? as usize;
    // header is padded out to MENU_HEADER_LEN bytes; 3 words read so far.
    reader.read_bytes(MENU_HEADER_LEN - 3 * 2)?;

    let title = reader.read_string_expanded(MENU_TITLE_LEN)?;

    let mut offsets = Vec::with_capacity(prompt_count + 1);
    for _ in 0..=prompt_count {
        offsets.push(reader.read_i32()?);
    }
    offsets.pop(); // drop the terminator

    let mut prompts = Vec::with_capacity(prompt_count);
    for offset in offsets {
        let text = reader.read_prefixed_string()?;
        prompts.push(Prompt { text, offset: to_offset(offset) });
    }

    Ok(Menu { title, prompts })
}

/// Walk `menu_count` menu records starting at the reader's current
/// position. Returns the menus in order and the offset immediately after
/// the last one (the first-entry offset). Never fails on `menu_count == 0`.
pub(crate) fn load_chain(reader: &mut Reader, menu_count: usize) -> Result<(Vec<Menu>, usize)> {
    let mut menus = Vec::with_capacity(menu_count);
    for i in 0..menu_count {
        log::debug!("loading menu {i} at {:#x}", reader.position());
        menus.push(read_menu(reader)?);
    }
    Ok((menus, reader.position()))
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
    fn empty_chain_is_not_an_error() {
        let mut reader = Reader::from_bytes(vec![]);
        let (menus, first_entry) = load_chain(&mut reader, 0).unwrap();
        assert!(menus.is_empty());
        assert_eq!(first_entry, 0);
    }

    #[test]
    fn loads_one_menu_with_two_prompts() {
        let mut record = vec![];
        record.extend_from_slice(&1u16.to_le_bytes()); // menu type
        record.extend_from_slice(&0u16.to_le_bytes()); // byte size (unused)
        record.extend_from_slice(&2u16.to_le_bytes()); // prompt count
        record.extend(std::iter::repeat(0u8).take(MENU_HEADER_LEN - 6)); // padding

        let mut title = b"File".to_vec();
        title.resize(MENU_TITLE_LEN, 0);
        record.extend(title);

        record.extend_from_slice(&0x10i32.to_le_bytes());
        record.extend_from_slice(&0x20i32.to_le_bytes());
        record.extend_from_slice(&(-1i32).to_le_bytes()); // terminator

        record.extend(prefixed(b"Open"));
        record.extend(prefixed(b"Quit"));

        let mut reader = Reader::from_bytes(obfuscate(&record));
        let (menus, first_entry) = load_chain(&mut reader, 1).unwrap();
        assert_eq!(menus.len(), 1);
        assert_eq!(menus[0].title, "File");
        assert_eq!(
            menus[0].prompts,
            vec![
                Prompt { text: "Open".into(), offset: Some(0x10) },
                Prompt { text: "Quit".into(), offset: Some(0x20) },
            ]
        );
        assert_eq!(first_entry, record.len());
    }
}
