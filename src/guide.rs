//! The root handle: opens a guide file, decodes its header and menu chain,
//! and drives the entry navigator.

use std::path::Path;

use crate::entry::{self, EntryKind};
use crate::error::Result;
use crate::menu::{self, Menu};
use crate::reader::Reader;

const TITLE_LEN: usize = 40;
const CREDIT_LEN: usize = 66;
const CREDIT_COUNT: usize = 5;

/// What a guide says it was produced with, derived from its magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MadeWith {
    NortonGuide,
    ExpertHelp,
    /// The magic did not match either known value.
    Unknown,
}

impl MadeWith {
    fn from_magic(magic: &[u8; 2]) -> MadeWith {
        match magic {
            b"NG" => MadeWith::NortonGuide,
            b"EH" => MadeWith::ExpertHelp,
            _ => MadeWith::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MadeWith::NortonGuide => "Norton Guide",
            MadeWith::ExpertHelp => "Expert Help",
            MadeWith::Unknown => "",
        }
    }
}

/// An open Norton Guide / Expert Help database.
///
/// Constructed with [`Guide::open`]. Owns the file contents and the single
/// location pointer that [`Guide::goto_first`], [`Guide::goto`],
/// [`Guide::skip`], [`Guide::eof`] and [`Guide::load`] all act on. Dropping
/// a `Guide` releases its buffer; [`Guide::close`] does the same thing
/// explicitly and early.
#[derive(Debug)]
pub struct Guide {
    reader: Reader,
    magic: [u8; 2],
    made_with: MadeWith,
    title: String,
    credits: [String; CREDIT_COUNT],
    menus: Vec<Menu>,
    first_entry_offset: usize,
}

impl Guide {
    /// Open `path`, decode its header and menu chain, and position the
    /// navigator at the first entry.
    ///
    /// Fails with [`crate::Error::Io`] only if the file itself cannot be
    /// read. An unrecognised magic does *not* fail: the `Guide` is returned
    /// with [`Guide::is_a`] false and every content accessor answering with
    /// empty values, per the format's own tolerance for non-guide files.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Guide> {
        let reader = Reader::open(path)?;
        Self::from_reader(reader)
    }

    /// Build a `Guide` directly from an in-memory buffer (the bytes of a
    /// whole `.ng`/`.eh` file). Useful for embedding callers and for tests.
    pub fn from_bytes(data: Vec<u8>) -> Result<Guide> {
        Self::from_reader(Reader::from_bytes(data))
    }

    fn from_reader(mut reader: Reader) -> Result<Guide> {
        let magic = match reader.read_magic() {
            Ok(m) => m,
            Err(_) => [0, 0],
        };
        let made_with = MadeWith::from_magic(&magic);

        if matches!(made_with, MadeWith::Unknown) {
            log::warn!("file does not look like a Norton Guide or Expert Help database");
            let file_size = reader.file_size();
            return Ok(Guide {
                reader,
                magic,
                made_with,
                title: String::new(),
                credits: Default::default(),
                menus: Vec::new(),
                first_entry_offset: file_size,
            });
        }

        log::debug!("magic {:?} recognised as {}", magic, made_with.as_str());
        let _unknown_a = reader.read_u16()?;
        let _unknown_b = reader.read_u16()?;
        let menu_count = reader.read_u16()? as usize;
        let title = reader.read_string(TITLE_LEN)?;
        let mut credits: [String; CREDIT_COUNT] = Default::default();
        for slot in &mut credits {
            *slot = reader.read_string(CREDIT_LEN)?;
        }

        let (menus, first_entry_offset) = menu::load_chain(&mut reader, menu_count)?;

        Ok(Guide {
            reader,
            magic,
            made_with,
            title,
            credits,
            menus,
            first_entry_offset,
        })
    }

    /// Whether the magic bytes identified this as a guide at all.
    pub fn is_a(&self) -> bool {
        !matches!(self.made_with, MadeWith::Unknown)
    }

    /// What this guide claims to have been produced with.
    pub fn made_with(&self) -> MadeWith {
        self.made_with
    }

    pub fn magic(&self) -> [u8; 2] {
        self.magic
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn credits(&self) -> &[String; CREDIT_COUNT] {
        &self.credits
    }

    pub fn menu_count(&self) -> usize {
        self.menus.len()
    }

    pub fn menus(&self) -> &[Menu] {
        &self.menus
    }

    pub fn file_size(&self) -> usize {
        self.reader.file_size()
    }

    /// The byte offset the navigator is currently positioned at.
    pub fn position(&self) -> usize {
        self.reader.position()
    }

    /// Position the navigator at the first entry.
    pub fn goto_first(&mut self) {
        self.reader.seek(self.first_entry_offset);
    }

    /// Position the navigator at an arbitrary byte offset.
    pub fn goto(&mut self, offset: usize) {
        self.reader.seek(offset);
    }

    /// True once navigation has run off the end of the entry stream: either
    /// the position is at or past the end of the file, or the entry type
    /// tag sitting there is the end-of-guide sentinel.
    pub fn eof(&mut self) -> bool {
        if self.reader.is_eof() {
            return true;
        }
        matches!(self.reader.peek_u16(), None | Some(entry::END_OF_GUIDE_TAG))
    }

    /// Decode the entry at the current position. Non-destructive: on
    /// success the navigator is left exactly where it was; call [`Guide::skip`]
    /// to advance past it.
    pub fn load(&mut self) -> Result<EntryKind> {
        entry::load(&mut self.reader)
    }

    /// Advance the navigator past the entry at the current position,
    /// without fully decoding its body.
    pub fn skip(&mut self) -> Result<()> {
        let span = entry::span(&mut self.reader)?;
        self.reader.skip(span);
        Ok(())
    }

    /// A restartable iterator over every entry from the current position
    /// to end-of-guide, each one followed by an automatic `skip`.
    pub fn entries(&mut self) -> Entries<'_> {
        Entries { guide: self, done: false }
    }

    /// Release the guide's in-memory buffer early. Also happens on drop.
    pub fn close(&mut self) {
        self.reader.close();
    }

    /// Open `path`, run `f` against the guide, and guarantee the buffer is
    /// released afterwards — including when `f` returns an error. Rust's
    /// own `Drop` already gives every `Guide` this guarantee implicitly;
    /// `with` exists for callers who want the acquire/use/release triple
    /// visually scoped at the call site.
    pub fn with<R>(path: impl AsRef<Path>, f: impl FnOnce(&mut Guide) -> Result<R>) -> Result<R> {
        let mut guide = Guide::open(path)?;
        let result = f(&mut guide);
        guide.close();
        result
    }

    /// Same as [`Guide::with`], but over an in-memory buffer rather than a
    /// path. Useful for embedding callers and tests that never touch disk.
    pub fn with_bytes<R>(data: Vec<u8>, f: impl FnOnce(&mut Guide) -> Result<R>) -> Result<R> {
        let mut guide = Guide::from_bytes(data)?;
        let result = f(&mut guide);
        guide.close();
        result
    }
}

/// Iterator over a guide's entries, yielded by [`Guide::entries`].
pub struct Entries<'a> {
    guide: &'a mut Guide,
    done: bool,
}

impl<'a> Iterator for Entries<'a> {
    type Item = Result<EntryKind>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.guide.eof() {
            return None;
        }
        match self.guide.load() {
            Ok(entry) => {
                // A failing skip still means we made forward progress on
                // this entry; report the skip error but don't loop forever
                // retrying the same offset.
                if let Err(e) = self.guide.skip() {
                    self.done = true;
                    return Some(Err(e));
                }
                Some(Ok(entry))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
