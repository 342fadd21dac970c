//! A random-access, little-endian byte cursor over a guide file.
//!
//! `Reader` owns the whole file's bytes (guides are small enough that
//! slurping them is the simplest honest implementation — this is the same
//! call the teacher crate's archive reader makes for its own container
//! format) plus the current read position. Every byte it hands back has
//! already had the guide's trivial XOR transform undone, except for the
//! two-byte magic probe used to identify the file before we know it's a
//! guide at all.

use std::fs;
use std::path::Path;

use scroll::Pread;

use crate::cp437;
use crate::error::{Error, Result};
use crate::rle;

/// Every byte on disk (bar the magic) is XOR-combined with this constant.
const XOR_KEY: u8 = 0x1A;

/// The `0xFF` sentinel that both terminates a fixed-width string field and
/// opens an RLE run, depending on which kind of field is being read.
const RLE_MARKER: u8 = 0xFF;

#[derive(Debug)]
pub struct Reader {
    data: Vec<u8>,
    pos: usize,
}

impl Reader {
    /// Read the whole file at `path` into memory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Reader> {
        let path = path.as_ref();
        log::debug!("opening guide reader on {}", path.display());
        let data = fs::read(path)?;
        Ok(Reader { data, pos: 0 })
    }

    /// Build a reader directly from an in-memory buffer. Primarily useful
    /// for tests and for embedding callers that already have the bytes.
    pub fn from_bytes(data: Vec<u8>) -> Reader {
        Reader { data, pos: 0 }
    }

    /// Total size of the underlying file, in bytes.
    pub fn file_size(&self) -> usize {
        self.data.len()
    }

    /// The current read position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Absolute positioning. `offset` may land at or past the end of the
    /// file; the next read then fails with [`Error::Eof`].
    pub fn seek(&mut self, offset: usize) {
        self.pos = offset;
    }

    /// Relative positioning.
    pub fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n);
    }

    /// True once the position is at or past the end of the file.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Release the in-memory buffer. Also happens implicitly on drop.
    pub fn close(&mut self) {
        log::debug!("closing guide reader");
        self.data = Vec::new();
        self.pos = 0;
    }

    /// The raw, untransformed first two bytes of the file, advancing the
    /// position past them. The only read in this type that bypasses
    /// deobfuscation — used solely to probe the magic before we know
    /// whether this is even a guide.
    pub fn read_magic(&mut self) -> Result<[u8; 2]> {
        if self.data.len() < 2 {
            return Err(Error::Eof);
        }
        let magic = [self.data[0], self.data[1]];
        self.pos = 2;
        Ok(magic)
    }

    /// Peek the word at the current position without consuming it. Returns
    /// `None` if fewer than two bytes remain.
    pub fn peek_u16(&mut self) -> Option<u16> {
        let save = self.pos;
        let result = self.read_u16().ok();
        self.pos = save;
        result
    }

    fn take(&mut self, n: usize) -> Result<Vec<u8>> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.data.len());
        let end = match end {
            Some(e) => e,
            None => {
                log::warn!(
                    "read of {n} byte(s) at {:#x} runs past end of file ({} bytes)",
                    self.pos,
                    self.data.len()
                );
                return Err(Error::Eof);
            }
        };
        let bytes: Vec<u8> = self.data[self.pos..end].iter().map(|b| b ^ XOR_KEY).collect();
        self.pos = end;
        Ok(bytes)
    }

    /// Read exactly `n` deobfuscated bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        self.take(n)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(bytes.pread_with::<u16>(0, scroll::LE)?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(bytes.pread_with::<u32>(0, scroll::LE)?)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let bytes = self.take(2)?;
        Ok(bytes.pread_with::<i16>(0, scroll::LE)?)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let bytes = self.take(4)?;
        Ok(bytes.pread_with::<i32>(0, scroll::LE)?)
    }

    /// Read a fixed-width `n`-byte string field: deobfuscate, stop at the
    /// first NUL or `0xFF` byte, decode as CP437.
    pub fn read_string(&mut self, n: usize) -> Result<String> {
        let bytes = self.take(n)?;
        Ok(cp437::decode(trim_nul_or_marker(&bytes)))
    }

    /// Read a fixed-width `n`-byte string field that is additionally
    /// RLE-packed: deobfuscate, expand runs, stop the expanded text at the
    /// first NUL, decode as CP437.
    ///
    /// A lone trailing `0xFF` (no count/value byte after it) is a known
    /// real-world tolerance handled inside [`rle::expand`]; it is not a
    /// second trim pass here, since after expansion `0xFF` no longer carries
    /// special meaning (it may be a legitimate CP437 byte value).
    pub fn read_string_expanded(&mut self, n: usize) -> Result<String> {
        let bytes = self.take(n)?;
        let expanded = rle::expand(&bytes);
        Ok(cp437::decode(trim_nul(&expanded)))
    }

    /// Read a word byte-length, then that many RLE-packed bytes, the
    /// on-disk shape shared by short-entry lines, long-entry lines,
    /// see-also texts, and menu prompt texts.
    ///
    /// A length of `0xFFFF` is a known tolerance (real guides contain it)
    /// and is treated as a zero-length string rather than an error.
    pub fn read_prefixed_string(&mut self) -> Result<String> {
        let raw_len = self.read_u16()?;
        let len = if raw_len == 0xFFFF {
            log::warn!("length-prefixed string has length 0xFFFF, treating as empty");
            0
        } else {
            raw_len as usize
        };
        self.read_string_expanded(len)
    }
}

fn trim_nul_or_marker(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .position(|&b| b == 0 || b == RLE_MARKER)
        .unwrap_or(bytes.len());
    &bytes[..end]
}

fn trim_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}
