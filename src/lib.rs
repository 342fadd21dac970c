//! A reader and navigator for Norton Guide (`.ng`) and Expert Help (`.eh`)
//! hypertext database files: the Clipper-era MS-DOS help format.
//!
//! ```no_run
//! use ngdb::Guide;
//!
//! let mut guide = Guide::open("demo.ng")?;
//! println!("{} ({})", guide.title(), guide.made_with().as_str());
//! for menu in guide.menus() {
//!     println!("menu: {}", menu.title);
//! }
//! guide.goto_first();
//! for entry in guide.entries() {
//!     let entry = entry?;
//!     for line in entry.lines() {
//!         print!("{}", ngdb::markup::plain_text(line));
//!     }
//! }
//! # Ok::<(), ngdb::Error>(())
//! ```
//!
//! This crate only reads guides; nothing here writes, repairs, or renders
//! them to a particular output format. See each module's documentation for
//! the on-disk contract it decodes.

pub mod cp437;
pub mod entry;
pub mod error;
pub mod guide;
pub mod markup;
pub mod menu;
pub mod reader;
pub mod rle;

pub use entry::{EntryKind, EntryParent, LongEntry, SeeAlso, ShortEntry};
pub use error::{Error, Result};
pub use guide::{Guide, MadeWith};
pub use markup::{MarkupBase, MarkupToken, PlainText};
pub use menu::{Menu, Prompt};
pub use reader::Reader;
