//! # accession
//!
//! Pattern-driven identifier generation for archival records.
//!
//! A numbering scheme binds a pattern such as `{REPO}/{FONDS}/{SEQ:4}` to a
//! per-scheme sequence counter. Generating an identifier parses the pattern
//! (cached), allocates the next sequence value atomically, resolves date,
//! contextual and random tokens, and renders the result.
//!
//! ## Features
//!
//! - **Lenient Patterns**: Unknown tokens and unterminated braces pass through as text
//! - **Atomic Sequences**: Per-scheme locking, yearly/monthly/daily resets, gap filling
//! - **Previews**: Render unsaved patterns without allocating numbers
//! - **Plain Storage**: One TOML document per scheme
//!
//! ```
//! use accession::{EntityContext, Generator, MemoryStore, NumberingScheme, Sector, SystemClock};
//!
//! let scheme = NumberingScheme::new("std", Sector::Archive, "{REPO}/{FONDS}/{SEQ:4}").unwrap();
//! let generator = Generator::new(MemoryStore::with_schemes([scheme]), SystemClock);
//!
//! let entity = EntityContext::new().with("REPO", "NARSSA").with("FONDS", "A");
//! let generated = generator.generate_identifier("std", &entity).unwrap();
//! assert_eq!(generated.identifier, "NARSSA/A/0001");
//! ```
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

pub mod allocator;
pub mod commands;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod generator;
pub mod pattern;
pub mod render;
pub mod scheme;
pub mod storage;
pub mod ui;

pub use allocator::SequenceAllocator;
pub use config::Config;
pub use context::{Clock, EntityContext, FixedClock, ResolvedContext, Resolver, SystemClock};
pub use error::{Error, Result};
pub use generator::{Generated, Generator, NumberingInfo};
pub use pattern::{parse, PatternDefinition, Segment};
pub use render::{render, Rendered, Warning};
pub use scheme::{NumberingScheme, Sector, SequenceReset};
pub use storage::{FileStore, MemoryStore, SchemeStore};
