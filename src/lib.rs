//! Tag-indexed bitmask registry for per-file attributes in archive formats.
//!
//! Archive system files associate each file with zero or more named
//! attributes (locale, platform, ...) without storing attribute lists per
//! file: each named [`TagEntry`] owns one bit per file, and a
//! [`TagRegistry`] keeps every tag's [`BitMask`] aligned with the same
//! externally-owned file list.
//!
//! Entry and tag counts are supplied by the enclosing file format's header;
//! this crate only covers the tag records themselves.
//!
//! ```
//! use tagmask::{TagEntry, TagRegistry};
//!
//! let mut registry = TagRegistry::new();
//! registry.add_or_update_tag(TagEntry::new("enUS", 1), 16);
//! registry.add_or_update_tag(TagEntry::new("Win", 2), 16);
//!
//! // file 5 is the enUS build of something
//! registry.update_tags(Some(5), true, &["enUS"]).unwrap();
//!
//! let tags: Vec<&str> = registry.get_tags(Some(5)).collect();
//! assert_eq!(tags, ["enUS"]);
//! assert!(registry.contains_tag("enus"));
//! ```
//!
//! Nothing here is thread-safe by itself; wrap the registry in a lock if it
//! is shared.

pub mod entry;
pub mod mask;
pub mod registry;

pub use entry::{Field, ReadError, TagEntry, TYPE_ALTERNATE};
pub use mask::{BitMask, IndexOutOfRange};
pub use registry::TagRegistry;
