use crate::entry::{ReadError, TagEntry};
use crate::mask::{BitMask, IndexOutOfRange};
use log::{trace, warn};
use std::collections::{BTreeMap, HashSet};
use std::io::{self, Read, Write};

/// The collection of tags covering one file list.
///
/// Entries are keyed by name, compared ASCII case-insensitively with the
/// original casing preserved on the entry. Every mask is sized against the
/// same external file count, so file-index operations fan out across all
/// entries to keep the masks aligned.
///
/// File-index parameters are `Option<usize>`: `None` means "no such file"
/// and turns the operation into a defined no-op rather than an error.
#[derive(Debug, Default)]
pub struct TagRegistry {
   // keyed by the ASCII-folded name
   entries: BTreeMap<String, TagEntry>,
}

fn fold(name: &str) -> String {
   name.to_ascii_lowercase()
}

impl TagRegistry {
   pub fn new() -> TagRegistry {
      TagRegistry {
         entries: BTreeMap::new(),
      }
   }

   /// Number of tags in the registry.
   pub fn len(&self) -> usize {
      self.entries.len()
   }

   pub fn is_empty(&self) -> bool {
      self.entries.is_empty()
   }

   /// All entries, in registry iteration order (folded-name order, not the
   /// canonical serialization order).
   pub fn tags(&self) -> impl Iterator<Item = &TagEntry> {
      self.entries.values()
   }

   /// Reads `tag_count` entries off the stream, each carrying a mask of
   /// `entry_count` bits. Both counts come from the enclosing file-format
   /// header; nothing here is self-describing.
   ///
   /// A name decoded twice replaces the earlier entry rather than failing;
   /// such streams exist in the wild and the later record wins.
   pub fn read_tags<R: Read>(
      &mut self,
      reader: &mut R,
      tag_count: usize,
      entry_count: usize,
   ) -> Result<(), ReadError> {
      for _ in 0..tag_count {
         let entry = TagEntry::read(reader, entry_count)?;
         let key = fold(&entry.name);
         if let Some(previous) = self.entries.insert(key, entry) {
            warn!("tag {:?} decoded more than once, keeping the later entry", previous.name);
         }
      }
      trace!("read {} tags of {} entries each", tag_count, entry_count);
      Ok(())
   }

   /// Writes every entry in canonical order: ascending adjusted type id,
   /// ties broken by name (ordinal, case-sensitive). The order is computed
   /// from a snapshot; no entry is mutated.
   pub fn write_tags<W: Write>(&self, writer: &mut W) -> io::Result<()> {
      let mut ordered: Vec<&TagEntry> = self.entries.values().collect();
      ordered.sort_by(|a, b| {
         a.sort_rank()
            .cmp(&b.sort_rank())
            .then_with(|| a.name.cmp(&b.name))
      });
      for entry in &ordered {
         entry.write(writer)?;
      }
      trace!("wrote {} tags", ordered.len());
      Ok(())
   }

   /// Inserts or replaces the entry under its name. A name not seen before
   /// gets a fresh zero-filled mask sized for `file_count`, discarding
   /// whatever mask the incoming entry carried; a replacement keeps the
   /// incoming mask, which the caller must have sized to the current file
   /// count.
   pub fn add_or_update_tag(&mut self, mut entry: TagEntry, file_count: usize) {
      let key = fold(&entry.name);
      if !self.entries.contains_key(&key) {
         entry.file_mask = BitMask::with_file_count(file_count);
      }
      self.entries.insert(key, entry);
   }

   /// Removes the named tag; no-op if absent.
   pub fn remove(&mut self, tag: &str) {
      self.entries.remove(&fold(tag));
   }

   /// Drops bit `index` from every entry's mask after a file is deleted
   /// from the owning file list, keeping every tag's bit positions aligned
   /// with the shifted file indices.
   pub fn remove_file(&mut self, index: Option<usize>) -> Result<(), IndexOutOfRange> {
      if let Some(index) = index {
         for entry in self.entries.values_mut() {
            entry.file_mask.remove(index)?;
         }
      }
      Ok(())
   }

   /// Case-insensitive lookup; absence is not an error.
   pub fn try_get(&self, tag: &str) -> Option<&TagEntry> {
      self.entries.get(&fold(tag))
   }

   pub fn contains_tag(&self, tag: &str) -> bool {
      self.entries.contains_key(&fold(tag))
   }

   /// Names of the tags whose bit at `index` is set, lazily, in registry
   /// iteration order. Recomputed fresh each call; empty for `None`.
   pub fn get_tags(&self, index: Option<usize>) -> impl Iterator<Item = &str> {
      self.entries
         .values()
         .filter(move |entry| match index {
            Some(i) => entry.file_mask.get(i).unwrap_or(false),
            None => false,
         })
         .map(|entry| entry.name.as_str())
   }

   /// Exclusive assignment of file `index`'s tags: bits of the named tags
   /// are set, bits of every other tag are cleared. `None` for `tags`
   /// selects every tag in the registry.
   pub fn set_tags(
      &mut self,
      index: Option<usize>,
      tags: Option<&[&str]>,
   ) -> Result<(), IndexOutOfRange> {
      let index = match index {
         Some(i) => i,
         None => return Ok(()),
      };
      match tags {
         None => {
            for entry in self.entries.values_mut() {
               entry.file_mask.set(index, true)?;
            }
         }
         Some(tags) => {
            let wanted: HashSet<String> = tags.iter().map(|t| fold(t)).collect();
            for (key, entry) in self.entries.iter_mut() {
               entry.file_mask.set(index, wanted.contains(key))?;
            }
         }
      }
      Ok(())
   }

   /// Non-exclusive assignment: each named tag that exists gets its bit at
   /// `index` set to `value`; unknown names are skipped, and tags not named
   /// keep their current bit.
   pub fn update_tags(
      &mut self,
      index: Option<usize>,
      value: bool,
      tags: &[&str],
   ) -> Result<(), IndexOutOfRange> {
      let index = match index {
         Some(i) => i,
         None => return Ok(()),
      };
      for tag in tags {
         if let Some(entry) = self.entries.get_mut(&fold(tag)) {
            entry.file_mask.set(index, value)?;
         }
      }
      Ok(())
   }
}
