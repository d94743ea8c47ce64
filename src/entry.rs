use crate::mask::BitMask;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::error::Error;
use std::fmt;
use std::io::{self, Read, Write};
use std::string::FromUtf8Error;

/// Type id of locale-like "Alternate" tags. Stored at its raw value but
/// ordered alongside the low-numbered categories when serializing.
pub const TYPE_ALTERNATE: u16 = 0x4000;

/// The field of a tag entry that was being decoded when a read failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
   Name,
   TypeId,
   Mask,
}

#[derive(Debug)]
pub enum ReadError {
   /// The stream ended partway through the given field.
   Truncated(Field),
   /// The tag name was not valid UTF-8.
   InvalidName(FromUtf8Error),
   Io(io::Error),
}

impl ReadError {
   fn from_io(e: io::Error, field: Field) -> ReadError {
      if e.kind() == io::ErrorKind::UnexpectedEof {
         ReadError::Truncated(field)
      } else {
         ReadError::Io(e)
      }
   }
}

impl From<FromUtf8Error> for ReadError {
   fn from(e: FromUtf8Error) -> ReadError {
      ReadError::InvalidName(e)
   }
}

impl fmt::Display for ReadError {
   fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
      match self {
         ReadError::Truncated(field) => write!(f, "stream ended while reading tag {:?}", field),
         ReadError::InvalidName(e) => write!(f, "tag name is not valid UTF-8: {}", e),
         ReadError::Io(e) => write!(f, "failed to read tag: {}", e),
      }
   }
}

impl Error for ReadError {
   fn source(&self) -> Option<&(dyn Error + 'static)> {
      match self {
         ReadError::InvalidName(e) => Some(e),
         ReadError::Io(e) => Some(e),
         ReadError::Truncated(_) => None,
      }
   }
}

/// A named tag and the membership mask recording which files carry it.
///
/// On disk an entry is the name as a NUL-terminated string, the type id as a
/// big-endian `u16`, then the packed mask bytes, in that order with no
/// padding.
#[derive(Debug, Clone)]
pub struct TagEntry {
   pub(crate) name: String,
   pub(crate) type_id: u16,
   pub(crate) file_mask: BitMask,
}

impl TagEntry {
   /// A tag with an empty mask. [`TagRegistry::add_or_update_tag`] sizes the
   /// mask to the registry's file count on insertion.
   ///
   /// [`TagRegistry::add_or_update_tag`]: crate::TagRegistry::add_or_update_tag
   pub fn new(name: impl Into<String>, type_id: u16) -> TagEntry {
      TagEntry {
         name: name.into(),
         type_id,
         file_mask: BitMask::with_file_count(0),
      }
   }

   /// Original-case name. Compared case-insensitively everywhere it is used
   /// as a key.
   pub fn name(&self) -> &str {
      &self.name
   }

   pub fn type_id(&self) -> u16 {
      self.type_id
   }

   pub fn mask(&self) -> &BitMask {
      &self.file_mask
   }

   /// Decodes one entry, pulling exactly `ceil(entry_count / 8)` mask bytes
   /// off the stream after the name and type id.
   pub fn read<R: Read>(reader: &mut R, entry_count: usize) -> Result<TagEntry, ReadError> {
      let mut raw_name = Vec::new();
      loop {
         match reader.read_u8() {
            Ok(0) => break,
            Ok(b) => raw_name.push(b),
            Err(e) => return Err(ReadError::from_io(e, Field::Name)),
         }
      }
      let name = String::from_utf8(raw_name)?;

      let type_id = reader
         .read_u16::<BigEndian>()
         .map_err(|e| ReadError::from_io(e, Field::TypeId))?;

      let mut mask_bytes = vec![0u8; (entry_count + 7) / 8];
      reader
         .read_exact(&mut mask_bytes)
         .map_err(|e| ReadError::from_io(e, Field::Mask))?;

      Ok(TagEntry {
         name,
         type_id,
         file_mask: BitMask::from_bytes(mask_bytes, entry_count),
      })
   }

   /// Writes name, type id, then the full mask buffer as-is; no length is
   /// recomputed from the mask's logical size.
   pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
      writer.write_all(self.name.as_bytes())?;
      writer.write_u8(0)?;
      writer.write_u16::<BigEndian>(self.type_id)?;
      writer.write_all(self.file_mask.as_bytes())
   }

   // Alternate tags are locale tags as far as ordering is concerned; the
   // stored type id is never touched.
   pub(crate) fn sort_rank(&self) -> u16 {
      if self.type_id == TYPE_ALTERNATE {
         3
      } else {
         self.type_id
      }
   }
}

#[cfg(test)]
mod test {
   use super::*;
   use std::io::Cursor;

   #[test]
   fn round_trip() {
      let mut entry = TagEntry::new("enUS", 1);
      entry.file_mask = BitMask::with_file_count(16);
      entry.file_mask.set(2, true).unwrap();
      entry.file_mask.set(13, true).unwrap();

      let mut buf = Vec::new();
      entry.write(&mut buf).unwrap();
      assert_eq!(buf.len(), 4 + 1 + 2 + 2);

      let decoded = TagEntry::read(&mut Cursor::new(&buf), 16).unwrap();
      assert_eq!(decoded.name(), "enUS");
      assert_eq!(decoded.type_id(), 1);
      let original: Vec<bool> = entry.mask().iter().collect();
      let round_tripped: Vec<bool> = decoded.mask().iter().collect();
      assert_eq!(original, round_tripped);
   }

   #[test]
   fn consecutive_entries_consume_exact_bytes() {
      let mut buf = Vec::new();
      for name in ["Windows", "OSX"] {
         let mut entry = TagEntry::new(name, 2);
         entry.file_mask = BitMask::with_file_count(12);
         entry.write(&mut buf).unwrap();
      }
      let mut cursor = Cursor::new(&buf);
      let first = TagEntry::read(&mut cursor, 12).unwrap();
      let second = TagEntry::read(&mut cursor, 12).unwrap();
      assert_eq!(first.name(), "Windows");
      assert_eq!(second.name(), "OSX");
      assert_eq!(cursor.position() as usize, buf.len());
   }

   #[test]
   fn truncation_names_the_field() {
      // empty stream dies in the name
      let err = TagEntry::read(&mut Cursor::new(&[][..]), 8).unwrap_err();
      assert!(matches!(err, ReadError::Truncated(Field::Name)));

      // name terminator present, type id cut short
      let err = TagEntry::read(&mut Cursor::new(&b"x\0\x01"[..]), 8).unwrap_err();
      assert!(matches!(err, ReadError::Truncated(Field::TypeId)));

      // two mask bytes expected, none present
      let err = TagEntry::read(&mut Cursor::new(&b"x\0\x00\x01"[..]), 16).unwrap_err();
      assert!(matches!(err, ReadError::Truncated(Field::Mask)));
   }

   #[test]
   fn non_utf8_name_is_rejected() {
      let err = TagEntry::read(&mut Cursor::new(&[0xFF, 0xFE, 0x00][..]), 0).unwrap_err();
      assert!(matches!(err, ReadError::InvalidName(_)));
   }
}
