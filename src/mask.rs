use std::error::Error;
use std::fmt;

/// Packed per-file membership bits for a single tag.
///
/// Bit `i` records whether file `i` carries the tag. Bits are stored
/// MSB-first: bit 0 is the high bit of byte 0, matching the packed layout
/// the on-disk format uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMask {
   bytes: Vec<u8>,
   len: usize,
}

/// A bit index fell outside the mask's allocated byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOutOfRange {
   pub index: usize,
   pub capacity: usize,
}

impl fmt::Display for IndexOutOfRange {
   fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
      write!(
         f,
         "bit index {} out of range for a {} bit mask",
         self.index, self.capacity
      )
   }
}

impl Error for IndexOutOfRange {}

impl BitMask {
   /// A zero-filled mask covering `file_count` files, i.e. no file tagged.
   pub fn with_file_count(file_count: usize) -> BitMask {
      BitMask {
         bytes: vec![0u8; (file_count + 7) / 8],
         len: file_count,
      }
   }

   /// Wraps bytes pulled off a stream. `bit_len` is the number of logical
   /// bits; `bytes` must hold at least `ceil(bit_len / 8)` bytes.
   pub fn from_bytes(bytes: Vec<u8>, bit_len: usize) -> BitMask {
      debug_assert!(bytes.len() * 8 >= bit_len);
      BitMask { bytes, len: bit_len }
   }

   /// Number of logical bits (files) the mask covers.
   pub fn len(&self) -> usize {
      self.len
   }

   pub fn is_empty(&self) -> bool {
      self.len == 0
   }

   /// Addressable bits: allocated byte length times eight.
   pub fn capacity(&self) -> usize {
      self.bytes.len() * 8
   }

   /// The packed buffer exactly as it is serialized.
   pub fn as_bytes(&self) -> &[u8] {
      &self.bytes
   }

   fn check(&self, index: usize) -> Result<(), IndexOutOfRange> {
      if index >= self.capacity() {
         return Err(IndexOutOfRange {
            index,
            capacity: self.capacity(),
         });
      }
      Ok(())
   }

   pub fn get(&self, index: usize) -> Result<bool, IndexOutOfRange> {
      self.check(index)?;
      Ok(self.bytes[index / 8] & (0x80 >> (index % 8)) != 0)
   }

   pub fn set(&mut self, index: usize, value: bool) -> Result<(), IndexOutOfRange> {
      self.check(index)?;
      let bit = 0x80 >> (index % 8);
      if value {
         self.bytes[index / 8] |= bit;
      } else {
         self.bytes[index / 8] &= !bit;
      }
      Ok(())
   }

   /// Deletes bit `index`, shifting every later bit down one position and
   /// shrinking the logical length by one. Models a file disappearing from
   /// the indexed file list: the membership of every file after it moves
   /// down to fill the gap.
   pub fn remove(&mut self, index: usize) -> Result<(), IndexOutOfRange> {
      self.check(index)?;
      let byte = index / 8;
      let offset = index % 8;
      // Bits before the removed one stay put, the tail of the byte shifts
      // up one position, then each following byte lends its first bit to
      // the byte before it.
      let tail = 0xFFu8 >> offset;
      let head = !tail;
      self.bytes[byte] = (self.bytes[byte] & head) | ((self.bytes[byte] << 1) & tail);
      for i in byte + 1..self.bytes.len() {
         self.bytes[i - 1] |= self.bytes[i] >> 7;
         self.bytes[i] <<= 1;
      }
      self.len = self.len.saturating_sub(1);
      self.bytes.truncate((self.len + 7) / 8);
      Ok(())
   }

   /// Logical bits in file-index order; recomputed fresh on every call.
   pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
      (0..self.len).map(move |i| self.bytes[i / 8] & (0x80 >> (i % 8)) != 0)
   }
}
