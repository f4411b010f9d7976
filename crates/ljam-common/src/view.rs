//! Bounds-checked byte views.
//!
//! [`ByteView`] is a cheap, cloneable window into a shared, immutable buffer
//! (a heap allocation or a memory-mapped file). Slicing a view never copies;
//! every sub-view points at the same allocation with a shifted offset.
//!
//! Writes go through [`ByteViewMut`], which borrows a private buffer
//! exclusively. A buffer being written can therefore never be observed by
//! another thread, and a finished buffer is frozen into a [`ByteView`] with
//! [`ByteView::from_vec`].

use std::fmt;
use std::fs::{self, File};
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};
use memmap2::Mmap;

use crate::{BitFlags, Error, Result};

/// Check that `[offset, offset + size)` lies within `len` bytes.
#[inline]
pub fn check_bounds(offset: usize, size: usize, len: usize) -> Result<()> {
    match offset.checked_add(size) {
        Some(end) if end <= len => Ok(()),
        _ => Err(Error::OutOfBounds { offset, size, len }),
    }
}

/// Bounds-checked little-endian reads, shared by both view types.
///
/// # Example
///
/// ```
/// use ljam_common::{ByteRead, ByteView};
///
/// let view = ByteView::from_vec(vec![0x01, 0x02, 0x03, 0x04, 0x05]);
///
/// assert_eq!(view.read_u32(0).unwrap(), 0x04030201);
/// assert!(view.read_u32(2).is_err());
/// ```
pub trait ByteRead {
    /// The bytes covered by this view.
    fn bytes(&self) -> &[u8];

    /// Length of the view in bytes.
    #[inline]
    fn size(&self) -> usize {
        self.bytes().len()
    }

    /// Check if the view covers no bytes.
    #[inline]
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Borrow `size` bytes starting at `offset`.
    #[inline]
    fn read_bytes(&self, offset: usize, size: usize) -> Result<&[u8]> {
        check_bounds(offset, size, self.size())?;
        Ok(&self.bytes()[offset..offset + size])
    }

    /// Read a single byte.
    #[inline]
    fn read_u8(&self, offset: usize) -> Result<u8> {
        self.read_bytes(offset, 1).map(|b| b[0])
    }

    /// Read a little-endian i16.
    #[inline]
    fn read_i16(&self, offset: usize) -> Result<i16> {
        self.read_bytes(offset, 2).map(LittleEndian::read_i16)
    }

    /// Read a little-endian u16.
    #[inline]
    fn read_u16(&self, offset: usize) -> Result<u16> {
        self.read_bytes(offset, 2).map(LittleEndian::read_u16)
    }

    /// Read a little-endian i32.
    #[inline]
    fn read_i32(&self, offset: usize) -> Result<i32> {
        self.read_bytes(offset, 4).map(LittleEndian::read_i32)
    }

    /// Read a little-endian u32.
    #[inline]
    fn read_u32(&self, offset: usize) -> Result<u32> {
        self.read_bytes(offset, 4).map(LittleEndian::read_u32)
    }

    /// Read a fixed-size ASCII field, dropping trailing NUL padding.
    ///
    /// Bytes outside the ASCII range decode as `?`.
    fn read_fixed_text(&self, offset: usize, len: usize) -> Result<String> {
        let bytes = self.read_bytes(offset, len)?;
        let text: String = bytes
            .iter()
            .map(|&b| if b.is_ascii() { b as char } else { '?' })
            .collect();
        Ok(text.trim_end_matches('\0').to_string())
    }

    /// Read one byte as eight flags, most significant bit first.
    #[inline]
    fn read_bit_flags(&self, offset: usize) -> Result<BitFlags> {
        self.read_u8(offset).map(BitFlags::new)
    }
}

/// Storage behind a [`ByteView`].
enum Backing {
    Owned(Box<[u8]>),
    Mapped(Mmap),
}

impl Deref for Backing {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        match self {
            Backing::Owned(data) => data,
            Backing::Mapped(map) => map,
        }
    }
}

/// A zero-copy window into a shared, immutable byte buffer.
///
/// Cloning and slicing are O(1). The view is `Send + Sync`, so sub-views can
/// be handed to worker threads freely.
#[derive(Clone)]
pub struct ByteView {
    buffer: Arc<Backing>,
    start: usize,
    len: usize,
}

impl ByteView {
    /// Create a view covering an owned buffer.
    pub fn from_vec(data: Vec<u8>) -> Self {
        let len = data.len();
        Self {
            buffer: Arc::new(Backing::Owned(data.into_boxed_slice())),
            start: 0,
            len,
        }
    }

    /// Read a whole file into memory.
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_vec(fs::read(path)?))
    }

    /// Memory-map a file read-only.
    ///
    /// The file must not be modified by another process while the map is
    /// alive.
    pub fn map_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(Self::from_vec(Vec::new()));
        }

        let map = unsafe { Mmap::map(&file)? };
        let len = map.len();
        Ok(Self {
            buffer: Arc::new(Backing::Mapped(map)),
            start: 0,
            len,
        })
    }

    /// Offset of this view within its underlying buffer.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Create a sub-view of `size` bytes starting at `offset`.
    pub fn slice(&self, offset: usize, size: usize) -> Result<Self> {
        check_bounds(offset, size, self.len)?;
        Ok(Self {
            buffer: Arc::clone(&self.buffer),
            start: self.start + offset,
            len: size,
        })
    }

    /// Create a sub-view from `offset` to the end of this view.
    pub fn slice_from(&self, offset: usize) -> Result<Self> {
        let size = self
            .len
            .checked_sub(offset)
            .ok_or(Error::OutOfBounds {
                offset,
                size: 0,
                len: self.len,
            })?;
        self.slice(offset, size)
    }

    /// Copy the viewed bytes into a new vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes().to_vec()
    }

    /// Convert into an owned vector.
    ///
    /// Avoids the copy when this is the only view of a whole owned buffer.
    pub fn into_vec(self) -> Vec<u8> {
        let whole = self.start == 0 && self.len == self.buffer.len();
        if !whole {
            return self.to_vec();
        }

        match Arc::try_unwrap(self.buffer) {
            Ok(Backing::Owned(data)) => data.into_vec(),
            Ok(backing) => backing.to_vec(),
            Err(shared) => shared.to_vec(),
        }
    }

    /// Copy `size` bytes at `src_offset` into `dest` at `dest_offset`.
    ///
    /// Both ranges are checked before anything is written.
    pub fn copy_range(
        &self,
        src_offset: usize,
        dest: &mut ByteViewMut<'_>,
        dest_offset: usize,
        size: usize,
    ) -> Result<()> {
        let src = self.read_bytes(src_offset, size)?;
        dest.write_bytes(dest_offset, src)
    }

    /// Check whether two views share the same underlying buffer.
    #[inline]
    pub fn same_buffer(&self, other: &ByteView) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
    }
}

impl ByteRead for ByteView {
    #[inline]
    fn bytes(&self) -> &[u8] {
        &self.buffer[self.start..self.start + self.len]
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteView")
            .field("start", &self.start)
            .field("len", &self.len)
            .finish()
    }
}

/// An exclusive, writable window into a byte buffer.
pub struct ByteViewMut<'a> {
    data: &'a mut [u8],
}

impl<'a> ByteViewMut<'a> {
    /// Wrap a mutable byte slice.
    #[inline]
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data }
    }

    /// Reborrow `size` bytes starting at `offset` as a narrower view.
    pub fn slice_mut(&mut self, offset: usize, size: usize) -> Result<ByteViewMut<'_>> {
        check_bounds(offset, size, self.data.len())?;
        Ok(ByteViewMut {
            data: &mut self.data[offset..offset + size],
        })
    }

    /// Split into two disjoint views at `mid`.
    pub fn split_at(self, mid: usize) -> Result<(ByteViewMut<'a>, ByteViewMut<'a>)> {
        check_bounds(mid, 0, self.data.len())?;
        let (head, tail) = self.data.split_at_mut(mid);
        Ok((ByteViewMut { data: head }, ByteViewMut { data: tail }))
    }

    /// Overwrite `src.len()` bytes starting at `offset`.
    #[inline]
    pub fn write_bytes(&mut self, offset: usize, src: &[u8]) -> Result<()> {
        check_bounds(offset, src.len(), self.data.len())?;
        self.data[offset..offset + src.len()].copy_from_slice(src);
        Ok(())
    }

    /// Write a single byte.
    #[inline]
    pub fn write_u8(&mut self, offset: usize, value: u8) -> Result<()> {
        check_bounds(offset, 1, self.data.len())?;
        self.data[offset] = value;
        Ok(())
    }

    /// Write a little-endian i16.
    #[inline]
    pub fn write_i16(&mut self, offset: usize, value: i16) -> Result<()> {
        check_bounds(offset, 2, self.data.len())?;
        LittleEndian::write_i16(&mut self.data[offset..offset + 2], value);
        Ok(())
    }

    /// Write a little-endian u16.
    #[inline]
    pub fn write_u16(&mut self, offset: usize, value: u16) -> Result<()> {
        check_bounds(offset, 2, self.data.len())?;
        LittleEndian::write_u16(&mut self.data[offset..offset + 2], value);
        Ok(())
    }

    /// Write a little-endian i32.
    #[inline]
    pub fn write_i32(&mut self, offset: usize, value: i32) -> Result<()> {
        check_bounds(offset, 4, self.data.len())?;
        LittleEndian::write_i32(&mut self.data[offset..offset + 4], value);
        Ok(())
    }

    /// Write a little-endian u32.
    #[inline]
    pub fn write_u32(&mut self, offset: usize, value: u32) -> Result<()> {
        check_bounds(offset, 4, self.data.len())?;
        LittleEndian::write_u32(&mut self.data[offset..offset + 4], value);
        Ok(())
    }

    /// Copy `size` bytes from `src` to `dest` within this view.
    ///
    /// The ranges may overlap; the copy behaves like `memmove`.
    pub fn copy_within(&mut self, src: usize, dest: usize, size: usize) -> Result<()> {
        let len = self.data.len();
        check_bounds(src, size, len)?;
        check_bounds(dest, size, len)?;
        self.data.copy_within(src..src + size, dest);
        Ok(())
    }
}

impl ByteRead for ByteViewMut<'_> {
    #[inline]
    fn bytes(&self) -> &[u8] {
        self.data
    }
}

impl fmt::Debug for ByteViewMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteViewMut")
            .field("len", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_primitives() {
        let view = ByteView::from_vec(vec![
            0x01, 0x02, 0x03, 0x04, // u32: 0x04030201
            0xFE, 0xFF, // i16: -2
        ]);

        assert_eq!(view.read_u32(0).unwrap(), 0x04030201);
        assert_eq!(view.read_i32(0).unwrap(), 0x04030201);
        assert_eq!(view.read_u16(4).unwrap(), 0xFFFE);
        assert_eq!(view.read_i16(4).unwrap(), -2);
        assert_eq!(view.read_u8(5).unwrap(), 0xFF);
    }

    #[test]
    fn test_read_past_end() {
        let view = ByteView::from_vec(vec![1, 2, 3]);

        let err = view.read_i32(0).unwrap_err();
        assert!(matches!(
            err,
            Error::OutOfBounds {
                offset: 0,
                size: 4,
                len: 3
            }
        ));
        assert!(view.read_u8(3).is_err());
    }

    #[test]
    fn test_offset_overflow_is_bounds_error() {
        let view = ByteView::from_vec(vec![0; 8]);
        assert!(view.read_bytes(usize::MAX, 2).is_err());
        assert!(view.slice(1, usize::MAX).is_err());
    }

    #[test]
    fn test_slice_shares_buffer() {
        let view = ByteView::from_vec((0u8..16).collect());
        let sub = view.slice(4, 8).unwrap();
        let nested = sub.slice(2, 2).unwrap();

        assert_eq!(sub.size(), 8);
        assert_eq!(sub.start(), 4);
        assert_eq!(nested.bytes(), &[6, 7]);
        assert!(nested.same_buffer(&view));
    }

    #[test]
    fn test_slice_bounds() {
        let view = ByteView::from_vec(vec![0; 4]);

        assert!(view.slice(2, 3).is_err());
        assert!(view.slice(5, 0).is_err());

        let empty = view.slice(4, 0).unwrap();
        assert!(empty.is_empty());

        let tail = view.slice_from(1).unwrap();
        assert_eq!(tail.size(), 3);
        assert!(view.slice_from(4).unwrap().is_empty());
        assert!(view.slice_from(5).is_err());
    }

    #[test]
    fn test_fixed_text_strips_trailing_nuls() {
        let mut data = b"TRACK.BMP".to_vec();
        data.resize(12, 0);
        let view = ByteView::from_vec(data);

        assert_eq!(view.read_fixed_text(0, 12).unwrap(), "TRACK.BMP");
        assert!(view.read_fixed_text(1, 12).is_err());
    }

    #[test]
    fn test_fixed_text_keeps_inner_nul() {
        let view = ByteView::from_vec(b"AB\0C\0\0".to_vec());
        assert_eq!(view.read_fixed_text(0, 6).unwrap(), "AB\0C");
    }

    #[test]
    fn test_bit_flags() {
        let view = ByteView::from_vec(vec![0b1010_0000]);
        let flags = view.read_bit_flags(0).unwrap();
        assert!(flags.get(0));
        assert!(!flags.get(1));
        assert!(flags.get(2));
        assert!(view.read_bit_flags(1).is_err());
    }

    #[test]
    fn test_into_vec_whole_buffer() {
        let view = ByteView::from_vec(vec![9, 8, 7]);
        assert_eq!(view.into_vec(), vec![9, 8, 7]);

        let view = ByteView::from_vec(vec![9, 8, 7]);
        let sub = view.slice(1, 2).unwrap();
        assert_eq!(sub.into_vec(), vec![8, 7]);
        assert_eq!(view.to_vec(), vec![9, 8, 7]);
    }

    #[test]
    fn test_writes() {
        let mut buffer = vec![0u8; 8];
        let mut view = ByteViewMut::new(&mut buffer);

        view.write_i16(0, -2).unwrap();
        view.write_i32(2, 0x0A0B0C0D).unwrap();
        view.write_u8(6, 0x42).unwrap();
        assert!(view.write_u32(6, 0).is_err());
        assert_eq!(view.read_u8(6).unwrap(), 0x42);

        assert_eq!(buffer, [0xFE, 0xFF, 0x0D, 0x0C, 0x0B, 0x0A, 0x42, 0x00]);
    }

    #[test]
    fn test_failed_write_leaves_buffer_untouched() {
        let mut buffer = vec![0u8; 4];
        let mut view = ByteViewMut::new(&mut buffer);

        assert!(view.write_bytes(2, &[1, 2, 3]).is_err());
        assert_eq!(buffer, [0, 0, 0, 0]);
    }

    #[test]
    fn test_slice_mut_writes_through() {
        let mut buffer = vec![0u8; 6];
        let mut view = ByteViewMut::new(&mut buffer);
        {
            let mut sub = view.slice_mut(2, 2).unwrap();
            sub.write_u16(0, 0xBEEF).unwrap();
            assert!(sub.write_u8(2, 1).is_err());
        }
        assert_eq!(view.read_u16(2).unwrap(), 0xBEEF);
    }

    #[test]
    fn test_split_at() {
        let mut buffer = vec![0u8; 4];
        let view = ByteViewMut::new(&mut buffer);
        let (mut head, mut tail) = view.split_at(1).unwrap();
        head.write_u8(0, 1).unwrap();
        tail.write_u8(2, 2).unwrap();
        assert!(head.write_u8(1, 0).is_err());
        assert_eq!(buffer, [1, 0, 0, 2]);
    }

    #[test]
    fn test_copy_range_between_views() {
        let src = ByteView::from_vec(vec![1, 2, 3, 4]);
        let mut buffer = vec![0u8; 4];
        let mut dest = ByteViewMut::new(&mut buffer);

        src.copy_range(1, &mut dest, 0, 3).unwrap();
        assert!(src.copy_range(2, &mut dest, 0, 3).is_err());
        assert!(src.copy_range(0, &mut dest, 2, 3).is_err());
        assert_eq!(buffer, [2, 3, 4, 0]);
    }

    #[test]
    fn test_copy_within_overlapping() {
        let mut buffer = vec![1, 2, 3, 4, 5, 0];
        let mut view = ByteViewMut::new(&mut buffer);

        view.copy_within(0, 1, 5).unwrap();
        assert!(view.copy_within(2, 0, 5).is_err());
        assert_eq!(buffer, [1, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_map_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"LJAM\x00\x00\x00\x00").unwrap();
        file.flush().unwrap();

        let view = ByteView::map_file(file.path()).unwrap();
        assert_eq!(view.size(), 8);
        assert_eq!(view.read_bytes(0, 4).unwrap(), b"LJAM");

        let empty = tempfile::NamedTempFile::new().unwrap();
        assert!(ByteView::map_file(empty.path()).unwrap().is_empty());
    }
}
