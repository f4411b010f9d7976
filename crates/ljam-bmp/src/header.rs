//! Bitmap header structures.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Resolution written to every bitmap, in pixels per metre (~96 DPI).
pub const PIXELS_PER_METRE: i32 = 0xEC4;

/// Bitmap file header.
///
/// Fields hold little-endian values regardless of host byte order, so read
/// them back through `from_le` when inspecting.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct BitmapFileHeader {
    /// Signature ("BM").
    pub signature: [u8; 2],
    /// Size of the whole file.
    pub file_size: u32,
    /// Reserved.
    pub reserved1: u16,
    /// Reserved.
    pub reserved2: u16,
    /// Offset of the pixel array from the start of the file.
    pub pixel_offset: u32,
}

impl BitmapFileHeader {
    /// Header size in bytes.
    pub const SIZE: usize = 14;

    /// Create a file header.
    pub fn new(file_size: u32, pixel_offset: u32) -> Self {
        Self {
            signature: *crate::BMP_MAGIC,
            file_size: file_size.to_le(),
            reserved1: 0,
            reserved2: 0,
            pixel_offset: pixel_offset.to_le(),
        }
    }
}

/// Bitmap info header (`BITMAPINFOHEADER`).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct BitmapInfoHeader {
    /// Header size (should be 40).
    pub size: u32,
    /// Image width in pixels.
    pub width: i32,
    /// Image height in pixels; positive means rows are stored bottom-up.
    pub height: i32,
    /// Colour planes (always 1).
    pub planes: u16,
    /// Bits per pixel.
    pub bit_count: u16,
    /// Compression method (0 = none).
    pub compression: u32,
    /// Pixel array size; may be 0 for uncompressed images.
    pub image_size: u32,
    /// Horizontal resolution.
    pub x_pixels_per_metre: i32,
    /// Vertical resolution.
    pub y_pixels_per_metre: i32,
    /// Number of palette entries.
    pub colours_used: u32,
    /// Number of important palette entries.
    pub colours_important: u32,
}

impl BitmapInfoHeader {
    /// Header size in bytes.
    pub const SIZE: usize = 40;

    /// Create an info header for an uncompressed, bottom-up image.
    pub fn new(width: u16, height: u16, bit_count: u16, palette_len: u32) -> Self {
        Self {
            size: (Self::SIZE as u32).to_le(),
            width: i32::from(width).to_le(),
            height: i32::from(height).to_le(),
            planes: 1u16.to_le(),
            bit_count: bit_count.to_le(),
            compression: 0,
            image_size: 0,
            x_pixels_per_metre: PIXELS_PER_METRE.to_le(),
            y_pixels_per_metre: PIXELS_PER_METRE.to_le(),
            colours_used: palette_len.to_le(),
            colours_important: palette_len.to_le(),
        }
    }
}

/// Offset of the palette (or the pixel array when there is no palette).
pub const HEADERS_SIZE: usize = BitmapFileHeader::SIZE + BitmapInfoHeader::SIZE;
