//! JAM image decoding.
//!
//! Layout of a JAM `.BMP` entry:
//!
//! ```text
//! u8  encoding        0x04 / 0x08 paletted, 0x98 RGB
//! u8  palette_len - 1 ignored for RGB
//! u16 width
//! u16 height
//! [u8; 3] x palette_len   B, G, R
//! blocks until end of input:
//!     u16 decompressed_size
//!     u16 compressed_size
//!     [u8; compressed_size]
//! ```
//!
//! Blocks decode into a top-down stream of unpadded rows, which is written
//! straight into the bottom-up, 4-byte aligned pixel array of the bitmap.

use ljam_common::{ByteRead, ByteView, ByteViewMut, Error as CommonError};
use zerocopy::IntoBytes;

use crate::header::{BitmapFileHeader, BitmapInfoHeader, HEADERS_SIZE};
use crate::{Error, Result};

/// Encoding tag at the start of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// 16-colour palette, two pixels per byte.
    Palette4,
    /// 256-colour palette, one pixel per byte.
    Palette8,
    /// Direct BGR colour, three bytes per pixel.
    Rgb24,
}

impl Encoding {
    /// Bits per pixel.
    pub const fn bits_per_pixel(self) -> u16 {
        match self {
            Encoding::Palette4 => 4,
            Encoding::Palette8 => 8,
            Encoding::Rgb24 => 24,
        }
    }

    /// Check if pixels index a palette.
    pub const fn is_paletted(self) -> bool {
        !matches!(self, Encoding::Rgb24)
    }
}

impl TryFrom<u8> for Encoding {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            0x04 => Ok(Encoding::Palette4),
            0x08 => Ok(Encoding::Palette8),
            0x98 => Ok(Encoding::Rgb24),
            other => Err(Error::UnsupportedEncoding(other)),
        }
    }
}

/// The fixed header of a JAM image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    /// Pixel encoding.
    pub encoding: Encoding,
    /// Number of palette entries (0 for RGB).
    pub palette_len: usize,
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
}

impl ImageHeader {
    /// Size of the fixed part of the header.
    pub const SIZE: usize = 6;

    /// Parse the header at the start of `data`.
    pub fn read(data: &ByteView) -> Result<Self> {
        let encoding = Encoding::try_from(data.read_u8(0)?)?;
        let palette_len = if encoding.is_paletted() {
            usize::from(data.read_u8(1)?) + 1
        } else {
            0
        };

        Ok(Self {
            encoding,
            palette_len,
            width: data.read_u16(2)?,
            height: data.read_u16(4)?,
        })
    }

    /// Offset of the first compressed block.
    #[inline]
    pub fn data_offset(&self) -> usize {
        Self::SIZE + self.palette_len * 3
    }

    /// Row geometry of the decoded image.
    #[inline]
    pub fn layout(&self) -> RowLayout {
        RowLayout::new(self.width, self.height, self.encoding.bits_per_pixel())
    }
}

/// Mapping from decoded (top-down, unpadded) byte positions to the bitmap
/// pixel array (bottom-up, rows padded to 4 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayout {
    /// Bytes per decoded row. Odd widths are padded to an even pixel count.
    pub source_row: usize,
    /// Bytes per bitmap row.
    pub output_row: usize,
    /// Number of rows.
    pub height: usize,
}

impl RowLayout {
    /// Compute the layout for an image.
    pub fn new(width: u16, height: u16, bits_per_pixel: u16) -> Self {
        let width = usize::from(width);
        let source_row = ((width + (width & 1)) * usize::from(bits_per_pixel)) >> 3;

        Self {
            source_row,
            output_row: (source_row + 3) & !3,
            height: usize::from(height),
        }
    }

    /// Size of the decoded stream.
    #[inline]
    pub fn logical_len(&self) -> usize {
        self.source_row * self.height
    }

    /// Size of the bitmap pixel array.
    #[inline]
    pub fn pixel_array_len(&self) -> usize {
        self.output_row * self.height
    }

    /// Pixel array index of a decoded byte, `None` past the last row.
    #[inline]
    pub fn physical_index(&self, logical: usize) -> Option<usize> {
        if self.source_row == 0 {
            return None;
        }

        let row = logical / self.source_row;
        if row >= self.height {
            return None;
        }

        let column = logical - row * self.source_row;
        Some((self.height - 1 - row) * self.output_row + column)
    }
}

/// Split a back-reference into its length nibble and backward distance.
///
/// The distance is 12 bits: the high nibble of the first byte followed by
/// the whole second byte.
#[inline]
pub fn split_reference(b: u8, b2: u8) -> (u8, usize) {
    let rewind = (usize::from(b & 0xF0) << 4) | usize::from(b2);
    (b & 0x0F, rewind)
}

/// Decode a JAM image into a complete bitmap file.
///
/// # Example
///
/// ```
/// use ljam_bmp::decode_bmp;
/// use ljam_common::ByteView;
///
/// // 2x1, 8-bit, one palette entry, one stored block
/// let image = ByteView::from_vec(vec![
///     0x08, 0x00, 0x02, 0x00, 0x01, 0x00, // header
///     0x10, 0x20, 0x30, // palette
///     0x02, 0x00, 0x02, 0x00, 0x00, 0x00, // block
/// ]);
///
/// let bitmap = decode_bmp(&image)?;
/// assert_eq!(&bitmap[..2], b"BM");
/// # Ok::<(), ljam_bmp::Error>(())
/// ```
pub fn decode_bmp(data: &ByteView) -> Result<Vec<u8>> {
    let header = ImageHeader::read(data)?;
    let layout = header.layout();

    let too_large = || Error::ImageTooLarge {
        width: header.width,
        height: header.height,
    };
    let pixel_offset = HEADERS_SIZE + header.palette_len * 4;
    let file_size = pixel_offset + layout.pixel_array_len();
    let file_size_u32 = u32::try_from(file_size).map_err(|_| too_large())?;

    let mut bitmap = vec![0u8; file_size];
    let (mut headers, mut pixels) = ByteViewMut::new(&mut bitmap).split_at(pixel_offset)?;

    let file_header = BitmapFileHeader::new(file_size_u32, pixel_offset as u32);
    let info_header = BitmapInfoHeader::new(
        header.width,
        header.height,
        header.encoding.bits_per_pixel(),
        header.palette_len as u32,
    );
    headers.write_bytes(0, file_header.as_bytes())?;
    headers.write_bytes(BitmapFileHeader::SIZE, info_header.as_bytes())?;

    for i in 0..header.palette_len {
        let bgr = data.read_bytes(ImageHeader::SIZE + i * 3, 3)?;
        let entry = u32::from(bgr[0]) | u32::from(bgr[1]) << 8 | u32::from(bgr[2]) << 16;
        headers.write_u32(HEADERS_SIZE + i * 4, entry | 0xFF00_0000)?;
    }

    let mut decoder = BlockDecoder {
        input: data,
        pixels: &mut pixels,
        layout,
    };
    decoder.decode_all(header.data_offset())?;

    Ok(bitmap)
}

/// Writes decoded blocks into the pixel array.
struct BlockDecoder<'a, 'b> {
    input: &'a ByteView,
    pixels: &'a mut ByteViewMut<'b>,
    layout: RowLayout,
}

impl BlockDecoder<'_, '_> {
    fn decode_all(&mut self, mut input_pos: usize) -> Result<()> {
        let mut output_pos = 0;

        while input_pos < self.input.size() {
            let decompressed = usize::from(self.input.read_u16(input_pos)?);
            let compressed = usize::from(self.input.read_u16(input_pos + 2)?);
            input_pos += 4;

            let block = self.input.slice(input_pos, compressed)?;
            if decompressed == compressed {
                self.copy_stored(&block, output_pos)?;
            } else {
                self.decompress(&block, output_pos, decompressed)?;
            }

            input_pos += compressed;
            output_pos += decompressed;
        }

        Ok(())
    }

    fn physical(&self, logical: usize) -> Result<usize> {
        self.layout.physical_index(logical).ok_or_else(|| {
            CommonError::OutOfBounds {
                offset: logical,
                size: 1,
                len: self.layout.logical_len(),
            }
            .into()
        })
    }

    /// Copy a stored block, one row segment at a time.
    fn copy_stored(&mut self, block: &ByteView, output_pos: usize) -> Result<()> {
        let mut copied = 0;

        while copied < block.size() {
            let logical = output_pos + copied;
            let dest = self.physical(logical)?;
            let row_left = self.layout.source_row - logical % self.layout.source_row;
            let run = row_left.min(block.size() - copied);

            block.copy_range(copied, self.pixels, dest, run)?;
            copied += run;
        }

        Ok(())
    }

    fn write(&mut self, logical: usize, value: u8) -> Result<()> {
        let dest = self.physical(logical)?;
        self.pixels.write_u8(dest, value)?;
        Ok(())
    }

    fn decompress(&mut self, block: &ByteView, mut pos: usize, decompressed: usize) -> Result<()> {
        if decompressed == 0 {
            return Ok(());
        }

        let end = pos + decompressed;
        self.write(pos, block.read_u8(0)?)?;
        pos += 1;
        let mut cursor = 1;

        'block: while pos < end {
            let flags = block.read_bit_flags(cursor)?;
            cursor += 1;

            for is_reference in flags.iter() {
                if pos >= end {
                    break 'block;
                }

                if !is_reference {
                    self.write(pos, block.read_u8(cursor)?)?;
                    cursor += 1;
                    pos += 1;
                    continue;
                }

                let b = block.read_u8(cursor)?;
                let b2 = block.read_u8(cursor + 1)?;
                let (nibble, rewind) = split_reference(b, b2);
                cursor += 2;

                let repeat = match nibble {
                    0 if rewind == 0 => break 'block,
                    0 => {
                        let extra = block.read_u8(cursor)?;
                        cursor += 1;
                        usize::from(extra) + 0x12
                    }
                    n => 0x12 - usize::from(n),
                };

                pos = self.copy_back(pos, rewind, repeat)?;
            }
        }

        Ok(())
    }

    /// Copy `repeat` bytes from `rewind` bytes back, one at a time so that a
    /// short distance repeats the bytes just written. Stops at the end of the
    /// image.
    fn copy_back(&mut self, mut pos: usize, rewind: usize, repeat: usize) -> Result<usize> {
        for _ in 0..repeat {
            let Some(dest) = self.layout.physical_index(pos) else {
                break;
            };
            let source = pos
                .checked_sub(rewind)
                .ok_or(Error::RewindOutOfRange { position: pos, rewind })?;

            let value = self.pixels.read_u8(self.physical(source)?)?;
            self.pixels.write_u8(dest, value)?;
            pos += 1;
        }

        Ok(pos)
    }
}
