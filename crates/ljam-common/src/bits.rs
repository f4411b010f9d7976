//! Single-byte bit flag access.

/// Eight individually addressable bits of one byte.
///
/// Index 0 is the most significant bit, which is the order the JAM image
/// encoding consumes its control bytes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitFlags(u8);

impl BitFlags {
    /// Number of flags in a byte.
    pub const LEN: usize = 8;

    /// Wrap a raw byte.
    #[inline]
    pub const fn new(byte: u8) -> Self {
        Self(byte)
    }

    /// Get the raw byte.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Get the flag at `index`, counting from the most significant bit.
    ///
    /// Indices past 7 read as clear.
    #[inline]
    pub const fn get(self, index: usize) -> bool {
        index < Self::LEN && self.0 & (0x80 >> index) != 0
    }

    /// Iterate over the flags, most significant bit first.
    #[inline]
    pub fn iter(self) -> impl Iterator<Item = bool> {
        (0..Self::LEN).map(move |i| self.get(i))
    }
}

impl From<u8> for BitFlags {
    fn from(byte: u8) -> Self {
        Self(byte)
    }
}
