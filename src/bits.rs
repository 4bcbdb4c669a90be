//! Plaintext side of the engine: bit arrays and chunked plaintext databases.
//!
//! A [`BitArray`] is the atomic plaintext unit. A [`Plaintext`] is an ordered
//! sequence of bit arrays ("chunks") that all share the same width: either the
//! records of a database, or an index table holding the binary encodings of
//! `0..n`.

use crate::error::{Result, SheError};

/// A fixed-length sequence of bits.
///
/// The length is set at creation and never changes afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BitArray {
    bits: Vec<bool>,
}

impl BitArray {
    #[must_use]
    /// Creates a bit array of `n` zero bits.
    ///
    /// ## Examples
    ///
    /// ```
    /// use she::BitArray;
    ///
    /// let bits = BitArray::new(8);
    /// assert_eq!(bits.len(), 8);
    /// assert_eq!(bits.count_ones(), 0);
    /// ```
    pub fn new(n: usize) -> Self {
        Self {
            bits: vec![false; n],
        }
    }

    #[must_use]
    /// Binary encoding of `value` over `width` bits, most significant bit first.
    ///
    /// Bits of `value` above `width` are dropped.
    ///
    /// ## Examples
    ///
    /// ```
    /// use she::BitArray;
    ///
    /// let bits = BitArray::binary(10, 8);
    /// assert_eq!(bits.as_slice(), &[false, false, false, false, true, false, true, false]);
    /// ```
    pub fn binary(value: usize, width: usize) -> Self {
        let bits = (0..width)
            .rev()
            .map(|i| i < usize::BITS as usize && (value >> i) & 1 == 1)
            .collect();
        Self { bits }
    }

    #[must_use]
    /// Vector of `n` bits with a single 1 at position `k`.
    ///
    /// ## Panics
    ///
    /// Panics if `k >= n`.
    pub fn one_hot(k: usize, n: usize) -> Self {
        let mut bits = Self::new(n);
        bits.set(k, true);
        bits
    }

    /// Sets the given positions to 1, leaving the others untouched.
    ///
    /// ## Panics
    ///
    /// Panics if any index is out of range.
    pub fn set_bits(&mut self, indices: &[usize]) {
        for &i in indices {
            self.bits[i] = true;
        }
    }

    /// ## Panics
    ///
    /// Panics if `i` is out of range.
    pub fn set(&mut self, i: usize, value: bool) {
        self.bits[i] = value;
    }

    #[must_use]
    /// ## Panics
    ///
    /// Panics if `i` is out of range.
    pub fn get(&self, i: usize) -> bool {
        self.bits[i]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    #[must_use]
    /// Reads the bits back as an unsigned integer, most significant bit first.
    ///
    /// Only the last `usize::BITS` bits are taken into account.
    pub fn to_usize(&self) -> usize {
        self.bits
            .iter()
            .fold(0usize, |acc, &bit| (acc << 1) | usize::from(bit))
    }

    /// Elementwise XOR of two bit arrays of the same length.
    ///
    /// ## Errors
    ///
    /// Returns [`SheError::WidthMismatch`] if the lengths differ.
    pub fn xor(&self, other: &Self) -> Result<Self> {
        if self.len() != other.len() {
            return Err(SheError::WidthMismatch {
                expected: self.len(),
                got: other.len(),
            });
        }
        let bits = self
            .bits
            .iter()
            .zip(other.bits.iter())
            .map(|(a, b)| a ^ b)
            .collect();
        Ok(Self { bits })
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }
}

impl From<Vec<bool>> for BitArray {
    fn from(bits: Vec<bool>) -> Self {
        Self { bits }
    }
}

impl From<&[u8]> for BitArray {
    /// Builds a bit array from 0/1 bytes, any nonzero byte being a 1.
    fn from(bits: &[u8]) -> Self {
        Self {
            bits: bits.iter().map(|&b| b != 0).collect(),
        }
    }
}

impl FromIterator<bool> for BitArray {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}

/// An ordered sequence of bit arrays sharing one chunk width.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Plaintext {
    chunks: Vec<BitArray>,
    chunk_width: usize,
}

impl Plaintext {
    #[must_use]
    /// Creates an empty plaintext whose chunks will be `chunk_width` bits wide.
    pub const fn new(chunk_width: usize) -> Self {
        Self {
            chunks: Vec::new(),
            chunk_width,
        }
    }

    /// Builds a plaintext from explicit rows.
    ///
    /// The chunk width is the width of the first row.
    ///
    /// ## Errors
    ///
    /// Returns [`SheError::WidthMismatch`] if the rows do not all share the same width.
    pub fn from_rows<R, B>(rows: R) -> Result<Self>
    where
        R: IntoIterator<Item = B>,
        B: Into<BitArray>,
    {
        let mut rows = rows.into_iter().map(Into::into).peekable();
        let width = rows.peek().map_or(0, BitArray::len);
        let mut plaintext = Self::new(width);
        for row in rows {
            plaintext.append_chunk(row)?;
        }
        Ok(plaintext)
    }

    /// Splits a flattened buffer into chunks of `chunk_width` bits.
    ///
    /// ## Errors
    ///
    /// Returns [`SheError::EmptyInput`] if `chunk_width` is zero,
    /// and [`SheError::WidthMismatch`] if the buffer length is not a multiple of `chunk_width`.
    pub fn from_flat(bits: &BitArray, chunk_width: usize) -> Result<Self> {
        if chunk_width == 0 {
            return Err(SheError::EmptyInput("chunk width"));
        }
        if bits.len() % chunk_width != 0 {
            return Err(SheError::WidthMismatch {
                expected: (bits.len() / chunk_width + 1) * chunk_width,
                got: bits.len(),
            });
        }
        let chunks = bits
            .as_slice()
            .chunks(chunk_width)
            .map(|chunk| BitArray::from(chunk.to_vec()))
            .collect();
        Ok(Self {
            chunks,
            chunk_width,
        })
    }

    #[must_use]
    /// Index table of `n` chunks of `width` bits, chunk `i` holding `binary(i, width)`.
    ///
    /// ## Examples
    ///
    /// ```
    /// use she::{BitArray, Plaintext};
    ///
    /// let table = Plaintext::index_table(4, 2);
    /// assert_eq!(table.entry_count(), 4);
    /// assert_eq!(table.chunk(3), &BitArray::binary(3, 2));
    /// ```
    pub fn index_table(n: usize, width: usize) -> Self {
        Self::index_range(0..n, width)
    }

    #[must_use]
    /// Index table covering an arbitrary range of indices, used by database shards.
    pub fn index_range(range: core::ops::Range<usize>, width: usize) -> Self {
        Self {
            chunks: range.map(|i| BitArray::binary(i, width)).collect(),
            chunk_width: width,
        }
    }

    /// Appends one chunk.
    ///
    /// ## Errors
    ///
    /// Returns [`SheError::WidthMismatch`] if the chunk is not `chunk_width` bits wide.
    pub fn append_chunk(&mut self, chunk: BitArray) -> Result<()> {
        self.check_width(&chunk)?;
        self.chunks.push(chunk);
        Ok(())
    }

    /// Replaces the chunk at `row`.
    ///
    /// ## Errors
    ///
    /// Returns [`SheError::WidthMismatch`] if the chunk is not `chunk_width` bits wide.
    ///
    /// ## Panics
    ///
    /// Panics if `row` is out of range.
    pub fn update_chunk(&mut self, row: usize, chunk: BitArray) -> Result<()> {
        self.check_width(&chunk)?;
        self.chunks[row] = chunk;
        Ok(())
    }

    fn check_width(&self, chunk: &BitArray) -> Result<()> {
        if chunk.len() == self.chunk_width {
            Ok(())
        } else {
            Err(SheError::WidthMismatch {
                expected: self.chunk_width,
                got: chunk.len(),
            })
        }
    }

    #[must_use]
    /// ## Panics
    ///
    /// Panics if `row` or `bit` is out of range.
    pub fn get_bit(&self, row: usize, bit: usize) -> bool {
        self.chunks[row].get(bit)
    }

    #[must_use]
    /// ## Panics
    ///
    /// Panics if `row` is out of range.
    pub fn chunk(&self, row: usize) -> &BitArray {
        &self.chunks[row]
    }

    #[must_use]
    pub fn chunks(&self) -> &[BitArray] {
        &self.chunks
    }

    #[must_use]
    pub const fn chunk_width(&self) -> usize {
        self.chunk_width
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    /// Total number of bits held.
    pub fn bit_size(&self) -> usize {
        self.chunks.len() * self.chunk_width
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty() || self.chunk_width == 0
    }
}
