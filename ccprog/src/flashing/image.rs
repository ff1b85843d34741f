use std::borrow::Cow;
use std::path::Path;

use super::{FlashError, FLASH_SIZE};

/// Fill byte for the last, short chunk of an image.
pub const PADDING: u8 = 0x00;

/// A raw binary firmware image, written to flash starting at address 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareImage {
    data: Vec<u8>,
}

impl FirmwareImage {
    /// Read a binary image from a file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FlashError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| FlashError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!("Read {} bytes from {}", data.len(), path.display());

        Self::from_bytes(data)
    }

    /// Wrap an image already in memory.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Result<Self, FlashError> {
        let data = data.into();
        if data.is_empty() {
            return Err(FlashError::EmptyImage);
        }
        if data.len() > FLASH_SIZE as usize {
            return Err(FlashError::ImageTooLarge { len: data.len() });
        }
        Ok(Self { data })
    }

    /// Size of the image in bytes, without padding.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always `false`, empty images are rejected on construction.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The raw image.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Number of chunks of `chunk_size` bytes the image is split into.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is 0.
    pub fn chunk_count(&self, chunk_size: usize) -> usize {
        assert_ne!(chunk_size, 0, "chunk size must be non-zero");
        self.data.len().div_ceil(chunk_size)
    }

    /// Iterate over the image in chunks of exactly `chunk_size` bytes.
    ///
    /// The last chunk is padded with [`PADDING`]. Calling this again starts
    /// over from the beginning.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is 0.
    pub fn chunks(&self, chunk_size: usize) -> Chunks<'_> {
        assert_ne!(chunk_size, 0, "chunk size must be non-zero");
        Chunks {
            inner: self.data.chunks(chunk_size),
            chunk_size,
            offset: 0,
        }
    }
}

/// One chunk of a [`FirmwareImage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Offset of the chunk in the image.
    pub offset: usize,
    /// The chunk contents, padded to the chunk size.
    pub data: Cow<'a, [u8]>,
}

/// Iterator returned by [`FirmwareImage::chunks`].
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    inner: std::slice::Chunks<'a, u8>,
    chunk_size: usize,
    offset: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let slice = self.inner.next()?;
        let data = if slice.len() == self.chunk_size {
            Cow::Borrowed(slice)
        } else {
            let mut padded = slice.to_vec();
            padded.resize(self.chunk_size, PADDING);
            Cow::Owned(padded)
        };

        let chunk = Chunk {
            offset: self.offset,
            data,
        };
        self.offset += self.chunk_size;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Chunks<'_> {}
