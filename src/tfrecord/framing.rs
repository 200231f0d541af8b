//! TFRecord framing.
//!
//! Every record on disk is laid out as
//!
//! ```text
//! u64  length          (little endian)
//! u32  masked_crc32c(length bytes)
//! [u8] payload         (length bytes)
//! u32  masked_crc32c(payload)
//! ```
//!
//! which is the layout `tf.data.TFRecordDataset` reads.

use std::io::{self, ErrorKind, Read, Write};

use thiserror::Error;

const MASK_DELTA: u32 = 0xa282_ead8;

/// Largest payload the reader will allocate for. Real `Example`s with an
/// embedded image are far below this; a larger length almost certainly
/// means the header is garbage.
const MAX_RECORD_LEN: u64 = 1 << 32;

/// Masks a CRC32C the way TFRecord does, so that checksums of data that
/// itself contains checksums stay well distributed.
#[inline]
pub fn masked_crc32c(data: &[u8]) -> u32 {
    let crc = crc32c::crc32c(data);
    crc.rotate_right(15).wrapping_add(MASK_DELTA)
}

/// Errors from reading framed records.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("truncated record at offset {offset}")]
    Truncated { offset: u64 },

    #[error("length checksum mismatch at offset {offset}")]
    LengthChecksum { offset: u64 },

    #[error("payload checksum mismatch at offset {offset}")]
    PayloadChecksum { offset: u64 },

    #[error("record length {length} at offset {offset} is implausibly large")]
    TooLarge { offset: u64, length: u64 },
}

/// Writes framed records to any [`Write`].
pub struct RecordWriter<W: Write> {
    inner: W,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Frames and writes one record.
    pub fn write_record(&mut self, payload: &[u8]) -> io::Result<()> {
        let len_bytes = (payload.len() as u64).to_le_bytes();
        self.inner.write_all(&len_bytes)?;
        self.inner.write_all(&masked_crc32c(&len_bytes).to_le_bytes())?;
        self.inner.write_all(payload)?;
        self.inner.write_all(&masked_crc32c(payload).to_le_bytes())?;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// Flushes and hands back the underlying writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Reads framed records, verifying both checksums.
pub struct RecordReader<R: Read> {
    inner: R,
    offset: u64,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    /// Byte offset of the next record.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Reads the next record. Returns `Ok(None)` at a clean end of input;
    /// end of input in the middle of a record is [`FrameError::Truncated`].
    pub fn read_record(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        let start = self.offset;

        let mut header = [0u8; 12];
        match read_full(&mut self.inner, &mut header)? {
            0 => return Ok(None),
            n if n < header.len() => return Err(FrameError::Truncated { offset: start }),
            _ => {}
        }

        let (len_bytes, len_crc) = header.split_at(8);
        let len_crc = u32::from_le_bytes([len_crc[0], len_crc[1], len_crc[2], len_crc[3]]);
        if masked_crc32c(len_bytes) != len_crc {
            return Err(FrameError::LengthChecksum { offset: start });
        }

        let mut len_array = [0u8; 8];
        len_array.copy_from_slice(len_bytes);
        let length = u64::from_le_bytes(len_array);
        if length > MAX_RECORD_LEN {
            return Err(FrameError::TooLarge {
                offset: start,
                length,
            });
        }

        // Grows with the bytes actually present, not the claimed length.
        let mut payload = Vec::new();
        let read = self.inner.by_ref().take(length).read_to_end(&mut payload)?;
        if (read as u64) < length {
            return Err(FrameError::Truncated { offset: start });
        }

        let mut crc = [0u8; 4];
        if read_full(&mut self.inner, &mut crc)? < crc.len() {
            return Err(FrameError::Truncated { offset: start });
        }
        if masked_crc32c(&payload) != u32::from_le_bytes(crc) {
            return Err(FrameError::PayloadChecksum { offset: start });
        }

        self.offset = start + 16 + length;
        Ok(Some(payload))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Vec<u8>, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}

/// Like `read_exact`, but reports how many bytes were read before EOF
/// instead of failing, so the caller can tell a clean end from truncation.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
