//! Write-ahead log: an append-only stream of Put/Delete records with a
//! flush to stable storage on every append.
//!
//! On-disk format — a valid log is zero or more of these frames and
//! nothing else:
//!
//! ```text
//! record  := length(u32 LE) payload
//! payload := type(u8) key_len(u32 LE) key value_len(u32 LE) value
//! length  == 1 + 4 + key_len + 4 + value_len
//! type    0 = Put, 1 = Delete (a Delete frames an empty value)
//! ```
//!
//! No file header, no footer, no checksum. A torn frame at the tail (crash
//! mid-append) surfaces as [`WalError::Corrupt`]; whether to truncate there
//! or refuse to start is the caller's recovery policy.

use byteorder::{LittleEndian, ReadBytesExt};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use thiserror::Error;

const TYPE_PUT: u8 = 0;
const TYPE_DELETE: u8 = 1;

/// A single mutation recorded in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalRecord {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

#[derive(Debug, Error)]
pub enum WalError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("corrupt record")]
    Corrupt,
}

impl WalRecord {
    /// Encodes this record as one complete on-disk frame.
    pub fn encode(&self) -> Vec<u8> {
        let (type_byte, key, value): (u8, &[u8], &[u8]) = match self {
            WalRecord::Put { key, value } => (TYPE_PUT, key, value),
            WalRecord::Delete { key } => (TYPE_DELETE, key, &[]),
        };

        let payload_len = 1 + 4 + key.len() + 4 + value.len();
        let mut buf = Vec::with_capacity(4 + payload_len);
        buf.extend_from_slice(&(payload_len as u32).to_le_bytes());
        buf.push(type_byte);
        buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
        buf.extend_from_slice(key);
        buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
        buf.extend_from_slice(value);
        buf
    }

    /// Size of this record's frame on disk, length prefix included.
    pub fn encoded_len(&self) -> usize {
        match self {
            WalRecord::Put { key, value } => 4 + 1 + 4 + key.len() + 4 + value.len(),
            WalRecord::Delete { key } => 4 + 1 + 4 + key.len() + 4,
        }
    }
}

/// Appends records to the log file, syncing on every append.
pub struct WalWriter {
    file: File,
}

impl WalWriter {
    /// Opens (or creates) the log file in append mode.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, WalError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }

    /// Appends one record and flushes it to stable storage.
    ///
    /// On `Ok(())` the record is durable and is the last record in the log.
    /// On error the frame may be absent, partial, or complete — the caller
    /// must treat the record as lost; there is no internal retry.
    pub fn append(&mut self, record: &WalRecord) -> Result<(), WalError> {
        self.file.write_all(&record.encode())?;
        self.file.sync_all()?;
        Ok(())
    }
}

/// Reads records back in exactly the order they were appended.
pub struct WalReader<R: Read> {
    rdr: BufReader<R>,
}

impl WalReader<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<WalReader<File>, WalError> {
        let f = File::open(path)?;
        Ok(WalReader {
            rdr: BufReader::new(f),
        })
    }
}

impl<R: Read> WalReader<R> {
    pub fn from_reader(reader: R) -> Self {
        WalReader {
            rdr: BufReader::new(reader),
        }
    }

    /// Reads the next record.
    ///
    /// Returns `Ok(None)` when the source is exhausted exactly at a frame
    /// boundary — the clean end of the log. Repeated calls at the end keep
    /// returning `Ok(None)` unless the underlying source grows.
    ///
    /// Returns [`WalError::Corrupt`] when the source ends mid-frame (a torn
    /// write), declares inconsistent lengths, or carries an unknown record
    /// type; any other read failure surfaces as [`WalError::Io`].
    pub fn next_record(&mut self) -> Result<Option<WalRecord>, WalError> {
        let payload_len = match self.read_length_prefix()? {
            Some(n) => n as usize,
            None => return Ok(None),
        };

        let mut payload = vec![0u8; payload_len];
        self.rdr.read_exact(&mut payload).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                WalError::Corrupt
            } else {
                WalError::Io(e)
            }
        })?;

        decode_payload(&payload).map(Some)
    }

    /// Reads the 4-byte length prefix, distinguishing a clean end of log
    /// (zero bytes available, `Ok(None)`) from a torn prefix (1–3 bytes
    /// then end of stream, `Corrupt`).
    fn read_length_prefix(&mut self) -> Result<Option<u32>, WalError> {
        let mut buf = [0u8; 4];
        let mut filled = 0;
        while filled < buf.len() {
            match self.rdr.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => return Err(WalError::Corrupt),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(WalError::Io(e)),
            }
        }
        Ok(Some(u32::from_le_bytes(buf)))
    }

    /// Drives [`next_record`](WalReader::next_record) to the end of the
    /// log, applying each record in append order.
    pub fn replay<F>(&mut self, mut apply: F) -> Result<(), WalError>
    where
        F: FnMut(WalRecord),
    {
        while let Some(record) = self.next_record()? {
            apply(record);
        }
        Ok(())
    }
}

/// Decodes one frame payload. The declared key/value lengths must account
/// for the payload exactly; anything short, long, or of unknown type is
/// corrupt.
fn decode_payload(payload: &[u8]) -> Result<WalRecord, WalError> {
    let mut br = payload;

    let type_byte = br.read_u8().map_err(|_| WalError::Corrupt)?;

    let key_len = br
        .read_u32::<LittleEndian>()
        .map_err(|_| WalError::Corrupt)? as usize;
    if br.len() < key_len {
        return Err(WalError::Corrupt);
    }
    let mut key = vec![0u8; key_len];
    br.read_exact(&mut key).map_err(|_| WalError::Corrupt)?;

    let value_len = br
        .read_u32::<LittleEndian>()
        .map_err(|_| WalError::Corrupt)? as usize;
    if br.len() != value_len {
        return Err(WalError::Corrupt);
    }
    let mut value = vec![0u8; value_len];
    br.read_exact(&mut value).map_err(|_| WalError::Corrupt)?;

    match type_byte {
        TYPE_PUT => Ok(WalRecord::Put { key, value }),
        TYPE_DELETE => Ok(WalRecord::Delete { key }),
        _ => Err(WalError::Corrupt),
    }
}
