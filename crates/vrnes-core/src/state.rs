//! Versioned binary snapshots.
//!
//! A snapshot is a leading version byte followed by postcard-encoded
//! component records. Components append their records in a fixed order and
//! read them back in the same order; the reader refuses unknown versions
//! before any record is decoded.

use serde::{Serialize, de::DeserializeOwned};

use crate::Error;

/// Current snapshot format revision.
pub const STATE_VERSION: u8 = 1;

/// Append-only snapshot encoder.
#[derive(Debug)]
pub struct StateWriter {
    buf: Vec<u8>,
}

impl StateWriter {
    /// Starts a snapshot with the version byte already written.
    pub fn new() -> Self {
        Self {
            buf: vec![STATE_VERSION],
        }
    }

    /// Appends one record.
    pub fn put<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        let buf = core::mem::take(&mut self.buf);
        self.buf = postcard::to_extend(value, buf)?;
        Ok(())
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for StateWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Sequential snapshot decoder.
#[derive(Debug)]
pub struct StateReader<'a> {
    rest: &'a [u8],
}

impl<'a> StateReader<'a> {
    /// Validates the version byte and positions the reader on the first record.
    pub fn new(bytes: &'a [u8]) -> Result<Self, Error> {
        let (&version, rest) = bytes.split_first().ok_or(Error::EmptyState)?;
        if version != STATE_VERSION {
            return Err(Error::UnsupportedStateVersion(version));
        }
        Ok(Self { rest })
    }

    /// Decodes the next record.
    pub fn take<T: DeserializeOwned>(&mut self) -> Result<T, Error> {
        let (value, rest) = postcard::take_from_bytes(self.rest)?;
        self.rest = rest;
        Ok(value)
    }

    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_come_back_in_order() {
        let mut out = StateWriter::new();
        out.put(&7u8).unwrap();
        out.put(&vec![1u16, 2, 3]).unwrap();
        let bytes = out.finish();
        assert_eq!(bytes[0], STATE_VERSION);

        let mut input = StateReader::new(&bytes).unwrap();
        assert_eq!(input.take::<u8>().unwrap(), 7);
        assert_eq!(input.take::<Vec<u16>>().unwrap(), vec![1, 2, 3]);
        assert!(input.is_empty());
    }

    #[test]
    fn unknown_version_is_rejected() {
        let err = StateReader::new(&[2, 0, 0]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedStateVersion(2)));
        assert!(matches!(
            StateReader::new(&[]).unwrap_err(),
            Error::EmptyState
        ));
    }

    #[test]
    fn truncated_record_fails_to_decode() {
        let mut out = StateWriter::new();
        out.put(&vec![0xABu8; 32]).unwrap();
        let mut bytes = out.finish();
        bytes.truncate(10);
        let mut input = StateReader::new(&bytes).unwrap();
        assert!(matches!(
            input.take::<Vec<u8>>().unwrap_err(),
            Error::StateDecode(_)
        ));
    }
}
