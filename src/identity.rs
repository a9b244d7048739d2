//! Content identity: a stable fingerprint of the input bytes.
//!
//! Every log line and every scratch-file name produced during one repair
//! call carries the same [`ContentId`], so a multi-stage failure can be
//! reconstructed after the fact from the log alone. The id is a SHA-256
//! digest — collision-resistant enough that two different uploads never
//! share a correlation key — but it is *only* a correlation key: nothing in
//! the pipeline makes a security decision based on it.

use sha2::{Digest, Sha256};
use std::fmt;
use std::io::{self, Read};

/// Digest input in bounded chunks so memory use stays independent of
/// document size.
const HASH_CHUNK: usize = 4096;

/// Deterministic fingerprint of a byte sequence.
///
/// Same bytes ⇒ same identifier; any single-byte change produces a different
/// identifier with overwhelming probability. Displays as 64 lowercase hex
/// characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentId([u8; 32]);

impl ContentId {
    /// Fingerprint an in-memory byte sequence.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        for chunk in bytes.chunks(HASH_CHUNK) {
            hasher.update(chunk);
        }
        Self(hasher.finalize().into())
    }

    /// Fingerprint a reader without buffering it whole.
    pub fn of_reader<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut hasher = Sha256::new();
        let mut buf = [0u8; HASH_CHUNK];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(Self(hasher.finalize().into()))
    }

    /// First 12 hex characters — used in scratch-directory names where the
    /// full digest would make paths unwieldy.
    pub fn short(&self) -> String {
        self.to_string()[..12].to_string()
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({self})")
    }
}
