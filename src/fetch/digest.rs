//! Incremental digests and the verifying stream copy.

use std::fmt;
use std::io::{self, Read, Write};

use md5::Md5;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Hash family used to verify downloaded content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DigestAlgorithm {
    /// MD5, the digest recorded by the content registry
    #[default]
    Md5,
    /// SHA-256
    Sha256,
}

impl DigestAlgorithm {
    /// Start a new incremental digest of this kind.
    pub fn hasher(self) -> StreamingDigest {
        match self {
            DigestAlgorithm::Md5 => StreamingDigest::Md5(Md5::new()),
            DigestAlgorithm::Sha256 => StreamingDigest::Sha256(Sha256::new()),
        }
    }

    /// Hex digest of a complete byte slice (uppercase).
    pub fn digest_hex(self, data: &[u8]) -> String {
        let mut hasher = self.hasher();
        hasher.update(data);
        hasher.finalize_hex()
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DigestAlgorithm::Md5 => f.write_str("md5sum"),
            DigestAlgorithm::Sha256 => f.write_str("sha256sum"),
        }
    }
}

/// A digest being computed chunk by chunk.
#[derive(Clone)]
pub enum StreamingDigest {
    Md5(Md5),
    Sha256(Sha256),
}

impl StreamingDigest {
    /// Feed the next chunk.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            StreamingDigest::Md5(h) => h.update(data),
            StreamingDigest::Sha256(h) => h.update(data),
        }
    }

    /// Consume the digest and return it as uppercase hex.
    pub fn finalize_hex(self) -> String {
        match self {
            StreamingDigest::Md5(h) => hex::encode_upper(h.finalize()),
            StreamingDigest::Sha256(h) => hex::encode_upper(h.finalize()),
        }
    }

    fn algorithm(&self) -> DigestAlgorithm {
        match self {
            StreamingDigest::Md5(_) => DigestAlgorithm::Md5,
            StreamingDigest::Sha256(_) => DigestAlgorithm::Sha256,
        }
    }
}

/// What a verifying copy should compare against.
#[derive(Debug, Clone, Copy)]
pub struct ExpectedDigest<'a> {
    pub algorithm: DigestAlgorithm,
    pub hex: &'a str,
}

/// Copy `reader` into `writer` in `chunk_size` pieces.
///
/// When `expected` is set, every chunk is hashed before it is written and the
/// final digest is compared case-insensitively once the reader is exhausted.
/// On mismatch the writer has already received every byte.
///
/// Returns the number of bytes copied.
pub fn copy_with_digest<R, W>(
    reader: &mut R,
    writer: &mut W,
    chunk_size: usize,
    expected: Option<ExpectedDigest<'_>>,
) -> Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut hasher = expected.map(|e| e.algorithm.hasher());
    let mut copied = 0u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        if let Some(h) = hasher.as_mut() {
            h.update(&buf[..n]);
        }
        writer.write_all(&buf[..n])?;
        copied += n as u64;
    }
    writer.flush()?;

    if let (Some(h), Some(expected)) = (hasher, expected) {
        verify(h, expected.hex)?;
    }

    Ok(copied)
}

fn verify(hasher: StreamingDigest, expected: &str) -> Result<()> {
    let algorithm = hasher.algorithm();
    let computed = hasher.finalize_hex();
    if computed.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(Error::Checksum {
            algorithm,
            computed,
            expected: expected.to_string(),
        })
    }
}
