//! Streaming SHA-256 file digests.

use crate::error::{SortError, SortResult};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Bytes read per block; memory use stays bounded regardless of file size.
pub const BLOCK_SIZE: usize = 64 * 1024;

/// Returns the lowercase hex SHA-256 digest of a file's contents.
pub fn file_digest(path: &Path) -> SortResult<String> {
    let checksum_error = |e| SortError::Checksum {
        path: path.to_path_buf(),
        source: e,
    };

    let mut file = File::open(path).map_err(checksum_error)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BLOCK_SIZE];
    loop {
        match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buffer[..n]),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(checksum_error(e)),
        }
    }
    Ok(hex::encode(hasher.finalize()))
}
