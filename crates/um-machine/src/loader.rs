//! Program image loading.
//!
//! A program image is a sequence of 32-bit instruction words encoded
//! big-endian (byte 0 = bits 31..24). The whole file becomes segment 0, in
//! order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open program file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("program file {path} is {len} bytes; expected a positive multiple of 4")]
    BadLength { path: PathBuf, len: u64 },
}

/// Reads a program image into instruction words.
///
/// Fails before execution begins if the file cannot be read or its size is
/// not a positive multiple of 4.
pub fn load_program(path: &Path) -> Result<Vec<u32>, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.is_empty() || bytes.len() % 4 != 0 {
        return Err(LoadError::BadLength {
            path: path.to_path_buf(),
            len: bytes.len() as u64,
        });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|group| u32::from_be_bytes([group[0], group[1], group[2], group[3]]))
        .collect())
}
