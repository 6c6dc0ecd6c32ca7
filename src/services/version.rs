//! File version metadata for installed executables.
//!
//! The version shown for an installation is the file version embedded in the game
//! executable. [`FixedFileInfoProbe`] locates the fixed version block (signature
//! `0xFEEF04BD`) in the image and formats its file version as `major.minor.build.revision`.

use camino::Utf8Path;
use std::fs::File;
use std::io::{self, BufReader, Read};

const FIXED_FILE_INFO_SIGNATURE: [u8; 4] = 0xFEEF_04BDu32.to_le_bytes();

/// Signature plus the fields read after it
const BLOCK_PREFIX_LEN: usize = 16;

const CHUNK_SIZE: usize = 64 * 1024;

/// Look up the file version of an executable.
pub trait VersionProbe: Send + Sync {
    fn file_version(&self, path: &Utf8Path) -> Option<String>;
}

/// Reads the file version from the executable's fixed version block.
#[derive(Debug, Clone, Default)]
pub struct FixedFileInfoProbe;

impl FixedFileInfoProbe {
    pub fn new() -> Self {
        Self
    }
}

impl VersionProbe for FixedFileInfoProbe {
    fn file_version(&self, path: &Utf8Path) -> Option<String> {
        let version = File::open(path).and_then(|file| scan_fixed_file_version(BufReader::new(file)));
        match version {
            Ok(Some(version)) => Some(version),
            Ok(None) => {
                tracing::debug!(path = %path, "no version block found");
                None
            }
            Err(e) => {
                tracing::debug!(path = %path, "could not read version info: {}", e);
                None
            }
        }
    }
}

/// Stream `reader` in chunks and return the version of the first fixed version block.
///
/// Only the tail of the previous chunk is retained, so memory use does not grow with
/// the size of the executable.
pub fn scan_fixed_file_version<R: Read>(mut reader: R) -> io::Result<Option<String>> {
    let mut window: Vec<u8> = Vec::with_capacity(CHUNK_SIZE + BLOCK_PREFIX_LEN);
    let mut chunk = vec![0u8; CHUNK_SIZE];

    loop {
        let read = match reader.read(&mut chunk) {
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if read == 0 {
            return Ok(parse_fixed_file_version(&window));
        }
        window.extend_from_slice(&chunk[..read]);

        if let Some(version) = parse_fixed_file_version(&window) {
            return Ok(Some(version));
        }

        // Keep a DWORD-aligned tail long enough to hold a block cut at the chunk edge
        if window.len() > BLOCK_PREFIX_LEN {
            let drop = (window.len() - BLOCK_PREFIX_LEN) & !3;
            window.drain(..drop);
        }
    }
}

/// Extract `major.minor.build.revision` from the first fixed version block in `bytes`.
///
/// Layout after the signature: struct version (u32), file version MS (u32),
/// file version LS (u32), all little-endian. The block is DWORD aligned.
pub fn parse_fixed_file_version(bytes: &[u8]) -> Option<String> {
    let start = bytes
        .windows(4)
        .enumerate()
        .find(|(idx, window)| idx % 4 == 0 && *window == FIXED_FILE_INFO_SIGNATURE)
        .map(|(idx, _)| idx)?;

    let field = |offset: usize| -> Option<u32> {
        let slice = bytes.get(start + offset..start + offset + 4)?;
        Some(u32::from_le_bytes(slice.try_into().ok()?))
    };

    let ms = field(8)?;
    let ls = field(12)?;

    Some(format!("{}.{}.{}.{}", ms >> 16, ms & 0xFFFF, ls >> 16, ls & 0xFFFF))
}

/// A probe that never finds a version.
#[derive(Debug, Clone, Default)]
pub struct NoVersion;

impl VersionProbe for NoVersion {
    fn file_version(&self, _path: &Utf8Path) -> Option<String> {
        None
    }
}
