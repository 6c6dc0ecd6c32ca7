//! Executable addressing-mode classification.
//!
//! Only the handful of header fields needed to tell 32-bit, large-address-aware 32-bit
//! and 64-bit images apart are read. The layout walked here is fixed:
//!
//! | Offset              | Width | Field                                   |
//! |---------------------|-------|-----------------------------------------|
//! | `0x00`              | 2     | legacy signature, must be `MZ` (0x5A4D) |
//! | `0x3C`              | 4     | offset of the extended header (`pe`)    |
//! | `pe`                | 4     | signature, must be `PE\0\0` (0x4550)    |
//! | `pe + 0x04`         | 2     | machine type                            |
//! | `pe + 0x04 + 0x12`  | 2     | characteristics                         |
//!
//! Every failure (missing file, truncated header, bad signature) classifies the image as
//! [`AddressingMode::Unknown`]; nothing is propagated to the caller.

use camino::Utf8Path;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};

const LEGACY_SIGNATURE: u16 = 0x5A4D; // MZ
const EXTENDED_HEADER_POINTER: u64 = 0x3C;
const EXTENDED_SIGNATURE: u32 = 0x0000_4550; // PE\0\0
const COFF_FIXED_FIELDS: i64 = 0x12;
const MACHINE_AMD64: u16 = 0x8664;
const LARGE_ADDRESS_AWARE: u16 = 0x0020;

/// Memory addressing mode of an executable image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressingMode {
    #[default]
    Unknown,
    ThirtyTwoBit,
    ThirtyTwoBitLargeAddressAware,
    SixtyFourBit,
}

impl AddressingMode {
    /// True when the process may use more than 2GB of virtual address space.
    pub fn is_large_address_aware(self) -> bool {
        matches!(
            self,
            AddressingMode::ThirtyTwoBitLargeAddressAware | AddressingMode::SixtyFourBit
        )
    }
}

impl fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressingMode::Unknown => write!(f, "unknown"),
            AddressingMode::ThirtyTwoBit => write!(f, "32-bit"),
            AddressingMode::ThirtyTwoBitLargeAddressAware => write!(f, "32-bit (large address aware)"),
            AddressingMode::SixtyFourBit => write!(f, "64-bit"),
        }
    }
}

/// Classify the executable at `path`.
///
/// The file handle is scoped to this call and closed on every return path.
pub fn inspect(path: &Utf8Path) -> AddressingMode {
    let result = File::open(path).and_then(|file| classify(BufReader::new(file)));

    match result {
        Ok(mode) => {
            tracing::debug!("Classified {} as {}", path, mode);
            mode
        }
        Err(e) => {
            tracing::debug!("Could not classify {}: {}", path, e);
            AddressingMode::Unknown
        }
    }
}

/// Classify an image from any seekable byte source.
///
/// Returns `Ok(Unknown)` for a readable but unrecognised image and `Err` when the
/// header cannot be read at all; [`inspect`] folds both into `Unknown`.
pub fn classify<R: Read + Seek>(mut reader: R) -> io::Result<AddressingMode> {
    if read_u16(&mut reader)? != LEGACY_SIGNATURE {
        return Ok(AddressingMode::Unknown);
    }

    reader.seek(SeekFrom::Start(EXTENDED_HEADER_POINTER))?;
    let header_offset = read_u32(&mut reader)?;

    reader.seek(SeekFrom::Start(u64::from(header_offset)))?;
    if read_u32(&mut reader)? != EXTENDED_SIGNATURE {
        return Ok(AddressingMode::Unknown);
    }

    // Machine type opens the fixed COFF block; characteristics follow it.
    let machine = read_u16(&mut reader)?;
    reader.seek(SeekFrom::Current(COFF_FIXED_FIELDS - 2))?;
    let characteristics = read_u16(&mut reader)?;

    let mode = if characteristics & LARGE_ADDRESS_AWARE == LARGE_ADDRESS_AWARE {
        AddressingMode::ThirtyTwoBitLargeAddressAware
    } else if machine == MACHINE_AMD64 {
        AddressingMode::SixtyFourBit
    } else {
        AddressingMode::ThirtyTwoBit
    };

    Ok(mode)
}

fn read_u16<R: Read>(reader: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    const PE_OFFSET: usize = 0x80;

    /// Minimal image: MZ stub, pointer at 0x3C, PE signature and a COFF header.
    fn image(machine: u16, characteristics: u16) -> Vec<u8> {
        let mut bytes = vec![0u8; PE_OFFSET + 24];
        bytes[0..2].copy_from_slice(b"MZ");
        bytes[0x3C..0x40].copy_from_slice(&(PE_OFFSET as u32).to_le_bytes());
        bytes[PE_OFFSET..PE_OFFSET + 4].copy_from_slice(b"PE\0\0");
        bytes[PE_OFFSET + 4..PE_OFFSET + 6].copy_from_slice(&machine.to_le_bytes());
        bytes[PE_OFFSET + 22..PE_OFFSET + 24].copy_from_slice(&characteristics.to_le_bytes());
        bytes
    }

    #[test]
    fn test_large_address_aware_bit() {
        let mode = classify(Cursor::new(image(0x014C, 0x0122))).unwrap();
        assert_eq!(mode, AddressingMode::ThirtyTwoBitLargeAddressAware);
    }

    #[test]
    fn test_amd64_without_bit() {
        let mode = classify(Cursor::new(image(MACHINE_AMD64, 0x0002))).unwrap();
        assert_eq!(mode, AddressingMode::SixtyFourBit);
    }

    #[test]
    fn test_amd64_with_bit_reports_large_address_aware() {
        let mode = classify(Cursor::new(image(MACHINE_AMD64, 0x0022))).unwrap();
        assert_eq!(mode, AddressingMode::ThirtyTwoBitLargeAddressAware);
        assert!(mode.is_large_address_aware());
    }

    #[test]
    fn test_plain_i386() {
        let mode = classify(Cursor::new(image(0x014C, 0x0102))).unwrap();
        assert_eq!(mode, AddressingMode::ThirtyTwoBit);
        assert!(!mode.is_large_address_aware());
    }

    #[test]
    fn test_missing_legacy_signature() {
        let mut bytes = image(0x014C, 0x0020);
        bytes[0] = b'Z';
        assert_eq!(classify(Cursor::new(bytes)).unwrap(), AddressingMode::Unknown);
    }

    #[test]
    fn test_bad_extended_signature() {
        let mut bytes = image(0x014C, 0x0020);
        bytes[PE_OFFSET + 1] = b'X';
        assert_eq!(classify(Cursor::new(bytes)).unwrap(), AddressingMode::Unknown);
    }

    #[test]
    fn test_truncated_header_is_error() {
        let bytes = image(0x014C, 0x0020);
        assert!(classify(Cursor::new(&bytes[..PE_OFFSET + 10])).is_err());
        assert!(classify(Cursor::new(&bytes[..1])).is_err());
    }

    #[test]
    fn test_pointer_past_end_is_error() {
        let mut bytes = image(0x014C, 0x0020);
        bytes[0x3C..0x40].copy_from_slice(&0x7FFF_FFF0u32.to_le_bytes());
        assert!(classify(Cursor::new(bytes)).is_err());
    }

    #[test]
    fn test_inspect_missing_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = camino::Utf8PathBuf::try_from(temp_dir.path().join("missing.exe")).unwrap();
        assert_eq!(inspect(&path), AddressingMode::Unknown);
    }

    proptest! {
        #[test]
        fn prop_arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let _ = classify(Cursor::new(bytes));
        }

        #[test]
        fn prop_without_mz_is_unknown(first in any::<u8>(), rest in proptest::collection::vec(any::<u8>(), 1..256)) {
            prop_assume!(first != b'M');
            let mut bytes = vec![first];
            bytes.extend(rest);
            prop_assert_eq!(classify(Cursor::new(bytes)).unwrap(), AddressingMode::Unknown);
        }
    }
}
