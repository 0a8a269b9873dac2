//! CHIP-8 ROM image loading.
//!
//! A `.ch8` file is a raw dump of program bytes loaded at 0x200. There is no
//! header and no checksum; the only possible validation is the size bound
//! imposed by the 4KB address space, and it happens here, before the machine
//! ever runs a cycle.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Total addressable memory.
pub const MEMORY_SIZE: usize = 4096;

/// Lowest address a program may occupy (0x000..0x200 is interpreter space).
pub const PROGRAM_START: usize = 0x200;

/// Largest loadable program: 4096 - 0x200 = 3584 bytes.
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - PROGRAM_START;

#[derive(Debug)]
pub enum RomError {
    /// The image is zero bytes long.
    Empty,
    /// The image exceeds the loadable region.
    TooLarge(usize),
    /// The image could not be read from disk.
    Io(io::Error),
}

impl fmt::Display for RomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "ROM image is empty"),
            Self::TooLarge(size) => write!(
                f,
                "ROM image is {size} bytes (at most {MAX_ROM_SIZE} fit above 0x200)",
            ),
            Self::Io(err) => write!(f, "failed to read ROM image: {err}"),
        }
    }
}

impl std::error::Error for RomError {}

impl From<io::Error> for RomError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// A validated CHIP-8 program image.
pub struct Rom {
    data: Vec<u8>,
}

impl Rom {
    /// Validate a raw byte buffer as a loadable program.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, RomError> {
        match data.len() {
            0 => Err(RomError::Empty),
            len if len > MAX_ROM_SIZE => Err(RomError::TooLarge(len)),
            _ => Ok(Self { data }),
        }
    }

    /// Read and validate a program image from disk.
    pub fn load(path: &Path) -> Result<Self, RomError> {
        Self::from_bytes(fs::read(path)?)
    }

    /// Program bytes, to be copied to memory starting at `PROGRAM_START`.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
