use crate::util::errors::{IdentityError, Result};
use std::io::{Read, Write};

/// Lead byte announcing that a full i16 ordinal follows
const TOKEN_ORDINAL: u8 = 0xFF;

/// Largest ordinal that fits the single-byte form
const MAX_COMPACT_ORDINAL: i16 = 127;

/// A wire protocol revision known to this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    name: &'static str,
    ordinal: i16,
}

impl Version {
    pub const V1_0: Version = Version::new("1.0", 1);
    pub const V1_1: Version = Version::new("1.1", 5);
    pub const V2_0: Version = Version::new("2.0", 100);
    /// First revision whose ordinal needs the three-byte form
    pub const V2_1: Version = Version::new("2.1", 150);

    pub const CURRENT: Version = Version::V2_1;

    /// Every revision this reader can decode, oldest first
    pub const KNOWN: [Version; 4] = [Version::V1_0, Version::V1_1, Version::V2_0, Version::V2_1];

    const fn new(name: &'static str, ordinal: i16) -> Self {
        Self { name, ordinal }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ordinal(&self) -> i16 {
        self.ordinal
    }

    pub fn from_ordinal(ordinal: i16) -> Option<Version> {
        Self::KNOWN
            .iter()
            .find(|version| version.ordinal == ordinal)
            .copied()
    }

    /// Resolve an ordinal or fail with `IncompatibleVersion`
    pub fn require(ordinal: i16) -> Result<Version> {
        Self::from_ordinal(ordinal).ok_or(IdentityError::IncompatibleVersion(ordinal))
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (ordinal {})", self.name, self.ordinal)
    }
}

/// Write a version ordinal in variable-width form: one byte for 0..=127,
/// otherwise the token byte followed by a big-endian i16.
pub fn write_ordinal<W: Write>(writer: &mut W, ordinal: i16) -> Result<()> {
    if (0..=MAX_COMPACT_ORDINAL).contains(&ordinal) {
        writer.write_all(&[ordinal as u8])?;
    } else {
        writer.write_all(&[TOKEN_ORDINAL])?;
        writer.write_all(&ordinal.to_be_bytes())?;
    }
    Ok(())
}

pub fn read_ordinal<R: Read>(reader: &mut R) -> Result<i16> {
    let mut lead = [0u8; 1];
    reader.read_exact(&mut lead)?;

    if lead[0] == TOKEN_ORDINAL {
        let mut wide = [0u8; 2];
        reader.read_exact(&mut wide)?;
        Ok(i16::from_be_bytes(wide))
    } else {
        // single-byte form carries a signed byte
        Ok(i16::from(lead[0] as i8))
    }
}
