//! Versioned binary layout of a [`MemberIdentity`].
//!
//! | # | field                 | encoding                         |
//! |---|-----------------------|----------------------------------|
//! | 1 | version ordinal       | 1 or 3 bytes, see `version`      |
//! | 2 | flags                 | i32, bit 0 partition detection, bit 1 preferred coordinator |
//! | 3 | address               | array length + 4 or 16 octets    |
//! | 4 | membership port       | i32                              |
//! | 5 | view id               | i32                              |
//! | 6 | direct port           | i32                              |
//! | 7 | weight                | u8                               |
//! | 8 | process id            | i32                              |
//! | 9 | kind                  | i32                              |
//! | 10| name                  | nullable string                  |
//! | 11| groups                | string array                     |
//! | 12| logical id high half  | u64                              |
//! | 13| logical id low half   | u64                              |
//!
//! Fields 12 and 13 on their own form the logical-id encoding.

use super::primitives::{
    read_address, read_i32, read_port, read_string, read_string_array, read_u64, read_u8,
    write_address, write_i32, write_port, write_string, write_string_array, write_u64, write_u8,
};
use super::version::{read_ordinal, write_ordinal, Version};
use crate::config;
use crate::member::{MemberIdentity, MemberKind};
use crate::util::errors::{IdentityError, Result};
use std::io::{Read, Write};

pub const PARTITION_DETECTION_FLAG: i32 = 0x01;
pub const PREFERRED_COORDINATOR_FLAG: i32 = 0x02;
const KNOWN_FLAGS: i32 = PARTITION_DETECTION_FLAG | PREFERRED_COORDINATOR_FLAG;

/// Size in bytes of the logical-id encoding
pub const LOGICAL_ID_LEN: usize = 16;

pub fn encode<W: Write>(identity: &MemberIdentity, writer: &mut W) -> Result<()> {
    if Version::from_ordinal(identity.version).is_none() {
        return Err(IdentityError::InvalidState(format!(
            "cannot encode member with unknown version ordinal {}",
            identity.version
        )));
    }

    write_ordinal(writer, identity.version)?;

    let mut flags = 0;
    if identity.partition_detection {
        flags |= PARTITION_DETECTION_FLAG;
    }
    if identity.preferred_coordinator {
        flags |= PREFERRED_COORDINATOR_FLAG;
    }
    write_i32(writer, flags)?;

    write_address(writer, identity.address)?;
    write_port(writer, identity.membership_port)?;
    write_i32(writer, identity.view_id)?;
    write_port(writer, identity.direct_port)?;
    write_u8(writer, identity.weight)?;
    write_i32(writer, identity.process_id)?;
    write_i32(writer, identity.kind.as_i32())?;
    write_string(writer, identity.name.as_deref())?;
    write_string_array(writer, &identity.groups)?;
    encode_logical_id(identity, writer)
}

pub fn encode_to_vec(identity: &MemberIdentity) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(64);
    encode(identity, &mut buffer)?;
    Ok(buffer)
}

/// Decode using the process-wide length limit.
pub fn decode<R: Read>(reader: &mut R) -> Result<MemberIdentity> {
    decode_with_limit(reader, config::current().max_array_len)
}

/// Decode one identity. On any error nothing is returned; there is no
/// partially populated result.
pub fn decode_with_limit<R: Read>(reader: &mut R, max_len: usize) -> Result<MemberIdentity> {
    let ordinal = read_ordinal(reader)?;
    let version = match Version::require(ordinal) {
        Ok(version) => version,
        Err(err) => {
            tracing::warn!("Rejecting member encoding with unknown version ordinal {}", ordinal);
            return Err(err);
        }
    };

    // Every known revision shares one layout so far.
    match version {
        Version::V1_0 | Version::V1_1 | Version::V2_0 | Version::V2_1 => {
            decode_fields(version, reader, max_len)
        }
        other => Err(IdentityError::IncompatibleVersion(other.ordinal())),
    }
}

fn decode_fields<R: Read>(version: Version, reader: &mut R, max_len: usize) -> Result<MemberIdentity> {
    let flags = read_i32(reader)?;
    if flags & !KNOWN_FLAGS != 0 {
        tracing::debug!("Ignoring reserved member flag bits {:#x}", flags & !KNOWN_FLAGS);
    }

    let address = read_address(reader)?;
    let membership_port = read_port(reader, "membership port")?;
    let view_id = read_i32(reader)?;
    let direct_port = read_port(reader, "direct port")?;
    let weight = read_u8(reader)?;
    let process_id = read_i32(reader)?;
    let kind = MemberKind::from_i32(read_i32(reader)?);
    let name = read_string(reader, max_len)?;
    let groups = read_string_array(reader, max_len)?;
    let (logical_id_high, logical_id_low) = decode_logical_id(reader)?;

    let identity = MemberIdentity {
        address,
        membership_port,
        direct_port,
        process_id,
        view_id,
        kind,
        weight,
        preferred_coordinator: flags & PREFERRED_COORDINATOR_FLAG != 0,
        partition_detection: flags & PARTITION_DETECTION_FLAG != 0,
        version: version.ordinal(),
        logical_id_high,
        logical_id_low,
        name,
        groups,
    };

    tracing::debug!("Decoded {} with wire version {}", identity.summary(false), version);

    Ok(identity)
}

/// Decode a buffer holding exactly one identity.
pub fn decode_from_slice(bytes: &[u8]) -> Result<MemberIdentity> {
    let mut reader = bytes;
    let identity = decode(&mut reader)?;
    if !reader.is_empty() {
        return Err(IdentityError::MalformedInput(format!(
            "{} trailing bytes after member encoding",
            reader.len()
        )));
    }
    Ok(identity)
}

/// Write only the logical-id halves, same layout as the tail of `encode`.
pub fn encode_logical_id<W: Write>(identity: &MemberIdentity, writer: &mut W) -> Result<()> {
    write_u64(writer, identity.logical_id_high)?;
    write_u64(writer, identity.logical_id_low)
}

/// Read the `(high, low)` logical-id halves.
pub fn decode_logical_id<R: Read>(reader: &mut R) -> Result<(u64, u64)> {
    let high = read_u64(reader)?;
    let low = read_u64(reader)?;
    Ok((high, low))
}

impl MemberIdentity {
    pub fn encode<W: Write>(&self, writer: &mut W) -> Result<()> {
        encode(self, writer)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode_to_vec(self)
    }

    pub fn decode<R: Read>(reader: &mut R) -> Result<MemberIdentity> {
        decode(reader)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<MemberIdentity> {
        decode_from_slice(bytes)
    }

    pub fn encode_logical_id<W: Write>(&self, writer: &mut W) -> Result<()> {
        encode_logical_id(self, writer)
    }

    /// Replace this member's logical id with one read off the wire.
    pub fn read_logical_id<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        let (high, low) = decode_logical_id(reader)?;
        self.set_logical_id_halves(high, low);
        Ok(())
    }
}
