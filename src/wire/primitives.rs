//! Fixed-width and length-prefixed building blocks of the member wire format.
//!
//! Every multi-byte integer is big-endian.

use crate::util::errors::{IdentityError, Result};
use std::io::{Read, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

// Array length lead bytes
const NULL_ARRAY: u8 = 0xFF;
const SHORT_ARRAY_LEN: u8 = 0xFE;
const INT_ARRAY_LEN: u8 = 0xFD;
const MAX_BYTE_ARRAY_LEN: u8 = 0xFC;

// String header bytes
const NULL_STRING: u8 = 0x45;
const STRING_BYTES: u8 = 0x57;
const STRING: u8 = 0x2A;
const HUGE_STRING: u8 = 0x59;

pub fn write_u8<W: Write>(writer: &mut W, value: u8) -> Result<()> {
    writer.write_all(&[value])?;
    Ok(())
}

pub fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut buffer = [0u8; 1];
    reader.read_exact(&mut buffer)?;
    Ok(buffer[0])
}

pub fn write_i32<W: Write>(writer: &mut W, value: i32) -> Result<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

pub fn read_i32<R: Read>(reader: &mut R) -> Result<i32> {
    let mut buffer = [0u8; 4];
    reader.read_exact(&mut buffer)?;
    Ok(i32::from_be_bytes(buffer))
}

pub fn write_u64<W: Write>(writer: &mut W, value: u64) -> Result<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

pub fn read_u64<R: Read>(reader: &mut R) -> Result<u64> {
    let mut buffer = [0u8; 8];
    reader.read_exact(&mut buffer)?;
    Ok(u64::from_be_bytes(buffer))
}

/// Port written as a 4-byte signed int
pub fn write_port<W: Write>(writer: &mut W, port: u16) -> Result<()> {
    write_i32(writer, i32::from(port))
}

pub fn read_port<R: Read>(reader: &mut R, field: &str) -> Result<u16> {
    let raw = read_i32(reader)?;
    u16::try_from(raw)
        .map_err(|_| IdentityError::MalformedInput(format!("{} {} is out of range", field, raw)))
}

/// Write an array length, `None` meaning a null array.
pub fn write_array_len<W: Write>(writer: &mut W, len: Option<usize>) -> Result<()> {
    match len {
        None => writer.write_all(&[NULL_ARRAY])?,
        Some(len) if len <= MAX_BYTE_ARRAY_LEN as usize => writer.write_all(&[len as u8])?,
        Some(len) if len <= u16::MAX as usize => {
            writer.write_all(&[SHORT_ARRAY_LEN])?;
            writer.write_all(&(len as u16).to_be_bytes())?;
        }
        Some(len) => {
            let len = i32::try_from(len).map_err(|_| {
                IdentityError::InvalidState(format!("array length {} does not fit the wire", len))
            })?;
            writer.write_all(&[INT_ARRAY_LEN])?;
            writer.write_all(&len.to_be_bytes())?;
        }
    }
    Ok(())
}

/// Read an array length. Negative or over-limit lengths are corrupt data.
pub fn read_array_len<R: Read>(reader: &mut R, max_len: usize) -> Result<Option<usize>> {
    let lead = read_u8(reader)?;
    let len = match lead {
        NULL_ARRAY => return Ok(None),
        SHORT_ARRAY_LEN => {
            let mut buffer = [0u8; 2];
            reader.read_exact(&mut buffer)?;
            u16::from_be_bytes(buffer) as usize
        }
        INT_ARRAY_LEN => {
            let raw = read_i32(reader)?;
            usize::try_from(raw).map_err(|_| {
                IdentityError::MalformedInput(format!("negative array length {}", raw))
            })?
        }
        len if len <= MAX_BYTE_ARRAY_LEN => len as usize,
        other => {
            return Err(IdentityError::MalformedInput(format!(
                "unexpected array length code {:#04x}",
                other
            )))
        }
    };

    check_len(len, max_len)?;
    Ok(Some(len))
}

fn check_len(len: usize, max_len: usize) -> Result<()> {
    if len > max_len {
        return Err(IdentityError::MalformedInput(format!(
            "length {} exceeds limit {}",
            len, max_len
        )));
    }
    Ok(())
}

fn read_bytes<R: Read>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; len];
    reader.read_exact(&mut buffer)?;
    Ok(buffer)
}

/// Address as a length-prefixed octet array; `None` is written as null.
pub fn write_address<W: Write>(writer: &mut W, address: Option<IpAddr>) -> Result<()> {
    match address {
        None => write_array_len(writer, None),
        Some(IpAddr::V4(v4)) => {
            write_array_len(writer, Some(4))?;
            writer.write_all(&v4.octets())?;
            Ok(())
        }
        Some(IpAddr::V6(v6)) => {
            write_array_len(writer, Some(16))?;
            writer.write_all(&v6.octets())?;
            Ok(())
        }
    }
}

pub fn read_address<R: Read>(reader: &mut R) -> Result<Option<IpAddr>> {
    let len = match read_array_len(reader, 16)? {
        None => return Ok(None),
        Some(len) => len,
    };

    match len {
        4 => {
            let mut octets = [0u8; 4];
            reader.read_exact(&mut octets)?;
            Ok(Some(IpAddr::V4(Ipv4Addr::from(octets))))
        }
        16 => {
            let mut octets = [0u8; 16];
            reader.read_exact(&mut octets)?;
            Ok(Some(IpAddr::V6(Ipv6Addr::from(octets))))
        }
        other => Err(IdentityError::MalformedInput(format!(
            "address length {} is neither 4 nor 16",
            other
        ))),
    }
}

/// Nullable string with a one-byte header selecting the length width.
pub fn write_string<W: Write>(writer: &mut W, value: Option<&str>) -> Result<()> {
    let value = match value {
        None => return write_u8(writer, NULL_STRING),
        Some(value) => value,
    };

    let bytes = value.as_bytes();
    if bytes.len() <= u16::MAX as usize {
        let header = if value.is_ascii() { STRING_BYTES } else { STRING };
        write_u8(writer, header)?;
        writer.write_all(&(bytes.len() as u16).to_be_bytes())?;
    } else {
        let len = i32::try_from(bytes.len()).map_err(|_| {
            IdentityError::InvalidState(format!("string of {} bytes is too long", bytes.len()))
        })?;
        write_u8(writer, HUGE_STRING)?;
        write_i32(writer, len)?;
    }
    writer.write_all(bytes)?;
    Ok(())
}

pub fn read_string<R: Read>(reader: &mut R, max_len: usize) -> Result<Option<String>> {
    let header = read_u8(reader)?;
    let len = match header {
        NULL_STRING => return Ok(None),
        STRING_BYTES | STRING => {
            let mut buffer = [0u8; 2];
            reader.read_exact(&mut buffer)?;
            u16::from_be_bytes(buffer) as usize
        }
        HUGE_STRING => {
            let raw = read_i32(reader)?;
            usize::try_from(raw).map_err(|_| {
                IdentityError::MalformedInput(format!("negative string length {}", raw))
            })?
        }
        other => {
            return Err(IdentityError::MalformedInput(format!(
                "unexpected string header {:#04x}",
                other
            )))
        }
    };

    check_len(len, max_len)?;
    let bytes = read_bytes(reader, len)?;
    if header == STRING_BYTES && !bytes.is_ascii() {
        return Err(IdentityError::MalformedInput(
            "non-ASCII bytes under an ASCII string header".to_string(),
        ));
    }
    Ok(Some(String::from_utf8(bytes)?))
}

/// String array; elements are never null.
pub fn write_string_array<W: Write>(writer: &mut W, values: &[String]) -> Result<()> {
    write_array_len(writer, Some(values.len()))?;
    for value in values {
        write_string(writer, Some(value))?;
    }
    Ok(())
}

/// A null array reads as empty.
pub fn read_string_array<R: Read>(reader: &mut R, max_len: usize) -> Result<Vec<String>> {
    let len = match read_array_len(reader, max_len)? {
        None => return Ok(Vec::new()),
        Some(len) => len,
    };

    // capacity is capped so a lying prefix cannot force a huge allocation
    let mut values = Vec::with_capacity(len.min(64));
    for idx in 0..len {
        match read_string(reader, max_len)? {
            Some(value) => values.push(value),
            None => {
                return Err(IdentityError::MalformedInput(format!(
                    "null element at index {} of string array",
                    idx
                )))
            }
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: usize = 1024 * 1024;

    #[test]
    fn test_array_len_forms() {
        let mut buffer = Vec::new();
        write_array_len(&mut buffer, Some(4)).unwrap();
        write_array_len(&mut buffer, Some(300)).unwrap();
        write_array_len(&mut buffer, Some(70_000)).unwrap();
        write_array_len(&mut buffer, None).unwrap();

        assert_eq!(&buffer[..4], &[4, SHORT_ARRAY_LEN, 0x01, 0x2C]);

        let mut reader = buffer.as_slice();
        assert_eq!(read_array_len(&mut reader, LIMIT).unwrap(), Some(4));
        assert_eq!(read_array_len(&mut reader, LIMIT).unwrap(), Some(300));
        assert_eq!(read_array_len(&mut reader, LIMIT).unwrap(), Some(70_000));
        assert_eq!(read_array_len(&mut reader, LIMIT).unwrap(), None);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_negative_int_length_is_malformed() {
        let mut buffer = vec![INT_ARRAY_LEN];
        buffer.extend_from_slice(&(-5i32).to_be_bytes());

        assert!(matches!(
            read_array_len(&mut buffer.as_slice(), LIMIT),
            Err(IdentityError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_oversized_length_is_malformed() {
        let mut buffer = Vec::new();
        write_array_len(&mut buffer, Some(5000)).unwrap();

        assert!(matches!(
            read_array_len(&mut buffer.as_slice(), 1000),
            Err(IdentityError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_address_of_wrong_length_is_malformed() {
        let buffer = vec![5u8, 1, 2, 3, 4, 5];
        assert!(matches!(
            read_address(&mut buffer.as_slice()),
            Err(IdentityError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_null_address() {
        let mut buffer = Vec::new();
        write_address(&mut buffer, None).unwrap();
        assert_eq!(buffer, vec![NULL_ARRAY]);
        assert_eq!(read_address(&mut buffer.as_slice()).unwrap(), None);
    }

    #[test]
    fn test_string_headers() {
        let mut buffer = Vec::new();
        write_string(&mut buffer, Some("abc")).unwrap();
        assert_eq!(buffer, vec![STRING_BYTES, 0, 3, b'a', b'b', b'c']);

        let mut buffer = Vec::new();
        write_string(&mut buffer, Some("é")).unwrap();
        assert_eq!(buffer[0], STRING);
        assert_eq!(
            read_string(&mut buffer.as_slice(), LIMIT).unwrap().as_deref(),
            Some("é")
        );

        let mut buffer = Vec::new();
        write_string(&mut buffer, None).unwrap();
        assert_eq!(read_string(&mut buffer.as_slice(), LIMIT).unwrap(), None);
    }

    #[test]
    fn test_huge_string() {
        let long = "x".repeat(70_000);
        let mut buffer = Vec::new();
        write_string(&mut buffer, Some(&long)).unwrap();
        assert_eq!(buffer[0], HUGE_STRING);

        let read = read_string(&mut buffer.as_slice(), LIMIT).unwrap().unwrap();
        assert_eq!(read.len(), 70_000);
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let buffer = vec![STRING, 0, 2, 0xC3, 0x28];
        assert!(matches!(
            read_string(&mut buffer.as_slice(), LIMIT),
            Err(IdentityError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_unknown_string_header_is_malformed() {
        let buffer = vec![0x01u8, 0, 0];
        assert!(matches!(
            read_string(&mut buffer.as_slice(), LIMIT),
            Err(IdentityError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_string_array_null_reads_empty() {
        let buffer = vec![NULL_ARRAY];
        assert!(read_string_array(&mut buffer.as_slice(), LIMIT)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_string_array_with_null_element_is_malformed() {
        let buffer = vec![1u8, NULL_STRING];
        assert!(matches!(
            read_string_array(&mut buffer.as_slice(), LIMIT),
            Err(IdentityError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_port_out_of_range_is_malformed() {
        let buffer = 70_000i32.to_be_bytes();
        assert!(matches!(
            read_port(&mut &buffer[..], "membership port"),
            Err(IdentityError::MalformedInput(_))
        ));
    }
}
