//! Native reader for NetCDF classic headers
//!
//! Covers the classic (`CDF\x01`), 64-bit offset (`CDF\x02`) and 64-bit data
//! (`CDF\x05`) formats. Only the header is read: magic, record count,
//! dimension list and global attribute list. Text-valued global attributes
//! are returned; numeric attributes are skipped.
//!
//! ## Header layout (all integers big-endian)
//!
//! - 4 bytes: magic `CDF` + version
//! - numrecs: 4 bytes (8 for `CDF\x05`)
//! - dim_list: tag `0x0A` + count, or `0` + `0` when absent
//! - gatt_list: tag `0x0C` + count, or `0` + `0` when absent
//!
//! Names are length-prefixed and padded to 4 bytes; attribute values are
//! `nelems` items of the attribute type, also padded to 4 bytes.

use byteorder::{BigEndian, ReadBytesExt};
use std::collections::BTreeMap;
use std::io::{self, Read};

/// Magic prefix shared by every classic variant
pub const MAGIC_PREFIX: &[u8; 3] = b"CDF";

const NC_DIMENSION: u32 = 0x0A;
const NC_ATTRIBUTE: u32 = 0x0C;
const NC_CHAR: u32 = 2;

/// Longest name or text value accepted before the header is declared corrupt
const MAX_TEXT_LEN: u64 = 1 << 20;

/// Classic format variant, from the fourth magic byte
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassicVersion {
    /// `CDF\x01`
    Classic,
    /// `CDF\x02`
    Offset64,
    /// `CDF\x05`
    Data64,
}

impl ClassicVersion {
    /// Variant for a magic number, if it is a classic one
    pub fn from_magic(magic: &[u8]) -> Option<Self> {
        match magic {
            [b'C', b'D', b'F', 1, ..] => Some(Self::Classic),
            [b'C', b'D', b'F', 2, ..] => Some(Self::Offset64),
            [b'C', b'D', b'F', 5, ..] => Some(Self::Data64),
            _ => None,
        }
    }

    fn wide_counts(self) -> bool {
        self == Self::Data64
    }
}

/// Read the text-valued global attributes of a classic header
///
/// The reader must be positioned at the start of the file.
///
/// # Errors
///
/// Returns an [`io::ErrorKind::InvalidData`] error if the magic is not a
/// classic one or the header is malformed, and
/// [`io::ErrorKind::UnexpectedEof`] if it is truncated.
pub fn read_text_attributes<R: Read>(mut reader: R) -> io::Result<BTreeMap<String, String>> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    let version = ClassicVersion::from_magic(&magic)
        .ok_or_else(|| invalid(format!("not a NetCDF classic header: {:?}", magic)))?;

    let mut header = Header { reader, version };
    header.count()?; // numrecs

    header.skip_dimensions()?;
    header.text_attributes()
}

struct Header<R> {
    reader: R,
    version: ClassicVersion,
}

impl<R: Read> Header<R> {
    /// Element count or length, 4 or 8 bytes wide depending on the version
    fn count(&mut self) -> io::Result<u64> {
        if self.version.wide_counts() {
            self.reader.read_u64::<BigEndian>()
        } else {
            self.reader.read_u32::<BigEndian>().map(u64::from)
        }
    }

    /// List tag and element count; `None` for an absent list
    fn list(&mut self, expected: u32) -> io::Result<Option<u64>> {
        let tag = self.reader.read_u32::<BigEndian>()?;
        let nelems = self.count()?;
        match tag {
            0 if nelems == 0 => Ok(None),
            t if t == expected => Ok(Some(nelems)),
            t => Err(invalid(format!(
                "expected list tag {:#04x}, found {:#04x}",
                expected, t
            ))),
        }
    }

    fn skip_dimensions(&mut self) -> io::Result<()> {
        let Some(count) = self.list(NC_DIMENSION)? else {
            return Ok(());
        };
        for _ in 0..count {
            self.name()?;
            self.count()?; // dimension length
        }
        Ok(())
    }

    fn text_attributes(&mut self) -> io::Result<BTreeMap<String, String>> {
        let mut attributes = BTreeMap::new();
        let Some(count) = self.list(NC_ATTRIBUTE)? else {
            return Ok(attributes);
        };
        for _ in 0..count {
            let name = self.name()?;
            let nc_type = self.reader.read_u32::<BigEndian>()?;
            let nelems = self.count()?;
            let width = type_width(nc_type)
                .ok_or_else(|| {
                    invalid(format!("unknown type {} for attribute {}", nc_type, name))
                })?;
            let len = nelems
                .checked_mul(width)
                .ok_or_else(|| invalid(format!("attribute {} is too large", name)))?;

            if nc_type == NC_CHAR {
                let value = self.padded_bytes(len)?;
                attributes.insert(name, text(&value));
            } else {
                self.skip(padded(len)?)?;
            }
        }
        Ok(attributes)
    }

    fn name(&mut self) -> io::Result<String> {
        let len = self.count()?;
        let bytes = self.padded_bytes(len)?;
        String::from_utf8(bytes).map_err(|e| invalid(format!("name is not UTF-8: {}", e)))
    }

    /// Read `len` bytes followed by padding to a 4-byte boundary
    fn padded_bytes(&mut self, len: u64) -> io::Result<Vec<u8>> {
        if len > MAX_TEXT_LEN {
            return Err(invalid(format!("{} byte text field", len)));
        }
        let mut buf = vec![0u8; len as usize];
        self.reader.read_exact(&mut buf)?;
        self.skip(padded(len)? - len)?;
        Ok(buf)
    }

    fn skip(&mut self, len: u64) -> io::Result<()> {
        let skipped = io::copy(&mut (&mut self.reader).take(len), &mut io::sink())?;
        if skipped < len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "header truncated",
            ));
        }
        Ok(())
    }
}

fn type_width(nc_type: u32) -> Option<u64> {
    match nc_type {
        1 | 2 | 7 => Some(1),  // byte, char, ubyte
        3 | 8 => Some(2),      // short, ushort
        4 | 5 | 9 => Some(4),  // int, float, uint
        6 | 10 | 11 => Some(8), // double, int64, uint64
        _ => None,
    }
}

fn padded(len: u64) -> io::Result<u64> {
    len.checked_next_multiple_of(4)
        .ok_or_else(|| invalid(format!("{} byte field cannot be padded", len)))
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\0')
        .to_string()
}

fn invalid(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

/// Minimal CDF-1 file with one dimension and the given text attributes
#[cfg(test)]
pub(crate) fn encode_header(attributes: &[(&str, &str)]) -> Vec<u8> {
    use byteorder::WriteBytesExt;

    fn write_padded(out: &mut Vec<u8>, bytes: &[u8]) {
        out.write_u32::<BigEndian>(bytes.len() as u32).unwrap_or_default();
        out.extend_from_slice(bytes);
        while out.len() % 4 != 0 {
            out.push(0);
        }
    }

    let mut out = b"CDF\x01".to_vec();
    out.write_u32::<BigEndian>(0).unwrap_or_default(); // numrecs

    out.write_u32::<BigEndian>(NC_DIMENSION).unwrap_or_default();
    out.write_u32::<BigEndian>(1).unwrap_or_default();
    write_padded(&mut out, b"time");
    out.write_u32::<BigEndian>(0).unwrap_or_default();

    out.write_u32::<BigEndian>(NC_ATTRIBUTE).unwrap_or_default();
    out.write_u32::<BigEndian>(attributes.len() as u32 + 1).unwrap_or_default();
    // a numeric attribute that must be skipped
    write_padded(&mut out, b"id");
    out.write_u32::<BigEndian>(3).unwrap_or_default();
    out.write_u32::<BigEndian>(3).unwrap_or_default();
    out.extend_from_slice(&[0, 1, 0, 2, 0, 3, 0, 0]);
    for (name, value) in attributes {
        write_padded(&mut out, name.as_bytes());
        out.write_u32::<BigEndian>(NC_CHAR).unwrap_or_default();
        write_padded(&mut out, value.as_bytes());
    }

    // absent variable list
    out.write_u32::<BigEndian>(0).unwrap_or_default();
    out.write_u32::<BigEndian>(0).unwrap_or_default();
    out
}
