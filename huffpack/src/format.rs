//! Layout of the compressed stream.
//!
//! ```text
//! original_length  i64
//! table_count      i32
//! table_count x    { symbol u8, pattern u32 | u64, length u8 }
//! payload          packed codes, MSB-first
//! ```
//!
//! Integers use native byte order unless [`CodecOptions`] says otherwise.

use crate::error::{FormatError, Result};
use crate::huffman::{CodeEntry, CodeTable, PrefixCode};
use std::io::{Read, Write};

/// Upper bound on table entries: one per byte value.
pub const MAX_TABLE_ENTRIES: usize = 256;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    #[default]
    Native,
    Little,
    Big,
}

/// Width of the pattern field in each table entry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PatternWidth {
    #[default]
    U32,
    /// Layout written by producers where the pattern is a 64-bit `unsigned long`.
    U64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    pub pattern_width: PatternWidth,
    pub byte_order: ByteOrder,
}

impl CodecOptions {
    /// 64-bit patterns in native byte order.
    pub fn legacy() -> Self {
        Self {
            pattern_width: PatternWidth::U64,
            byte_order: ByteOrder::Native,
        }
    }

    pub fn header_size(&self) -> usize {
        8 + 4
    }

    pub fn entry_size(&self) -> usize {
        match self.pattern_width {
            PatternWidth::U32 => 1 + 4 + 1,
            PatternWidth::U64 => 1 + 8 + 1,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub original_length: u64,
    pub table_count: usize,
}

impl ByteOrder {
    /// Rearranges native-order bytes into this order. Applying it twice gives
    /// the input back, so the same call serves reads and writes.
    fn arrange<const N: usize>(self, mut bytes: [u8; N]) -> [u8; N] {
        let swap = match self {
            ByteOrder::Native => false,
            ByteOrder::Little => cfg!(target_endian = "big"),
            ByteOrder::Big => cfg!(target_endian = "little"),
        };
        if swap {
            bytes.reverse();
        }
        bytes
    }
}

pub fn write_header(
    writer: &mut impl Write,
    header: &Header,
    options: &CodecOptions,
) -> std::io::Result<()> {
    let original_length = i64::try_from(header.original_length).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "input is too long for the length field",
        )
    })?;
    // Never more than 256, see MAX_TABLE_ENTRIES.
    let table_count = header.table_count as i32;

    let order = options.byte_order;
    writer.write_all(&order.arrange(original_length.to_ne_bytes()))?;
    writer.write_all(&order.arrange(table_count.to_ne_bytes()))?;

    Ok(())
}

pub fn read_header(reader: &mut impl Read, options: &CodecOptions) -> Result<Header> {
    let mut length_bytes = [0; 8];
    let mut count_bytes = [0; 4];
    reader
        .read_exact(&mut length_bytes)
        .and_then(|_| reader.read_exact(&mut count_bytes))
        .map_err(|e| FormatError::TruncatedHeader.on_eof(e))?;

    let order = options.byte_order;
    let original_length = i64::from_ne_bytes(order.arrange(length_bytes));
    let table_count = i32::from_ne_bytes(order.arrange(count_bytes));

    if original_length < 0 {
        return Err(FormatError::NegativeLength(original_length).into());
    }
    if table_count < 0 || table_count as usize > MAX_TABLE_ENTRIES {
        return Err(FormatError::TableCountOutOfRange(table_count).into());
    }

    Ok(Header {
        original_length: original_length as u64,
        table_count: table_count as usize,
    })
}

/// Writes every entry of `table` in its stored order and returns the bytes written.
pub fn write_table(
    writer: &mut impl Write,
    table: &CodeTable,
    options: &CodecOptions,
) -> std::io::Result<u64> {
    let order = options.byte_order;
    for entry in table.entries() {
        writer.write_all(&[entry.symbol])?;
        match options.pattern_width {
            PatternWidth::U32 => writer.write_all(&order.arrange(entry.code.code.to_ne_bytes()))?,
            PatternWidth::U64 => {
                writer.write_all(&order.arrange(u64::from(entry.code.code).to_ne_bytes()))?
            }
        }
        writer.write_all(&[entry.code.length])?;
    }

    Ok((table.len() * options.entry_size()) as u64)
}

fn read_entry(reader: &mut impl Read, options: &CodecOptions) -> std::io::Result<CodeEntry> {
    let order = options.byte_order;
    let mut symbol = [0; 1];
    reader.read_exact(&mut symbol)?;

    let code = match options.pattern_width {
        PatternWidth::U32 => {
            let mut pattern = [0; 4];
            reader.read_exact(&mut pattern)?;
            u32::from_ne_bytes(order.arrange(pattern))
        }
        // Only the low 32 bits can carry a code.
        PatternWidth::U64 => {
            let mut pattern = [0; 8];
            reader.read_exact(&mut pattern)?;
            u64::from_ne_bytes(order.arrange(pattern)) as u32
        }
    };

    let mut length = [0; 1];
    reader.read_exact(&mut length)?;

    Ok(CodeEntry {
        symbol: symbol[0],
        code: PrefixCode {
            code,
            length: length[0],
        },
    })
}

pub fn read_table(
    reader: &mut impl Read,
    table_count: usize,
    options: &CodecOptions,
) -> Result<CodeTable> {
    let mut entries = Vec::with_capacity(table_count);

    for read in 0..table_count {
        let entry = read_entry(reader, options).map_err(|e| {
            FormatError::TruncatedTable {
                expected: table_count,
                read,
            }
            .on_eof(e)
        })?;
        entries.push(entry);
    }

    Ok(CodeTable::from_entries(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::Cursor;

    fn sample_table() -> CodeTable {
        CodeTable::from_entries(vec![
            CodeEntry { symbol: b'a', code: PrefixCode { code: 0b0, length: 1 } },
            CodeEntry { symbol: b'b', code: PrefixCode { code: 0b10, length: 2 } },
            CodeEntry { symbol: b'c', code: PrefixCode { code: 0b11, length: 2 } },
        ])
    }

    #[test]
    fn header_layout_little_endian() {
        let options = CodecOptions {
            byte_order: ByteOrder::Little,
            ..Default::default()
        };
        let mut bytes = Vec::new();
        let header = Header { original_length: 0x0102, table_count: 3 };
        write_header(&mut bytes, &header, &options).unwrap();

        assert_eq!(bytes, vec![0x02, 0x01, 0, 0, 0, 0, 0, 0, 3, 0, 0, 0]);
        assert_eq!(read_header(&mut Cursor::new(&bytes), &options).unwrap(), header);
    }

    #[test]
    fn byte_orders_match_std_conversions() {
        let value = 0x0102_0304_0506_0708i64;
        assert_eq!(ByteOrder::Native.arrange(value.to_ne_bytes()), value.to_ne_bytes());
        assert_eq!(ByteOrder::Little.arrange(value.to_ne_bytes()), value.to_le_bytes());
        assert_eq!(ByteOrder::Big.arrange(value.to_ne_bytes()), value.to_be_bytes());
        assert_eq!(
            i64::from_ne_bytes(ByteOrder::Big.arrange(value.to_be_bytes())),
            value
        );
    }

    #[test]
    fn table_layout_big_endian_wide() {
        let options = CodecOptions {
            pattern_width: PatternWidth::U64,
            byte_order: ByteOrder::Big,
        };
        let mut bytes = Vec::new();
        let written = write_table(&mut bytes, &sample_table(), &options).unwrap();

        assert_eq!(written, 30);
        assert_eq!(&bytes[10..20], &[b'b', 0, 0, 0, 0, 0, 0, 0, 0b10, 2]);

        let table = read_table(&mut Cursor::new(&bytes), 3, &options).unwrap();
        assert_eq!(table.entries(), sample_table().entries());
    }

    #[test]
    fn rejects_out_of_range_header_fields() {
        let options = CodecOptions::default();

        let mut negative = Vec::new();
        negative.extend_from_slice(&(-1i64).to_ne_bytes());
        negative.extend_from_slice(&0i32.to_ne_bytes());
        assert!(matches!(
            read_header(&mut Cursor::new(&negative), &options),
            Err(Error::Format(FormatError::NegativeLength(-1)))
        ));

        let mut too_many = Vec::new();
        too_many.extend_from_slice(&5i64.to_ne_bytes());
        too_many.extend_from_slice(&257i32.to_ne_bytes());
        assert!(matches!(
            read_header(&mut Cursor::new(&too_many), &options),
            Err(Error::Format(FormatError::TableCountOutOfRange(257)))
        ));
    }

    #[test]
    fn truncated_header_and_table() {
        let options = CodecOptions::default();
        assert!(matches!(
            read_header(&mut Cursor::new(&[0u8; 7]), &options),
            Err(Error::Format(FormatError::TruncatedHeader))
        ));

        let mut bytes = Vec::new();
        write_table(&mut bytes, &sample_table(), &options).unwrap();
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(
            read_table(&mut Cursor::new(&bytes), 3, &options),
            Err(Error::Format(FormatError::TruncatedTable { expected: 3, read: 2 }))
        ));
    }
}
