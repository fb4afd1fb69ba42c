use crate::bitio::{BitReader, BitWriter};
use crate::error::{Error, FormatError, Result};
use crate::format::{self, CodecOptions, Header, PatternWidth};
use crate::frequency::FrequencyTable;
use crate::huffman::{CodeTable, HuffmanTree};
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CompressionStats {
    pub original_length: u64,
    pub distinct_symbols: usize,
    pub max_code_length: u8,
    pub header_bytes: u64,
    pub table_bytes: u64,
    pub payload_bytes: u64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecompressionStats {
    pub original_length: u64,
    pub table_entries: usize,
    pub bytes_written: u64,
}

impl CompressionStats {
    pub fn total_bytes(&self) -> u64 {
        self.header_bytes + self.table_bytes + self.payload_bytes
    }

    /// Compressed size over original size, `None` for an empty input.
    pub fn ratio(&self) -> Option<f64> {
        if self.original_length == 0 {
            None
        } else {
            Some(self.total_bytes() as f64 / self.original_length as f64)
        }
    }
}

/// Compresses `reader` into `writer`.
///
/// The input is read twice, once to count symbols and once more after a
/// rewind to encode them.
pub fn compress(
    reader: impl Read + Seek,
    writer: impl Write,
    options: &CodecOptions,
) -> Result<CompressionStats> {
    let mut buf_reader = BufReader::new(reader);
    let mut buf_writer = BufWriter::new(writer);

    let freqs = FrequencyTable::from_reader(&mut buf_reader)?;
    let mut stats = CompressionStats {
        original_length: freqs.total(),
        distinct_symbols: freqs.distinct_symbols(),
        header_bytes: options.header_size() as u64,
        ..Default::default()
    };

    if freqs.is_empty() {
        format::write_header(&mut buf_writer, &Header::default(), options)?;
        buf_writer.flush()?;
        tracing::debug!("empty input, wrote bare header");
        return Ok(stats);
    }

    let table = {
        let entries: Vec<_> = freqs.entries().collect();
        let tree = HuffmanTree::build(&entries)?;
        CodeTable::from_tree(&tree)?
    };
    stats.max_code_length = table.max_length();

    let header = Header {
        original_length: freqs.total(),
        table_count: table.len(),
    };
    format::write_header(&mut buf_writer, &header, options)?;
    stats.table_bytes = format::write_table(&mut buf_writer, &table, options)?;
    tracing::debug!(
        symbols = table.len(),
        max_code_length = stats.max_code_length,
        "wrote code table"
    );

    buf_reader.rewind()?;
    let mut bit_writer = BitWriter::new(&mut buf_writer);
    let mut buffer = [0; 4096];
    let mut encoded = 0u64;

    loop {
        let num_read_bytes = match buf_reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        for byte in &buffer[..num_read_bytes] {
            let code = table.code(*byte).ok_or(Error::SymbolNotInTable(*byte))?;
            bit_writer.write_bits(code.code, code.length)?;
        }
        encoded += num_read_bytes as u64;
    }

    if encoded != freqs.total() {
        return Err(Error::InputLengthChanged {
            counted: freqs.total(),
            encoded,
        });
    }

    bit_writer.finish()?;
    stats.payload_bytes = bit_writer.bytes_written();
    tracing::debug!(
        original = stats.original_length,
        compressed = stats.total_bytes(),
        "compression finished"
    );

    Ok(stats)
}

/// Expands a stream produced by [`compress`] with the same options.
pub fn decompress(
    reader: impl Read,
    writer: impl Write,
    options: &CodecOptions,
) -> Result<DecompressionStats> {
    let mut buf_reader = BufReader::new(reader);
    let mut buf_writer = BufWriter::new(writer);

    let header = format::read_header(&mut buf_reader, options)?;
    let table = format::read_table(&mut buf_reader, header.table_count, options)?;
    let tree = HuffmanTree::from_table(&table)?;
    tracing::debug!(
        original_length = header.original_length,
        table_entries = header.table_count,
        "read code table"
    );

    let mut stats = DecompressionStats {
        original_length: header.original_length,
        table_entries: header.table_count,
        bytes_written: 0,
    };

    if header.original_length == 0 {
        buf_writer.flush()?;
        return Ok(stats);
    }

    if table.is_empty() {
        return Err(FormatError::MissingEntries {
            expected: header.original_length,
        }
        .into());
    }

    if let Some(symbol) = tree.root_symbol() {
        // Only the 64-bit layout carries these tables. Nothing in the payload
        // bounds the output here, original_length alone decides its size.
        if options.pattern_width != PatternWidth::U64 {
            return Err(FormatError::UnexpectedEmptyCode { symbol }.into());
        }
        tracing::warn!(
            symbol,
            "table has a single zero-length code, repeating it without reading the payload"
        );
        let chunk = [symbol; 4096];
        let mut remaining = header.original_length;
        while remaining > 0 {
            let len = remaining.min(chunk.len() as u64) as usize;
            buf_writer.write_all(&chunk[..len])?;
            remaining -= len as u64;
        }
    } else {
        let mut bit_reader = BitReader::new(&mut buf_reader)?;
        let mut iter = tree.create_walk_iter();
        let mut remaining = header.original_length;

        while remaining > 0 {
            let bit = bit_reader
                .read_bit()?
                .ok_or(FormatError::TruncatedPayload {
                    decoded: header.original_length - remaining,
                    expected: header.original_length,
                })?;

            iter = tree.walk(iter, bit)?;
            if let Some(symbol) = iter.symbol {
                buf_writer.write_all(&[symbol])?;
                remaining -= 1;
                iter = tree.create_walk_iter();
            }
        }
    }

    buf_writer.flush()?;
    stats.bytes_written = header.original_length;

    Ok(stats)
}

/// Reads only the header and code table of a compressed stream.
pub fn inspect(reader: impl Read, options: &CodecOptions) -> Result<(Header, CodeTable)> {
    let mut buf_reader = BufReader::new(reader);
    let header = format::read_header(&mut buf_reader, options)?;
    let table = format::read_table(&mut buf_reader, header.table_count, options)?;
    HuffmanTree::from_table(&table)?;

    Ok((header, table))
}

pub fn compress_bytes(data: &[u8], options: &CodecOptions) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    compress(Cursor::new(data), &mut output, options)?;
    Ok(output)
}

pub fn decompress_bytes(data: &[u8], options: &CodecOptions) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    decompress(data, &mut output, options)?;
    Ok(output)
}
