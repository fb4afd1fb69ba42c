use std::io::{Read, Write};

/// Packs variable-length codes MSB-first into bytes.
///
/// Before a code is appended, whole bytes are drained from the top of the
/// accumulator while the live count would otherwise pass 32 bits.
pub struct BitWriter<W: Write> {
    writer: W,
    buffer: u64,
    length: u32,
    bytes_written: u64,
}

/// Reads a packed stream one bit at a time through a 32-bit window.
///
/// The window is primed with the first four bytes. Every eight bits shifted
/// out, the next byte is ORed into the low end. Bytes past the end of the
/// stream read as zero but are not counted as available.
pub struct BitReader<R: Read> {
    reader: R,
    window: u32,
    consumed: u32,
    available: u32,
}

impl<W: Write> BitWriter<W> {
    const BUF_NBITS: u32 = 32;

    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buffer: 0,
            length: 0,
            bytes_written: 0,
        }
    }

    pub fn write_bits(&mut self, data: u32, length: u8) -> std::io::Result<()> {
        let length = length as u32;
        if length > Self::BUF_NBITS {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("cannot pack a {length}-bit code"),
            ));
        }

        // A live count below 8 leaves nothing to drain, the u64 has room for the overshoot.
        while self.length >= 8 && self.length + length > Self::BUF_NBITS {
            self.emit_byte()?;
        }

        let mask = (1u64 << length) - 1;
        self.buffer = (self.buffer << length) | (data as u64 & mask);
        self.length += length;

        Ok(())
    }

    fn emit_byte(&mut self) -> std::io::Result<()> {
        let byte = (self.buffer >> (self.length - 8)) as u8;
        self.writer.write_all(&[byte])?;
        self.bytes_written += 1;

        self.length -= 8;
        self.buffer &= (1u64 << self.length) - 1;

        Ok(())
    }

    /// Bytes handed to the underlying writer so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Drains the accumulator, padding the last partial byte with zero bits.
    pub fn finish(&mut self) -> std::io::Result<()> {
        while self.length >= 8 {
            self.emit_byte()?;
        }

        if self.length > 0 {
            let byte = (self.buffer << (8 - self.length)) as u8;
            self.writer.write_all(&[byte])?;
            self.bytes_written += 1;
            self.buffer = 0;
            self.length = 0;
        }

        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<R: Read> BitReader<R> {
    pub fn new(reader: R) -> std::io::Result<Self> {
        let mut bit_reader = Self {
            reader,
            window: 0,
            consumed: 0,
            available: 0,
        };

        for _ in 0..4 {
            bit_reader.window <<= 8;
            if let Some(byte) = bit_reader.next_byte()? {
                bit_reader.window |= byte as u32;
                bit_reader.available += 8;
            }
        }

        Ok(bit_reader)
    }

    /// Returns the next bit, or `None` once every byte of the stream has been consumed.
    pub fn read_bit(&mut self) -> std::io::Result<Option<bool>> {
        if self.available == 0 {
            return Ok(None);
        }

        let bit = self.window & 0x8000_0000 != 0;
        self.window <<= 1;
        self.available -= 1;
        self.consumed += 1;

        if self.consumed == 8 {
            if let Some(byte) = self.next_byte()? {
                self.window |= byte as u32;
                self.available += 8;
            }
            self.consumed = 0;
        }

        Ok(Some(bit))
    }

    fn next_byte(&mut self) -> std::io::Result<Option<u8>> {
        let mut byte = [0; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack(codes: &[(u32, u8)]) -> Vec<u8> {
        let mut writer = BitWriter::new(Vec::new());
        for &(data, length) in codes {
            writer.write_bits(data, length).unwrap();
        }
        writer.finish().unwrap();
        writer.into_inner()
    }

    fn read_bits(reader: &mut BitReader<&[u8]>, count: usize) -> Vec<bool> {
        (0..count)
            .map(|_| reader.read_bit().unwrap().unwrap())
            .collect()
    }

    #[test]
    fn packs_partial_bits_msb_first() {
        // 101 11 000 -> padded single byte
        assert_eq!(pack(&[(0b101, 3), (0b11, 2)]), vec![0b1011_1000]);
    }

    #[test]
    fn pads_final_partial_byte() {
        assert_eq!(pack(&[(1, 1)]), vec![0b1000_0000]);
        assert_eq!(pack(&[(0xFF, 8), (0b1, 1)]), vec![0xFF, 0b1000_0000]);
    }

    #[test]
    fn zero_length_codes_write_nothing() {
        assert!(pack(&[(0xFF, 0)]).is_empty());
        assert!(pack(&[]).is_empty());
    }

    #[test]
    fn crosses_accumulator_boundary() {
        let bytes = pack(&[(0x7FFF_FFFF, 31), (0b01, 2), (0xABCD_EF01, 32)]);
        // 31 ones, then 0 1, then 0xABCDEF01 -> 65 bits -> 9 bytes
        assert_eq!(bytes.len(), 9);
        assert_eq!(&bytes[..4], &[0xFF, 0xFF, 0xFF, 0xFE]);

        let mut reader = BitReader::new(bytes.as_slice()).unwrap();
        assert_eq!(read_bits(&mut reader, 31), vec![true; 31]);
        assert_eq!(read_bits(&mut reader, 2), vec![false, true]);
        let tail = read_bits(&mut reader, 32)
            .into_iter()
            .fold(0u32, |acc, bit| (acc << 1) | bit as u32);
        assert_eq!(tail, 0xABCD_EF01);
    }

    #[test]
    fn masks_bits_above_length() {
        assert_eq!(pack(&[(0xFFFF_FFF0, 4)]), vec![0b0000_0000]);
    }

    #[test]
    fn rejects_codes_wider_than_accumulator() {
        let mut writer = BitWriter::new(Vec::new());
        assert!(writer.write_bits(0, 33).is_err());
    }

    #[test]
    fn counts_written_bytes() {
        let mut writer = BitWriter::new(Vec::new());
        for _ in 0..10 {
            writer.write_bits(0b1_0101, 5).unwrap();
        }
        // Nothing is drained until the accumulator would overflow.
        assert_eq!(writer.bytes_written(), 3);
        writer.finish().unwrap();
        assert_eq!(writer.bytes_written(), 7);
        assert_eq!(writer.into_inner().len(), 7);
    }

    #[test]
    fn reader_stops_at_end_of_stream() {
        let data = [0b1010_1010u8];
        let mut reader = BitReader::new(&data[..]).unwrap();

        assert_eq!(
            read_bits(&mut reader, 8),
            vec![true, false, true, false, true, false, true, false]
        );
        assert_eq!(reader.read_bit().unwrap(), None);
    }

    #[test]
    fn reader_on_empty_stream() {
        let mut reader = BitReader::new(&[0u8; 0][..]).unwrap();
        assert_eq!(reader.read_bit().unwrap(), None);
    }

    #[test]
    fn reader_refills_past_initial_window() {
        let data: Vec<u8> = (0..16).collect();
        let mut reader = BitReader::new(data.as_slice()).unwrap();

        for expected in &data {
            let byte = read_bits(&mut reader, 8)
                .into_iter()
                .fold(0u8, |acc, bit| (acc << 1) | bit as u8);
            assert_eq!(byte, *expected);
        }
        assert_eq!(reader.read_bit().unwrap(), None);
    }
}
