use crc::{Crc, CRC_32_ISO_HDLC};
use std::io::Read;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// CRC-32 (the gzip/zlib polynomial) and length of everything `reader` yields.
pub fn crc32_and_size(reader: &mut impl Read) -> std::io::Result<(u32, u64)> {
    let mut digest = CRC32.digest();
    let mut tot_size = 0u64;

    let mut buffer: [u8; 4096] = [0; 4096];
    loop {
        let read_bytes = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        tot_size += read_bytes as u64;
        digest.update(&buffer[0..read_bytes]);
    }

    Ok((digest.finalize(), tot_size))
}

pub fn crc32(data: &[u8]) -> u32 {
    CRC32.checksum(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_check_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn streaming_matches_one_shot() {
        let data = vec![0x5Au8; 10_000];
        let (crc, size) = crc32_and_size(&mut data.as_slice()).unwrap();
        assert_eq!(size, 10_000);
        assert_eq!(crc, crc32(&data));
    }
}
