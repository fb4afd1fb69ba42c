//! Static Huffman file compression.
//!
//! A compressed stream is a header, the code table and the packed payload,
//! see [`format`] for the exact layout.

pub mod bitio;
pub mod checksum;
pub mod codec;
pub mod error;
pub mod format;
pub mod frequency;
pub mod huffman;

pub use codec::{
    compress, compress_bytes, decompress, decompress_bytes, inspect, CompressionStats,
    DecompressionStats,
};
pub use error::{Error, FormatError, Result};
pub use format::{ByteOrder, CodecOptions, Header, PatternWidth};
