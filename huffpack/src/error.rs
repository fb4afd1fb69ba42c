use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed compressed data: {0}")]
    Format(#[from] FormatError),

    /// A generated code does not fit the 32-bit pattern field.
    #[error("code for symbol {symbol:#04x} needs {length} bits, at most 32 are supported")]
    CodeTooLong { symbol: u8, length: usize },

    #[error("cannot build a huffman tree without symbols")]
    EmptyFrequencyTable,

    /// The input yielded a byte on the encoding pass that the counting pass never saw.
    #[error("symbol {0:#04x} has no code, input changed between passes")]
    SymbolNotInTable(u8),

    #[error("input changed between passes: counted {counted} bytes, encoded {encoded}")]
    InputLengthChanged { counted: u64, encoded: u64 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("header is truncated")]
    TruncatedHeader,

    #[error("table is truncated: expected {expected} entries, read {read}")]
    TruncatedTable { expected: usize, read: usize },

    #[error("negative original length {0}")]
    NegativeLength(i64),

    #[error("table count {0} is outside 0..=256")]
    TableCountOutOfRange(i32),

    #[error("original length is non-zero but the table has no entries (expected {expected} symbols)")]
    MissingEntries { expected: u64 },

    #[error("code length {length} for symbol {symbol:#04x} exceeds 32 bits")]
    CodeLengthOutOfRange { symbol: u8, length: u8 },

    #[error("zero-length code for symbol {symbol:#04x} in a table with several entries")]
    AmbiguousEmptyCode { symbol: u8 },

    #[error("zero-length code for symbol {symbol:#04x} outside the 64-bit pattern layout")]
    UnexpectedEmptyCode { symbol: u8 },

    #[error("code for symbol {symbol:#04x} collides with another table entry")]
    ConflictingCode { symbol: u8 },

    #[error("symbol {symbol:#04x} appears more than once in the table")]
    DuplicateSymbol { symbol: u8 },

    #[error("payload contains a bit sequence with no code")]
    InvalidCode,

    #[error("payload ended after {decoded} of {expected} symbols")]
    TruncatedPayload { decoded: u64, expected: u64 },
}

impl FormatError {
    /// Maps an unexpected end of file to `self`, passing other I/O errors through.
    pub(crate) fn on_eof(self, err: std::io::Error) -> Error {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::Format(self)
        } else {
            Error::Io(err)
        }
    }
}
