use anyhow::Context;
use clap::Parser;
use huffpack::{checksum, ByteOrder, CodecOptions, PatternWidth};
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, clap::Args)]
struct OperationArgs {
    input_path: PathBuf,
    output_path: PathBuf,
}

#[derive(Debug, Clone, clap::Args)]
struct CheckArgs {
    original_path: PathBuf,
    compressed_path: PathBuf,
}

#[derive(Debug, Clone, clap::Subcommand)]
enum Operation {
    /// Compress a file
    Compress(OperationArgs),
    /// Decompress a file
    Decompress(OperationArgs),
    /// Print the header and code table of a compressed file
    Inspect { input_path: PathBuf },
    /// Decompress in memory and compare CRC-32 and size with the original
    Check(CheckArgs),
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum WidthArg {
    #[value(name = "32")]
    W32,
    #[value(name = "64")]
    W64,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OrderArg {
    Native,
    Little,
    Big,
}

#[derive(Debug, clap::Parser)]
#[command(version, about = "Static Huffman file compressor")]
struct Args {
    #[command(subcommand)]
    op: Operation,

    /// Width of the pattern field in table entries
    #[arg(long, global = true, value_enum, default_value = "32")]
    pattern_width: WidthArg,

    /// Byte order of the integers in the header and table
    #[arg(long, global = true, value_enum, default_value = "native")]
    byte_order: OrderArg,

    /// Raise the log level, repeat for more detail
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn options(&self) -> CodecOptions {
        CodecOptions {
            pattern_width: match self.pattern_width {
                WidthArg::W32 => PatternWidth::U32,
                WidthArg::W64 => PatternWidth::U64,
            },
            byte_order: match self.byte_order {
                OrderArg::Native => ByteOrder::Native,
                OrderArg::Little => ByteOrder::Little,
                OrderArg::Big => ByteOrder::Big,
            },
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn compress(args: OperationArgs, options: &CodecOptions) -> anyhow::Result<()> {
    let input_file = File::open(&args.input_path)
        .with_context(|| format!("opening {}", args.input_path.display()))?;
    let output_file = File::create(&args.output_path)
        .with_context(|| format!("creating {}", args.output_path.display()))?;

    let stats = huffpack::compress(input_file, output_file, options)
        .with_context(|| format!("compressing {}", args.input_path.display()))?;

    tracing::info!(
        original = stats.original_length,
        compressed = stats.total_bytes(),
        symbols = stats.distinct_symbols,
        ratio = stats.ratio().unwrap_or(0.0),
        "compressed {}",
        args.input_path.display()
    );

    Ok(())
}

fn decompress(args: OperationArgs, options: &CodecOptions) -> anyhow::Result<()> {
    let input_file = File::open(&args.input_path)
        .with_context(|| format!("opening {}", args.input_path.display()))?;
    let output_file = File::create(&args.output_path)
        .with_context(|| format!("creating {}", args.output_path.display()))?;

    let stats = huffpack::decompress(input_file, output_file, options)
        .with_context(|| format!("decompressing {}", args.input_path.display()))?;

    tracing::info!(
        bytes = stats.bytes_written,
        table_entries = stats.table_entries,
        "decompressed {}",
        args.input_path.display()
    );

    Ok(())
}

fn inspect(input_path: PathBuf, options: &CodecOptions) -> anyhow::Result<()> {
    let input_file =
        File::open(&input_path).with_context(|| format!("opening {}", input_path.display()))?;
    let (header, table) = huffpack::inspect(input_file, options)
        .with_context(|| format!("reading table of {}", input_path.display()))?;

    println!("original length: {}", header.original_length);
    println!("table entries:   {}", header.table_count);
    print!("{table}");

    Ok(())
}

fn check(args: CheckArgs, options: &CodecOptions) -> anyhow::Result<()> {
    let mut original_file = File::open(&args.original_path)
        .with_context(|| format!("opening {}", args.original_path.display()))?;
    let compressed_file = File::open(&args.compressed_path)
        .with_context(|| format!("opening {}", args.compressed_path.display()))?;

    let (expected_crc, expected_size) = checksum::crc32_and_size(&mut original_file)
        .with_context(|| format!("reading {}", args.original_path.display()))?;

    let mut decoded = Vec::new();
    huffpack::decompress(compressed_file, &mut decoded, options)
        .with_context(|| format!("decompressing {}", args.compressed_path.display()))?;
    let actual_crc = checksum::crc32(&decoded);

    if actual_crc != expected_crc || decoded.len() as u64 != expected_size {
        anyhow::bail!(
            "mismatch: original {} bytes crc {:#010x}, decoded {} bytes crc {:#010x}",
            expected_size,
            expected_crc,
            decoded.len(),
            actual_crc
        );
    }

    println!("ok: {expected_size} bytes, crc {expected_crc:#010x}");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    let options = args.options();

    match args.op {
        Operation::Compress(args) => compress(args, &options),
        Operation::Decompress(args) => decompress(args, &options),
        Operation::Inspect { input_path } => inspect(input_path, &options),
        Operation::Check(args) => check(args, &options),
    }
}
