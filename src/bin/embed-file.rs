//! Emit a file as a C string literal declaration on stdout.
//!
//! Usage: embed-file [-s] <file> <symbol>

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;

use avahi_tools::config::LoggingConfig;
use avahi_tools::embed::embed_file;
use avahi_tools::logging::setup_logging;

#[derive(Parser, Debug)]
#[command(name = "embed-file")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"))]
#[command(about = "Embed a file into C sources as a string literal", long_about = None)]
struct Args {
    /// Declare the symbol static
    #[arg(short = 's', long = "static")]
    use_static: bool,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,

    /// File to embed
    file: PathBuf,

    /// Name of the generated C array
    symbol: String,
}

fn main() {
    let args = Args::parse();
    setup_logging(&LoggingConfig::default(), args.verbose);

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    let result = embed_file(&args.file, &args.symbol, args.use_static, &mut out)
        .and_then(|()| out.flush().map_err(Into::into));

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
