// crc32par — CRC-32 (IEEE) checksums of many files, computed concurrently
//
// One worker per file streams it through the checksum; a collector prints
// "<file>: <CRC>" or "Error while reading <file>: <reason>" per file, in
// completion order or (with -s) in command-line order.

use std::io::{self, BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;

use crc32par::common::{self, TOOL_NAME};
use crc32par::crc::FileSource;
use crc32par::fanout::{self, Order, RunConfig};

#[derive(Parser)]
#[command(
    name = "crc32par",
    version,
    about = "Compute CRC-32 (IEEE) checksums of files concurrently",
    override_usage = "crc32par [-s] FILE1 [FILE2...]"
)]
struct Cli {
    /// Print results in the order the files were given
    #[arg(short = 's', long = "sorted")]
    sorted: bool,

    /// Checksum at most N files at a time (default: all at once)
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    jobs: Option<NonZeroUsize>,

    /// Files to checksum (any bytes the OS accepts as a path)
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,
}

impl Cli {
    fn config(&self) -> RunConfig {
        RunConfig {
            order: if self.sorted {
                Order::Ordered
            } else {
                Order::Unordered
            },
            jobs: self.jobs,
        }
    }
}

fn main() {
    common::reset_sigpipe();
    common::init_logging();

    // Missing FILE arguments and unknown flags exit with status 2 here.
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("{}: {:#}", TOOL_NAME, e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.config();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let summary = fanout::run(&FileSource, &cli.files, &config, &mut out)
        .context("checksum run aborted")?;
    out.flush().context("failed to flush standard output")?;

    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "done"
    );
    Ok(())
}
