//! yoctocc command-line entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use yoctocc_drv::{run, Config};

/// A tiny educational C compiler emitting x86-64 assembly.
#[derive(Parser, Debug)]
#[command(name = "yoctocc", version, about, long_about = None)]
struct Cli {
    /// Source file to compile
    source_file: PathBuf,

    /// Output assembly file
    #[arg(default_value = "build/program.s")]
    output_file: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // The CLI contract allows only exit codes 0 and 1, so clap's usage
    // errors are mapped to 1 by hand.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let config = Config {
        source_file: cli.source_file,
        output_file: cli.output_file,
    };

    if let Err(err) = run(&config) {
        eprintln!("\x1b[31m{err:#}\x1b[0m");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
