//! Pseudolang CLI

use clap::{Parser, Subcommand};
use pseudolang::{Config, Diagnostic, error::report_error};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

#[derive(Parser)]
#[command(name = "pseudolang", version, about = "Pseudocode interpreter")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse and execute a program
    Run {
        /// Program file; prompted for when omitted
        file: Option<PathBuf>,

        /// Trace execution to stderr and dump the full error on failure
        #[arg(long)]
        dev: bool,

        /// Maximum call depth, MAIN included
        #[arg(long, default_value_t = pseudolang::interp::DEFAULT_STACK_CAPACITY)]
        stack_capacity: usize,
    },
    /// Parse a program and report block structure errors
    Check {
        /// Program file to check
        file: PathBuf,
    },
    /// Parse and dump the instruction tree as JSON (debug)
    Parse {
        /// Program file to parse
        file: PathBuf,
    },
}

/// Set up the stderr subscriber. `--dev` forces debug output for this crate,
/// otherwise `RUST_LOG` is honoured when set.
fn init_tracing(dev: bool) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let filter = if dev {
            EnvFilter::new("pseudolang=debug")
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(false)
                    .without_time(),
            )
            .with(filter)
            .init();
    });
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run {
            file,
            dev,
            stack_capacity,
        } => {
            init_tracing(dev);
            run_file(file, dev, Config { stack_capacity })
        }
        Command::Check { file } => {
            init_tracing(false);
            check_file(&file)
        }
        Command::Parse { file } => {
            init_tracing(false);
            parse_file(&file)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Read a program, exiting with a message when the file does not exist
fn read_source(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    if !path.is_file() {
        eprintln!("File '{}' not found", path.display());
        std::process::exit(1);
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Ask for the program path on stdin
fn prompt_path() -> io::Result<PathBuf> {
    print!("Enter file path: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(PathBuf::from(line.trim()))
}

/// Report a fatal pseudocode error and exit
fn fail(
    filename: &str,
    source: &str,
    error: &(impl Diagnostic + std::fmt::Debug),
    dev: bool,
) -> ! {
    // Program output and the report must not interleave
    let _ = io::stdout().flush();
    if let Err(e) = report_error(filename, source, error) {
        eprintln!("Error: {e}");
    }
    if dev {
        eprintln!("{error:#?}");
    }
    std::process::exit(1);
}

fn run_file(
    file: Option<PathBuf>,
    dev: bool,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = match file {
        Some(path) => path,
        None => prompt_path()?,
    };
    let source = read_source(&path)?;
    let filename = path.display().to_string();

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut output = stdout.lock();

    if let Err(error) = pseudolang::run(&source, &config, &mut input, &mut output) {
        drop(output);
        fail(&filename, &source, &error, dev);
    }
    Ok(())
}

fn check_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let source = read_source(path)?;
    let filename = path.display().to_string();

    match pseudolang::parser::parse(&source) {
        Ok(program) => {
            println!(
                "✓ {} parses successfully ({} top-level statements)",
                filename,
                program.body.len()
            );
            Ok(())
        }
        Err(error) => fail(&filename, &source, &error, false),
    }
}

fn parse_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let source = read_source(path)?;
    let filename = path.display().to_string();

    match pseudolang::parser::parse(&source) {
        Ok(program) => {
            println!("{}", serde_json::to_string_pretty(&program)?);
            Ok(())
        }
        Err(error) => fail(&filename, &source, &error, false),
    }
}
