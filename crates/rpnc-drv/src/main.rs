//! rpnc - RPN compiler command-line interface.
//!
//! Parses arguments with clap, merges them over the optional `rpnc.toml`
//! defaults, runs the compilation session and reports diagnostics. Exit
//! code 0 means every line compiled; 1 means at least one line failed or
//! the invocation itself was invalid.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rpnc_drv::{Config, DriverError, FileConfig, Session};
use rpnc_tac::OptLevel;

/// Supported UART baud rates on the emitted firmware.
const SUPPORTED_BAUDS: [u32; 2] = [9_600, 115_200];

/// rpnc - compiler for parenthesized RPN programs targeting the ATmega328P
#[derive(Parser, Debug)]
#[command(name = "rpnc")]
#[command(version)]
#[command(about = "Compiles RPN expression files to TAC and AVR assembly", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, env = "RPNC_VERBOSE")]
    verbose: bool,

    /// Path to configuration file (default: ./rpnc.toml when present)
    #[arg(short, long, global = true, env = "RPNC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a source file through every phase
    ///
    /// Runs lexing, parsing, semantic analysis, TAC generation and the
    /// selected optimization passes. With --output it also emits AVR
    /// assembly for the ATmega328P.
    Compile(CompileCommand),
}

/// Arguments for the compile subcommand.
#[derive(Args, Debug)]
struct CompileCommand {
    /// Input source file (one expression per line)
    input: PathBuf,

    /// Optimization level: folding, propagation, dead_code or completo
    #[arg(long, value_name = "LEVEL")]
    nivel: Option<String>,

    /// Write AVR assembly to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Write the optimized TAC listing to this file
    #[arg(long, value_name = "FILE")]
    emit_tac: Option<PathBuf>,

    /// UART baud rate for the emitted program (9600 or 115200)
    #[arg(long, value_name = "BAUD")]
    baud: Option<u32>,

    /// Emit debug prints after memory writes and operations
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(cli) {
        Ok(success) => {
            if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        },
    }
}

fn run(cli: Cli) -> Result<bool> {
    let defaults = FileConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Compile(cmd) => {
            let config = build_config(cmd, &defaults)?;
            let emit_tac_requested = config.emit_tac.is_some();
            let mut session = Session::new(config);
            let outcome = session.compile()?;

            for diagnostic in &outcome.diagnostics {
                eprintln!("{}", diagnostic);
            }
            if !emit_tac_requested {
                print!("{}", outcome.tac_listing());
            }
            eprintln!(
                "{} line(s) compiled, {} failed",
                outcome.lines_ok, outcome.lines_failed
            );

            Ok(outcome.success())
        },
    }
}

/// Merges command-line arguments over configuration file defaults.
fn build_config(cmd: CompileCommand, defaults: &FileConfig) -> Result<Config> {
    let nivel = cmd.nivel.unwrap_or_else(|| defaults.nivel.clone());
    let opt_level: OptLevel = nivel.parse().map_err(DriverError::InvalidArguments)?;

    let baud = cmd.baud.unwrap_or(defaults.baud);
    if !SUPPORTED_BAUDS.contains(&baud) {
        return Err(DriverError::InvalidArguments(format!(
            "unsupported baud rate {} (expected 9600 or 115200)",
            baud
        ))
        .into());
    }

    Ok(Config {
        input: cmd.input,
        opt_level,
        output: cmd.output,
        emit_tac: cmd.emit_tac,
        baud,
        debug: cmd.debug || defaults.debug,
    })
}
