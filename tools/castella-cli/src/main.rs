// tools/castella-cli/src/main.rs
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod backend;
mod cli;

use backend::{default_python, Toolchain};

#[derive(Parser)]
#[command(name = "castella")]
#[command(about = "Compilador Castella: traduce a Python y genera ejecutables")]
struct Cli {
    /// Registro detallado (nivel debug) cuando RUST_LOG no está definido.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[arg(long, env = "CASTELLA_PYTHON", global = true)]
    python: Option<String>,
    #[arg(long, env = "CASTELLA_UPX", default_value = "upx", global = true)]
    upx: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Traduce un archivo Castella a Python.
    Translate {
        input: PathBuf,
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,
        #[arg(long = "no-preamble")]
        no_preamble: bool,
        #[arg(long = "diag-json")]
        diag_json: Option<PathBuf>,
    },
    /// Traduce y empaqueta un ejecutable con PyInstaller.
    Build {
        input: Option<PathBuf>,
        output: Option<String>,
        #[arg(long, value_enum, default_value_t = cli::build::CompressMode::Auto)]
        compress: cli::build::CompressMode,
    },
    /// Verifica Python, PyInstaller y UPX.
    Doctor {
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "warn,castella=info" })
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let toolchain = Toolchain::new(
        cli.python.unwrap_or_else(|| default_python().to_string()),
        cli.upx,
    );
    let grammar = castella_lang::build_grammar();

    match cli.command {
        Commands::Translate {
            input,
            out,
            no_preamble,
            diag_json,
        } => {
            let args = cli::translate::TranslateArgs {
                input,
                output: out,
                no_preamble,
                diag_json,
            };
            if let Err(err) = cli::translate::run(&grammar, args) {
                eprintln!("{}", err);
                std::process::exit(1);
            }
        }
        Commands::Build {
            input,
            output,
            compress,
        } => {
            let args = cli::build::BuildArgs {
                input,
                output,
                compress,
            };
            if let Err(err) = cli::build::run(&grammar, &toolchain, args) {
                eprintln!("{}", err);
                std::process::exit(1);
            }
        }
        Commands::Doctor { json } => {
            if let Err(err) = cli::doctor::run(&toolchain, json) {
                eprintln!("{}", err);
                std::process::exit(1);
            }
        }
    }
}
