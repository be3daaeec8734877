//! `quarkc`: a `clap` derive subcommand layout fronting
//! `quark_compiler::driver` instead of driving parse/codegen/link inline.

use anyhow::Result;
use clap::{Parser, Subcommand};
use quark_compiler::driver::{self, CompileOptions};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quarkc")]
#[command(version)]
#[command(about = "Quark language compiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a Quark source file to a native executable
    Build {
        /// Input .qk file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output executable path
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Optimization level (0-3)
        #[arg(short = 'O', long, default_value_t = 2)]
        opt_level: u8,

        /// Dump the generated LLVM IR next to the output
        #[arg(long)]
        emit_llvm: bool,

        /// Diagnostic coloring
        #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
        color: ColorChoice,
    },

    /// Lex, parse, and analyze a Quark source file without codegen/link
    Check {
        /// Input .qk file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Diagnostic coloring
        #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
        color: ColorChoice,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl std::fmt::Display for ColorChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorChoice::Auto => write!(f, "auto"),
            ColorChoice::Always => write!(f, "always"),
            ColorChoice::Never => write!(f, "never"),
        }
    }
}

impl ColorChoice {
    fn resolve(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, opt_level, emit_llvm, color } => {
            let output = output.unwrap_or_else(|| {
                let stem = input.file_stem().and_then(|n| n.to_str()).unwrap_or("a.out");
                PathBuf::from(stem)
            });
            let opts = CompileOptions { output, opt_level, emit_llvm, color: color.resolve() };
            match driver::compile(&input, &opts) {
                Ok(()) => {
                    log::info!("wrote {}", opts.output.display());
                    Ok(())
                }
                Err(e) => std::process::exit(exit_code_for(&e)),
            }
        }
        Commands::Check { input, color } => match driver::check(&input, color.resolve()) {
            Ok(true) => Ok(()),
            Ok(false) => std::process::exit(1),
            Err(e) => std::process::exit(exit_code_for(&e)),
        },
    }
}

/// Parse/semantic/codegen errors are already rendered through Diagnostics
/// before the driver returns them; object-emission/link/io failures never
/// went through that path, so those still need printing here.
fn exit_code_for(err: &quark_compiler::DriverError) -> i32 {
    use quark_compiler::DriverError;
    if !matches!(err, DriverError::DiagnosticsReported(_) | DriverError::Codegen(_)) {
        eprintln!("error: {err}");
    }
    1
}
