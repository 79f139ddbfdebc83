//! xcc Compiler Driver
//!
//! Reads a source file, runs the frontend and backend, and writes GNU
//! assembler text for x86-64 Linux. The generated code calls a small C
//! runtime for printing; `xcc runtime` writes it out.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use xcc_backend::{generate, CodegenOptions};
use xcc_common::{CompilationContext, CompilerError};
use xcc_frontend::Frontend;

const RUNTIME_SOURCE: &str = include_str!("../runtime/runtime.c");

#[derive(Parser)]
#[command(name = "xcc")]
#[command(about = "x86-64 compiler for a small C subset")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source file to assembly
    Compile {
        /// Input source file
        input: PathBuf,

        /// Output assembly file (defaults to the input with a .s extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Reclaim registers leaked by a function instead of failing
        #[arg(long)]
        lenient_registers: bool,

        /// Write the parsed AST as JSON to this path
        #[arg(long, value_name = "PATH")]
        emit_ast: Option<PathBuf>,

        /// Print the token stream before compiling
        #[arg(long)]
        print_tokens: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the token stream of a source file
    Tokens {
        /// Input source file
        input: PathBuf,
    },

    /// Write the C runtime the generated code links against
    Runtime {
        /// Output path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            input,
            output,
            lenient_registers,
            emit_ast,
            print_tokens,
            verbose,
        } => {
            init_logging(verbose);
            let output = output.unwrap_or_else(|| input.with_extension("s"));
            let options = CodegenOptions {
                strict_registers: !lenient_registers,
            };
            compile_file(&input, &output, options, emit_ast.as_deref(), print_tokens)
        }
        Commands::Tokens { input } => {
            init_logging(false);
            print_tokens(&input)
        }
        Commands::Runtime { output } => match output {
            Some(path) => fs::write(&path, RUNTIME_SOURCE)
                .with_context(|| format!("Failed to write runtime to {}", path.display())),
            None => {
                print!("{RUNTIME_SOURCE}");
                Ok(())
            }
        },
    }
}

/// Name the stage a compiler error came from in the reported chain.
fn staged<T>(result: Result<T, CompilerError>) -> Result<T> {
    result.map_err(|err| {
        let stage = err.stage();
        anyhow::Error::new(err).context(format!("{stage} failed"))
    })
}

fn read_source(input: &Path) -> Result<(String, String)> {
    let source = fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))?;
    Ok((source, input.display().to_string()))
}

fn print_tokens(input: &Path) -> Result<()> {
    let (source, filename) = read_source(input)?;
    let mut ctx = CompilationContext::new();
    for token in staged(Frontend::tokenize(&source, &filename, &mut ctx))? {
        println!("{}: {}", token.span.start, token.token_type);
    }
    Ok(())
}

fn compile_file(
    input: &Path,
    output: &Path,
    options: CodegenOptions,
    ast_output: Option<&Path>,
    show_tokens: bool,
) -> Result<()> {
    if show_tokens {
        print_tokens(input)?;
    }
    let (source, filename) = read_source(input)?;

    // one context per unit: the lexer fills its pools, codegen reads them
    let mut ctx = CompilationContext::new();
    let ast = staged(Frontend::parse_source(&source, &filename, &mut ctx))?;
    if let Some(path) = ast_output {
        let json = serde_json::to_string_pretty(&ast)?;
        fs::write(path, json).with_context(|| format!("Failed to write AST to {}", path.display()))?;
        info!("AST written to {}", path.display());
    }

    let unit = staged(Frontend::analyze(&ast))?;
    let asm = staged(generate(&unit, &ctx, options))?;
    fs::write(output, asm).with_context(|| format!("Failed to write {}", output.display()))?;
    info!("assembly written to {}", output.display());
    Ok(())
}
