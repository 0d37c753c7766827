use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use rustburg_core::parser::DEFAULT_MAX_ERRORS;
use rustburg_core::{Error, Spec};

/// Diagnostic output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// BURG-style code-generator generator: tree-rewriting rule
/// specifications in, Rust minimum-cost matchers out.
#[derive(Parser)]
#[command(name = "rustburg", version, about = "BURG-style code-generator generator for Rust")]
struct Cli {
    /// Diagnostic format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit the Rust matcher for a specification to stdout
    Generate {
        /// Path to the .burg specification
        file: PathBuf,
    },

    /// Dump the normalised rule set, one rule per line
    Norm {
        /// Path to the .burg specification
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Generate { file } => cmd_generate(&file, cli.output),
        Commands::Norm { file } => cmd_norm(&file, cli.output),
    }
}

fn cmd_generate(file: &Path, output: OutputFormat) {
    let spec = load_spec_or_exit(file, output);
    let stdout = std::io::stdout();
    let mut sink = stdout.lock();
    if let Err(e) = rustburg_codegen::generate(&spec, &mut sink) {
        report(&e, output);
        process::exit(1);
    }
    if let Err(e) = sink.flush() {
        report(&Error::io(e.to_string()), output);
        process::exit(1);
    }
}

fn cmd_norm(file: &Path, output: OutputFormat) {
    let spec = load_spec_or_exit(file, output);
    match rustburg_core::normalize(&spec.rules) {
        Ok(rules) => {
            for rule in rules {
                println!("{}", rule);
            }
        }
        Err(e) => {
            report(&e, output);
            process::exit(1);
        }
    }
}

/// Read and frontend a specification, reporting every syntax error the
/// recovering parser collects before giving up.
fn load_spec_or_exit(file: &Path, output: OutputFormat) -> Spec {
    let filename = file.display().to_string();
    let src = match std::fs::read_to_string(file) {
        Ok(src) => src,
        Err(e) => {
            report(
                &Error::io(format!("failed to read '{}': {}", filename, e)),
                output,
            );
            process::exit(1);
        }
    };
    let tokens = match rustburg_core::lexer::lex(&src, &filename) {
        Ok(tokens) => tokens,
        Err(e) => {
            report(&e, output);
            process::exit(1);
        }
    };
    let (spec, errors) =
        rustburg_core::parser::parse_recovering(&tokens, &filename, DEFAULT_MAX_ERRORS);
    if !errors.is_empty() {
        for e in &errors {
            report(e, output);
        }
        process::exit(1);
    }
    if let Err(e) = rustburg_core::validate(&spec) {
        report(&e, output);
        process::exit(1);
    }
    spec
}

fn report(e: &Error, output: OutputFormat) {
    match output {
        OutputFormat::Text => eprintln!("error: {}", e),
        OutputFormat::Json => {
            let json = serde_json::to_string(e)
                .unwrap_or_else(|se| format!("{{\"kind\":\"io\",\"message\":{:?}}}", se.to_string()));
            eprintln!("{}", json);
        }
    }
}
