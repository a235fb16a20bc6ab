//! phx - expand physics-package notation from the command line

#[cfg(feature = "cli")]
use clap::{Parser, ValueEnum};
#[cfg(feature = "cli")]
use physics_tex::{expand_with_options, MacroTable, PhysicsOptions};
#[cfg(feature = "cli")]
use physics_tex_latex_backend::{render, LatexRenderOptions};
#[cfg(feature = "cli")]
use std::io::{self, Read};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "phx")]
#[command(version)]
#[command(about = "Expand LaTeX physics-package macros", long_about = None)]
struct Cli {
    /// Math expression to expand (reads --file or stdin if not provided)
    input: Option<String>,

    /// Read the expression from a file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Latex)]
    format: OutputFormat,

    /// Options file (.json, or .toml with the config-file feature)
    #[arg(long)]
    options: Option<PathBuf>,

    /// Typeset differentials in italics
    #[arg(long)]
    italic_diff: bool,

    /// List the registered macros and exit
    #[arg(long)]
    list: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Exit with status 1 when any macro failed to expand
    #[arg(long)]
    strict: bool,
}

#[cfg(feature = "cli")]
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Plain LaTeX with the physics macros expanded
    Latex,
    /// Expression tree and diagnostics as JSON
    Json,
}

#[cfg(feature = "cli")]
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn read_input(cli: &Cli) -> io::Result<String> {
    if let Some(input) = &cli.input {
        return Ok(input.clone());
    }
    if let Some(path) = &cli.file {
        return std::fs::read_to_string(path);
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

#[cfg(feature = "cli")]
fn load_options(cli: &Cli) -> Result<PhysicsOptions, String> {
    let mut options = match &cli.options {
        Some(path) => PhysicsOptions::load(path).map_err(|e| e.to_string())?,
        None => PhysicsOptions::default(),
    };
    if cli.italic_diff {
        options.italic_diff = true;
    }
    if !options.sizes.is_increasing() {
        return Err("Size table must increase from big to Bigg".to_string());
    }
    Ok(options)
}

#[cfg(feature = "cli")]
fn main() -> io::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.list {
        for (name, spec) in MacroTable::physics().iter() {
            if name == spec.name {
                println!("\\{:<24} {:?}", name, spec.shape);
            } else {
                println!("\\{:<24} {:?}, alias of \\{}", name, spec.shape, spec.name);
            }
        }
        return Ok(());
    }

    let options = match load_options(&cli) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {}", message);
            std::process::exit(2);
        }
    };

    let input = read_input(&cli)?;
    let output = expand_with_options(input.trim(), &options);

    match cli.format {
        OutputFormat::Latex => {
            println!("{}", render(&output.tree, &LatexRenderOptions::default()));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            println!("{}", json);
        }
    }

    for diagnostic in &output.diagnostics {
        eprintln!("{}{}\x1b[0m", diagnostic.color_code(), diagnostic);
    }

    if cli.strict && output.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo install physics-tex --features cli");
    eprintln!("  phx [OPTIONS] [INPUT]");
}
