use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hologram::{json, Interpreter, Term, Vars};

#[derive(Parser)]
#[command(name = "hologram", about = "Inspect and match serialized Hologram terms")]
struct Cli {
    /// Log filter, e.g. `hologram_eval=trace`
    #[arg(long, global = true, env = "HOLOGRAM_LOG")]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a serialized term and print it
    Inspect {
        /// JSON file, or `-` for stdin
        file: PathBuf,
    },
    /// Match a serialized value against a serialized pattern
    Match {
        #[arg(long)]
        pattern: PathBuf,
        #[arg(long)]
        value: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match &cli.log {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Command::Inspect { file } => inspect_file(file),
        Command::Match { pattern, value } => match_files(pattern, value),
    };

    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            if let Some(hint) = e.hint() {
                eprintln!("  hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

fn read_term(path: &Path) -> hologram::Result<Term> {
    let input = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).map(|_| buf)
    } else {
        std::fs::read_to_string(path)
    }
    .map_err(|e| hologram::Error::serialization(format!("cannot read {}: {e}", path.display())))?;

    json::deserialize(&input).map_err(|e| e.with_hint(format!("while decoding {}", path.display())))
}

fn inspect_file(path: &Path) -> hologram::Result<String> {
    Ok(read_term(path)?.to_string())
}

fn match_files(pattern: &Path, value: &Path) -> hologram::Result<String> {
    let pattern = read_term(pattern)?;
    let value = read_term(value)?;

    let interp = Interpreter::new();
    let mut vars = Vars::new();
    let result = interp.match_operator(value, &pattern, &mut vars)?;
    tracing::debug!(bindings = vars.len(), "match succeeded");

    let mut lines = vec![result.to_string()];
    lines.extend(
        vars.to_sorted_vec()
            .into_iter()
            .map(|(name, term)| format!("{name} = {term}")),
    );
    Ok(lines.join("\n"))
}
