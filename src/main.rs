use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use docxide_model::{ParseOptions, parse_docx_with_options};

const MIB: u64 = 1024 * 1024;

#[derive(Parser)]
#[command(
    name = "docxide-model",
    version,
    about = "Extract a fully-resolved document model from a DOCX file as JSON"
)]
struct Cli {
    /// Input DOCX file
    input: PathBuf,

    /// Output JSON file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,

    /// Skip image bytes; references keep their package paths
    #[arg(long)]
    no_images: bool,

    /// Largest uncompressed part to accept, in MiB
    #[arg(long, value_name = "MB", default_value_t = 64)]
    max_part_mb: u64,

    /// Largest uncompressed package to accept, in MiB
    #[arg(long, value_name = "MB", default_value_t = 512)]
    max_total_mb: u64,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if !cli.input.exists() {
        eprintln!("Error: input file not found: {}", cli.input.display());
        process::exit(1);
    }

    let options = ParseOptions {
        max_part_size: cli.max_part_mb.saturating_mul(MIB),
        max_total_size: cli.max_total_mb.saturating_mul(MIB),
        include_images: !cli.no_images,
        ..ParseOptions::default()
    };

    let model = match parse_docx_with_options(&cli.input, &options) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let json = if cli.compact {
        serde_json::to_string(&model)
    } else {
        serde_json::to_string_pretty(&model)
    };
    let json = match json {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error: failed to serialize model: {e}");
            process::exit(1);
        }
    };

    let written = match &cli.output {
        Some(path) => std::fs::write(path, json.as_bytes()),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(json.as_bytes())
                .and_then(|()| stdout.write_all(b"\n"))
        }
    };
    if let Err(e) = written {
        eprintln!("Error: failed to write output: {e}");
        process::exit(1);
    }

    if let Some(path) = &cli.output {
        log::info!(
            "Wrote {} ({} blocks, {} warnings)",
            path.display(),
            model.body.len(),
            model.warnings.len()
        );
    }
}
