//! spoilboard CLI
//!
//! Generates spoilboard documents from TOML presets and inspects the result.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use spoilboard::{bed_holes, generate, sheet_holes, synthesize, SpoilboardConfig, ToolProfile};
use spoilboard_ir::Document;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "spoilboard")]
#[command(about = "Parametric CNC spoilboard generator", long_about = None)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the spoilboard document
    Generate {
        /// TOML configuration
        config: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format (default: from the output extension, else json)
        #[arg(short, long, value_enum)]
        format: Option<Format>,
    },
    /// Validate a configuration and print hole counts
    Check {
        /// TOML configuration
        config: PathBuf,
    },
    /// List the holes that end up on the sheet
    Holes {
        /// TOML configuration
        config: PathBuf,
        /// Also print each hole's machining segments
        #[arg(long)]
        stacks: bool,
    },
    /// Display information about a generated document
    Info {
        /// Document in JSON or compact form
        file: PathBuf,
    },
    /// Write the reference configuration as a starting point
    Init {
        /// Destination TOML file
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Pretty-printed JSON
    Json,
    /// Line-oriented compact text
    Compact,
}

impl Format {
    fn from_path(path: Option<&Path>) -> Self {
        match path.and_then(|p| p.extension()).and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("sbir") => Format::Compact,
            _ => Format::Json,
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate {
            config,
            output,
            format,
        } => generate_document(&config, output.as_deref(), format)?,
        Commands::Check { config } => check_config(&config)?,
        Commands::Holes { config, stacks } => list_holes(&config, stacks)?,
        Commands::Info { file } => show_info(&file)?,
        Commands::Init { path, force } => write_default(&path, force)?,
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<SpoilboardConfig> {
    let cfg = SpoilboardConfig::load(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    debug!(path = %path.display(), "configuration loaded");
    Ok(cfg)
}

fn generate_document(config: &Path, output: Option<&Path>, format: Option<Format>) -> Result<()> {
    let cfg = load_config(config)?;
    let generated = generate(&cfg)?;

    let text = match format.unwrap_or_else(|| Format::from_path(output)) {
        Format::Json => generated.document.to_json()?,
        Format::Compact => spoilboard_ir::to_compact(&generated.document)?,
    };

    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "document written");
            eprintln!("{}", generated.report);
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn check_config(config: &Path) -> Result<()> {
    let cfg = load_config(config)?;
    cfg.validate()?;
    let bed = bed_holes(&cfg);
    let sheet = sheet_holes(&cfg, &bed)?;

    println!("{}: ok", config.display());
    println!("  Bed holes: {}", bed.len());
    println!("  Sheet holes: {}", sheet.len());
    println!("  Mounting holes: {}", sheet.mount_count());
    println!("  Stock thickness: {:.2} mm", cfg.stock_thickness());
    println!("  Hole depth: {:.2} mm", cfg.hole_depth());
    Ok(())
}

fn list_holes(config: &Path, stacks: bool) -> Result<()> {
    let cfg = load_config(config)?;
    cfg.validate()?;
    let sheet = sheet_holes(&cfg, &bed_holes(&cfg))?;
    let profile = ToolProfile::from_config(&cfg);

    for (i, hole) in sheet.iter().enumerate() {
        let kind = if hole.is_mount { "mount" } else { "hole" };
        println!("{:>3}  {:>8.2} {:>8.2}  {}", i, hole.x, hole.y, kind);
        if stacks {
            for seg in synthesize(&profile, hole).segments() {
                println!(
                    "       {:<18} z {:>7.3} .. {:>7.3}  r {:>6.3} -> {:>6.3}",
                    seg.kind.as_str(),
                    seg.z_start,
                    seg.z_end(),
                    seg.radius_bottom,
                    seg.radius_top
                );
            }
        }
    }
    Ok(())
}

fn read_document(file: &Path) -> Result<Document> {
    let text =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let doc = if text.trim_start().starts_with('{') {
        Document::from_json(&text)?
    } else {
        spoilboard_ir::from_compact(&text)?
    };
    Ok(doc)
}

fn show_info(file: &Path) -> Result<()> {
    let doc = read_document(file)?;

    println!("spoilboard document: {}", file.display());
    println!("  Version: {}", doc.version);
    println!("  Nodes: {}", doc.nodes.len());
    println!("  Primitives: {}", doc.primitive_count());
    println!("  Materials: {}", doc.materials.len());
    println!("  Scene entries: {}", doc.roots.len());

    if !doc.roots.is_empty() {
        println!("\nScene:");
        for (i, entry) in doc.roots.iter().enumerate() {
            let name = doc
                .nodes
                .get(&entry.root)
                .and_then(|n| n.name.as_deref())
                .unwrap_or("unnamed");
            println!("  {}: {} (material: {})", i + 1, name, entry.material);
        }
    }

    let dangling = doc.dangling_refs();
    if !dangling.is_empty() {
        anyhow::bail!("document references missing nodes: {:?}", dangling);
    }
    Ok(())
}

fn write_default(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let text = SpoilboardConfig::default().to_toml_string()?;
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote reference configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(Format::from_path(Some(Path::new("board.sbir"))), Format::Compact);
        assert_eq!(Format::from_path(Some(Path::new("board.SBIR"))), Format::Compact);
        assert_eq!(Format::from_path(Some(Path::new("board.json"))), Format::Json);
        assert_eq!(Format::from_path(None), Format::Json);
    }

    #[test]
    fn cli_parses_generate() {
        let cli = Cli::try_parse_from([
            "spoilboard",
            "-v",
            "generate",
            "presets/genmitsu-3030-pro.toml",
            "-o",
            "out.sbir",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Generate { output, format, .. } => {
                assert_eq!(output, Some(PathBuf::from("out.sbir")));
                assert_eq!(format, None);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
