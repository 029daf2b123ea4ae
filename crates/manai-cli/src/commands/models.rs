//! Models command - inspect and install OCR model assets.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;

use manai_core::ocr::{asset_status, install_models};

use super::load_config_with_model_dir;

/// Arguments for the models command.
#[derive(Args)]
pub struct ModelsArgs {
    /// Model directory (overrides the configuration)
    #[arg(short, long, global = true)]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: ModelsCommand,
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// Check which model assets are installed
    Status,

    /// Show the model directory
    Path,

    /// Copy model assets into the model directory
    Install(InstallArgs),
}

#[derive(Args)]
struct InstallArgs {
    /// Directory holding the model files to install
    #[arg(long = "from", required = true)]
    source: PathBuf,
}

pub async fn run(args: ModelsArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config_with_model_dir(config_path, args.model_dir)?;

    match args.command {
        ModelsCommand::Status => check_status(&config.models),
        ModelsCommand::Path => {
            println!("{}", config.models.model_dir.display());
            Ok(())
        }
        ModelsCommand::Install(install_args) => install(&install_args.source, &config.models),
    }
}

fn check_status(config: &manai_core::ModelConfig) -> anyhow::Result<()> {
    println!("{}", style("Model Status").bold());
    println!("Model directory: {}", style(config.model_dir.display()).cyan());
    println!();

    let mut ready = true;
    let mut total_size: u64 = 0;

    for asset in asset_status(config) {
        let (status, size_str) = if asset.present {
            let size = fs::metadata(&asset.path)?.len();
            total_size += size;
            (style("✓").green(), format_size(size))
        } else if asset.required {
            ready = false;
            (style("✗").red(), "missing".to_string())
        } else {
            (style("-").dim(), "not installed".to_string())
        };

        let note = if asset.required { "" } else { " (optional)" };
        println!("    {} {:<25} {:>14}{}", status, asset.name, size_str, note);
    }

    println!();
    if ready {
        println!(
            "    {} Ready ({} total)",
            style("✓").green(),
            format_size(total_size)
        );
    } else {
        println!(
            "    {} Run 'manai models install --from <dir>' to install",
            style("⚠").yellow()
        );
    }

    Ok(())
}

fn install(source: &Path, config: &manai_core::ModelConfig) -> anyhow::Result<()> {
    if !source.is_dir() {
        anyhow::bail!("Source directory not found: {}", source.display());
    }

    let installed = install_models(source, config)?;

    for path in &installed {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        println!("  {} Installed {}", style("✓").green(), name);
    }

    if installed.is_empty() {
        println!("{} All model assets already installed.", style("ℹ").blue());
    } else {
        println!(
            "{} Installed {} files into {}",
            style("✓").green().bold(),
            installed.len(),
            config.model_dir.display()
        );
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.1}GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.1}MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.1}KB", bytes as f64 / 1_000.0)
    } else {
        format!("{}B", bytes)
    }
}
