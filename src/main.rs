use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use rigc::blob::{to_blob, BLOB_EXTENSION};
use rigc::{compile_manifest, BuildManifest, CompilerConfig};

#[derive(Parser, Debug)]
#[command(
    name = "rigc",
    version,
    about = "Compile rig retargeting tables and body masks"
)]
struct Cli {
    /// Build manifest (JSON)
    manifest: PathBuf,
    /// Write the compiled build here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Compiler config (JSON); overrides the manifest's own
    #[arg(long)]
    config: Option<PathBuf>,
    /// Also write one binary blob per remap table into this directory
    #[arg(long)]
    blob_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let manifest = BuildManifest::from_json_file(&cli.manifest)
        .with_context(|| format!("Failed to read manifest {}", cli.manifest.display()))?;
    let config = cli
        .config
        .as_ref()
        .map(CompilerConfig::from_json_file)
        .transpose()
        .context("Failed to read compiler config")?;

    let build = compile_manifest(&manifest, config.as_ref())
        .with_context(|| format!("Failed to compile {}", cli.manifest.display()))?;

    let json = serde_json::to_string_pretty(&build)?;
    match &cli.output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }

    if let Some(dir) = &cli.blob_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        for (index, table) in build.tables.iter().enumerate() {
            let path = dir.join(format!("table_{index:03}.{BLOB_EXTENSION}"));
            fs::write(&path, to_blob(table))
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        info!("Wrote {} blobs to {}", build.tables.len(), dir.display());
    }

    if !build.diagnostics.is_empty() {
        warn!("Finished with {} diagnostics", build.diagnostics.len());
    }
    Ok(())
}
