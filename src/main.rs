//! Havenkit command line: resolves one asset's files.json and shows what a
//! loader would fetch.
//!
//! Usage:
//!   havenkit rock.json models                  # load spec at the configured tier
//!   havenkit sky.json 0 --tier 4k              # kind by type number
//!   havenkit rock.json models textures/a.png   # also remap glTF references

use anyhow::{Context, Result};
use clap::Parser;
use havenkit::assets::{resolve, ENVIRONMENT_CATEGORY, MODEL_CATEGORY};
use havenkit::catalog::{AssetKind, CatalogEndpoint, FileManifest};
use havenkit::config::{load_config_from_file, KitConfig};
use havenkit::progress::ProgressTracker;
use havenkit::LoadManager;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "havenkit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resolve a catalog file listing into loadable URLs")]
struct Cli {
    /// files.json as returned by the catalog's /files endpoint
    files: PathBuf,

    /// Asset kind: hdris, textures, models, or type number 0/1/2
    #[arg(value_parser = parse_kind)]
    kind: AssetKind,

    /// Resolution tier (defaults to the configured tier)
    #[arg(long)]
    tier: Option<String>,

    /// Session config JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Asset id (defaults to the file stem)
    #[arg(long)]
    id: Option<String>,

    /// Requested URLs to run through the remapper
    urls: Vec<String>,
}

fn parse_kind(value: &str) -> std::result::Result<AssetKind, String> {
    AssetKind::from_catalog_type(value)
        .or_else(|| value.parse().ok().and_then(AssetKind::from_type_num))
        .ok_or_else(|| format!("unknown asset kind '{}'", value))
}

fn load_manifest(path: &Path) -> Result<FileManifest> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    FileManifest::from_json_str(&json)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => KitConfig::default(),
    };
    let tier = cli.tier.unwrap_or_else(|| config.resolution_tier.clone());
    let asset_id = cli.id.unwrap_or_else(|| {
        cli.files
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "asset".to_string())
    });

    let request = config.catalog_request(&CatalogEndpoint::Files(asset_id.clone()));
    log::info!("Catalog listing: {} (as {})", request.url, request.user_agent);

    let manifest = load_manifest(&cli.files)?;
    let spec = resolve(&manifest, cli.kind, &tier);
    if let Err(err) = spec.require_renderable() {
        let available = match cli.kind {
            AssetKind::TextureSet => Vec::new(),
            AssetKind::Environment => manifest.tiers(ENVIRONMENT_CATEGORY),
            AssetKind::Model => manifest.tiers(MODEL_CATEGORY),
        };
        if !available.is_empty() {
            log::info!("Available tiers: {}", available.join(", "));
        }
        return Err(err).with_context(|| format!("Cannot load '{}'", asset_id));
    }

    let progress = ProgressTracker::shared();
    let manager = LoadManager::start(&progress, &asset_id, spec);

    println!("{}", serde_json::to_string_pretty(manager.spec())?);
    for url in &cli.urls {
        println!("{} -> {}", url, manager.request_url(url));
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    run(Cli::parse())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_accepts_slug_or_type_number() {
        assert_eq!(parse_kind("models"), Ok(AssetKind::Model));
        assert_eq!(parse_kind("0"), Ok(AssetKind::Environment));
        assert_eq!(parse_kind("1"), Ok(AssetKind::TextureSet));
        assert!(parse_kind("7").is_err());
        assert!(parse_kind("meshes").is_err());
    }

    #[test]
    fn arguments_parse_into_cli() {
        let cli = Cli::try_parse_from([
            "havenkit", "rock.json", "models", "--tier", "2k", "a/tex.png", "b.bin",
        ])
        .unwrap();
        assert_eq!(cli.files, PathBuf::from("rock.json"));
        assert_eq!(cli.kind, AssetKind::Model);
        assert_eq!(cli.tier.as_deref(), Some("2k"));
        assert_eq!(cli.config, None);
        assert_eq!(cli.urls, vec!["a/tex.png", "b.bin"]);

        assert!(Cli::try_parse_from(["havenkit", "rock.json", "meshes"]).is_err());
        assert!(Cli::try_parse_from(["havenkit", "rock.json"]).is_err());
    }
}
