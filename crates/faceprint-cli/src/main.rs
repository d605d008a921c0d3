use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use faceprint_core::description;
use faceprint_core::{Artifacts, ProfileEngine, ProfileStore};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod config;
mod sidecar;

use config::Config;
use sidecar::SidecarModels;

#[derive(Parser)]
#[command(name = "faceprint", about = "Face profile creation, matching and comparison")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a profile from an image and store it
    Create { image: PathBuf },
    /// List stored profiles
    List,
    /// Show one stored profile
    Get { id: u64 },
    /// Remove a stored profile
    Delete { id: u64 },
    /// Remove every stored profile
    DeleteAll,
    /// Find the stored profile with an identical embedding
    Find { image: PathBuf },
    /// Find the closest stored profile by embedding distance
    Match { image: PathBuf },
    /// Find the closest stored profile by the shape of one region
    MatchFeature {
        image: PathBuf,
        /// left_eyebrow, right_eyebrow, left_eye, right_eye, nose, mouth or jaw
        #[arg(short, long)]
        feature: String,
    },
    /// Per-channel distances between the faces in two images
    Compare { first: PathBuf, second: PathBuf },
    /// Per-channel distances between an image and a stored profile
    CompareId { image: PathBuf, id: u64 },
    /// Per-channel distances against every stored profile
    Scan { image: PathBuf },
    /// Measure image artifacts (needs landmarks only)
    Artifacts { image: PathBuf },
    /// Print the generated profile description
    Describe { image: PathBuf },
    /// Draw detected landmarks onto the image
    Landmarks {
        image: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
}

impl Commands {
    fn mutates_store(&self) -> bool {
        matches!(
            self,
            Commands::Create { .. } | Commands::Delete { .. } | Commands::DeleteAll
        )
    }

    fn images(&self) -> Vec<&Path> {
        match self {
            Commands::Create { image }
            | Commands::Find { image }
            | Commands::Match { image }
            | Commands::MatchFeature { image, .. }
            | Commands::CompareId { image, .. }
            | Commands::Scan { image }
            | Commands::Artifacts { image }
            | Commands::Describe { image }
            | Commands::Landmarks { image, .. } => vec![image.as_path()],
            Commands::Compare { first, second } => vec![first.as_path(), second.as_path()],
            Commands::List | Commands::Get { .. } | Commands::Delete { .. } | Commands::DeleteAll => {
                Vec::new()
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    tracing::debug!(?config, "configuration loaded");

    let store = Arc::new(
        ProfileStore::load(&config.store_path)
            .with_context(|| format!("loading profile store {}", config.store_path.display()))?,
    );

    let mut models = SidecarModels::new(&config.landmarks_suffix, &config.embeddings_suffix);
    let images = cli
        .command
        .images()
        .into_iter()
        .map(|path| models.open(path))
        .collect::<Result<Vec<_>>>()?;

    let mut engine = ProfileEngine::new(&models, &models, Arc::clone(&store));

    match &cli.command {
        Commands::Create { .. } => print_json(&engine.create_profile(&images[0])?)?,
        Commands::List => print_json(&engine.list())?,
        Commands::Get { id } => print_json(&engine.get(*id)?)?,
        Commands::Delete { id } => print_json(&engine.delete(*id)?)?,
        Commands::DeleteAll => {
            print_json(&serde_json::json!({ "deleted": engine.delete_all() }))?
        }
        Commands::Find { .. } => print_json(&engine.find_profile(&images[0])?)?,
        Commands::Match { .. } => print_json(&engine.match_profile(&images[0])?)?,
        Commands::MatchFeature { feature, .. } => {
            print_json(&engine.match_feature(&images[0], feature)?)?
        }
        Commands::Compare { .. } => print_json(&engine.compare_images(&images[0], &images[1])?)?,
        Commands::CompareId { id, .. } => {
            print_json(&engine.compare_to_stored(&images[0], *id)?)?
        }
        Commands::Scan { .. } => print_json(&engine.scan(&images[0])?)?,
        Commands::Artifacts { .. } => {
            let landmarks = engine.detect_landmarks(&images[0])?;
            print_json(&Artifacts::measure(&images[0], &landmarks))?
        }
        Commands::Describe { .. } => {
            let landmarks = engine.detect_landmarks(&images[0])?;
            println!("{}", description::describe(&images[0], &landmarks));
        }
        Commands::Landmarks { output, .. } => {
            engine
                .show_landmarks(&images[0])?
                .save(output)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("{}", output.display());
        }
    }

    if cli.command.mutates_store() {
        store
            .save(&config.store_path)
            .with_context(|| format!("saving profile store {}", config.store_path.display()))?;
    }

    Ok(())
}
