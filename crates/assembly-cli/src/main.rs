//! Assembly CLI - Main entry point
//!
//! Manage products, inspect models, show and replay station plans, and save
//! hand-written drafts against the planning backend.

mod client;
mod config;
mod draft;
mod replay;

use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use assembly_core::{require_admin, DataService, LoadError, PlanPersistor, ProductId};
use assembly_scene::models::load_glb_file;
use assembly_scene::{load_glb, PlaybackSession, SceneModel, Viewport};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::draft::DraftFile;
use crate::replay::Replay;

#[derive(Parser, Debug)]
#[command(name = "assembly")]
#[command(about = "Assembly instruction planning tools")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "assembly.toml")]
    config: PathBuf,

    /// GraphQL endpoint (overrides the config file)
    #[arg(long)]
    endpoint: Option<String>,

    /// Admin bearer token (overrides the config file)
    #[arg(long)]
    token: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every product
    Products,
    /// Create a product with no model yet
    CreateProduct {
        name: String,
    },
    /// List the named meshes in a GLB model
    Meshes {
        model: PathBuf,
    },
    /// Show the assembly plan assigned to a station
    Plan {
        station: String,
    },
    /// Step through a station's plan in the terminal
    Replay {
        station: String,
        /// Use a local model instead of downloading the plan's asset
        #[arg(long)]
        model: Option<PathBuf>,
        /// Wait for Enter between steps
        #[arg(short, long)]
        interactive: bool,
    },
    /// Save a TOML draft as a new plan for a product
    Save {
        #[arg(long)]
        product_id: ProductId,
        /// Draft file listing components in step order
        #[arg(long)]
        draft: PathBuf,
        /// Check every mesh against this model before saving
        #[arg(long)]
        model: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Assembly v{}", env!("CARGO_PKG_VERSION"));

    let mut config = config::load_config(&args.config)?;
    if let Some(endpoint) = args.endpoint {
        config.service.endpoint = endpoint;
    }
    if let Some(token) = args.token {
        config.service.token = Some(token);
    }

    match args.command {
        Command::Products => list_products(&config).await,
        Command::CreateProduct { name } => create_product(&config, &name).await,
        Command::Meshes { model } => list_meshes(&model),
        Command::Plan { station } => show_plan(&config, &station).await,
        Command::Replay {
            station,
            model,
            interactive,
        } => replay_plan(&config, &station, model.as_deref(), interactive).await,
        Command::Save {
            product_id,
            draft,
            model,
        } => save_draft(&config, product_id, &draft, model.as_deref()).await,
    }
}

async fn list_products(config: &Config) -> Result<()> {
    let service = client::connect(&config.service)?;
    require_admin(&service).await?;

    let products = service.list_products().await?;
    if products.is_empty() {
        println!("No products found. Create one!");
        return Ok(());
    }
    for product in &products {
        println!("{} (ID: {})", product.name, product.id);
    }
    Ok(())
}

fn product_name(raw: &str) -> Result<&str> {
    let name = raw.trim();
    if name.is_empty() {
        bail!("Please enter a product name.");
    }
    Ok(name)
}

async fn create_product(config: &Config, name: &str) -> Result<()> {
    let name = product_name(name)?;
    let service = client::connect(&config.service)?;
    require_admin(&service).await?;

    let product = service
        .create_product(name)
        .await
        .map_err(|e| anyhow!("Error creating product: {}", e))?;
    info!(id = product.id, "Created product");
    println!("Product created! ID: {}", product.id);
    Ok(())
}

fn list_meshes(path: &Path) -> Result<()> {
    let model = load_glb_file(path).with_context(|| format!("Failed to load {}", path.display()))?;
    println!("{} meshes in {}:", model.len(), path.display());
    for node in model.nodes() {
        let center = node.bounds.center();
        let size = node.bounds.size();
        println!(
            "  - {} at ({:.3}, {:.3}, {:.3}) size ({:.3}, {:.3}, {:.3})",
            node.name, center.x, center.y, center.z, size.x, size.y, size.z
        );
    }
    Ok(())
}

async fn show_plan(config: &Config, station: &str) -> Result<()> {
    let service = client::connect(&config.service)?;
    let plan = service
        .plan_by_station(station)
        .await?
        .ok_or_else(|| LoadError::PlanNotFound(station.to_string()))?;

    println!("Plan: {}", plan.name);
    if let Some(product) = &plan.product {
        println!("Product: {}", product.name);
        if let Some(path) = &product.model_path {
            println!("Model: {}", config.service.asset_url(path));
        }
    }
    for step in &plan.steps {
        println!(
            "  {}. {}: {} [{}]",
            step.step_number, step.action_type, step.component.name, step.component.mesh_id
        );
    }
    Ok(())
}

async fn replay_plan(
    config: &Config,
    station: &str,
    local_model: Option<&Path>,
    interactive: bool,
) -> Result<()> {
    let service = client::connect(&config.service)?;
    let plan = service
        .plan_by_station(station)
        .await?
        .ok_or_else(|| LoadError::PlanNotFound(station.to_string()))?;

    let model = match local_model {
        Some(path) => load_glb_file(path).with_context(|| format!("Failed to load {}", path.display()))?,
        None => {
            let path = plan.model_path().ok_or(LoadError::MissingModelPath)?;
            let url = config.service.asset_url(path);
            let bytes = service.transport().fetch_bytes(&url).await?;
            load_glb(&bytes).with_context(|| format!("Failed to load model from {}", url))?
        }
    };

    let mut player = PlaybackSession::new(config.player_settings(), Viewport::default());
    player.scene.camera.fov_y = config.viewer.fov;
    let settle = config.player_settings().focus_duration;
    let mut replay = Replay::start(player, plan, model, settle);

    let stdin = std::io::stdin();
    let mut input = stdin.lock().lines();
    loop {
        println!("{}", replay.screen());
        if replay.is_complete() {
            break;
        }
        if interactive {
            match input.next() {
                Some(line) => {
                    line?;
                }
                None => break,
            }
        }
        replay.next();
    }
    Ok(())
}

async fn save_draft(
    config: &Config,
    product_id: ProductId,
    draft_path: &Path,
    local_model: Option<&Path>,
) -> Result<()> {
    let file = DraftFile::load(draft_path)?;
    if let Some(path) = local_model {
        let model: SceneModel =
            load_glb_file(path).with_context(|| format!("Failed to load {}", path.display()))?;
        file.check_meshes(&model)?;
    }
    let draft = file.to_draft(product_id)?;

    let service = client::connect(&config.service)?;
    let session = require_admin(&service).await?;
    info!(user = %session.username, "Authorized");

    service
        .product_by_id(product_id)
        .await?
        .ok_or(LoadError::ProductNotFound(product_id))?;

    let persistor = PlanPersistor::new();
    let plan = persistor
        .save(&service, draft)
        .await
        .map_err(|e| anyhow!("Error saving plan: {}", e))?;
    println!("Assembly plan '{}' saved successfully (ID: {})", plan.name, plan.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_name_is_trimmed_and_required() {
        assert_eq!(product_name("  Trolley ").unwrap(), "Trolley");
        assert_eq!(
            product_name("   ").unwrap_err().to_string(),
            "Please enter a product name."
        );
    }

    #[test]
    fn test_create_product_arguments() {
        let args = Args::try_parse_from(["assembly", "--token", "t", "create-product", "Trolley"])
            .unwrap();
        assert_eq!(args.token.as_deref(), Some("t"));
        assert!(matches!(args.command, Command::CreateProduct { name } if name == "Trolley"));

        let args = Args::try_parse_from(["assembly", "products"]).unwrap();
        assert!(matches!(args.command, Command::Products));
    }
}
