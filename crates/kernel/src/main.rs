//! dom-bootstrap command line.
//!
//! Loads a site file, renders tile regions and manages tile placements.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use dom_bootstrap::config::Config;
use dom_bootstrap::config_storage::YamlConfigStorage;
use dom_bootstrap::site::{Site, SiteFile};
use dom_bootstrap::theme::ThemeEngine;

/// Bootstrap presentation tiles for menus, tabs and logos.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the tiles of a region for a path.
    Render {
        /// Request path.
        #[arg(long, default_value = "/")]
        path: String,

        /// Region to render.
        #[arg(long, default_value = "content")]
        region: String,

        /// Site user to render for (anonymous when omitted).
        #[arg(long)]
        user: Option<String>,

        /// Print the render trees as JSON instead of HTML.
        #[arg(long)]
        json: bool,
    },

    /// Inspect and configure tile placements.
    Tile {
        #[command(subcommand)]
        command: TileCommand,
    },

    /// List menus.
    Menus,
}

#[derive(Subcommand, Debug)]
enum TileCommand {
    /// List tile plugins and placements.
    List,

    /// Show a placement and its configuration form.
    Show {
        /// Placement machine name.
        machine_name: String,
    },

    /// Submit configuration values for a placement.
    Configure {
        /// Placement machine name.
        machine_name: String,

        /// Form values as `name=value`; `true`/`false` become booleans.
        #[arg(long = "set", value_parser = parse_value)]
        values: Vec<(String, Value)>,
    },
}

fn parse_value(raw: &str) -> std::result::Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let value = match value {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        other => Value::String(other.to_string()),
    };
    Ok((name.trim().to_string(), value))
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let args = Args::parse();
    let config = Config::from_env().context("failed to load configuration")?;
    info!(site_file = %config.site_file.display(), "configuration loaded");

    let site = load_site(&config)?;

    match args.command {
        Command::Render {
            path,
            region,
            user,
            json,
        } => {
            let user = site
                .user(user.as_deref())
                .with_context(|| format!("unknown user '{}'", user.unwrap_or_default()))?;
            if json {
                let ctx = site.context(&path, &user);
                let mut trees = serde_json::Map::new();
                for placement in site.placements()? {
                    if placement.region == region && placement.status && placement.is_visible(&path, &user.roles) {
                        let element = site.build_placement(&placement, &ctx)?;
                        trees.insert(placement.machine_name, serde_json::to_value(element)?);
                    }
                }
                println!("{}", serde_json::to_string_pretty(&trees)?);
            } else {
                println!("{}", site.render_region(&region, &path, &user)?);
            }
        }
        Command::Tile { command } => match command {
            TileCommand::List => {
                println!("Plugins:");
                for definition in site.tiles().definitions() {
                    println!(
                        "  {:<32} {} ({})",
                        definition.id, definition.label, definition.category
                    );
                }
                println!("Placements:");
                for placement in site.placements()? {
                    println!(
                        "  {:<20} {:<32} region={} weight={}{}",
                        placement.machine_name,
                        placement.tile_type,
                        placement.region,
                        placement.weight,
                        if placement.status { "" } else { " (disabled)" }
                    );
                }
            }
            TileCommand::Show { machine_name } => {
                let placement = site.placement(&machine_name)?;
                let tile = site.tiles().create_for(&placement)?;
                println!("{}", serde_yml::to_string(&placement)?);
                println!(
                    "{}",
                    serde_json::to_string_pretty(&tile.form(site.services()))?
                );
            }
            TileCommand::Configure {
                machine_name,
                values,
            } => {
                let placement = site.configure(&machine_name, values)?;
                println!("{}", serde_json::to_string_pretty(&placement.settings)?);
            }
        },
        Command::Menus => {
            for menu in site.services().menus().load_multiple() {
                println!("{:<20} {}", menu.id, menu.label);
            }
        }
    }

    Ok(())
}

fn load_site(config: &Config) -> Result<Site> {
    let file = SiteFile::load(&config.site_file)?;
    let storage = YamlConfigStorage::open(&config.config_dir)?;
    let theme = ThemeEngine::new(config.template_dir.as_deref())?;
    Site::build(file, Arc::new(storage), theme).context("failed to build site")
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
