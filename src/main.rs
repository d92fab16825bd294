use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod curator;
mod finder;
mod mock;
mod page;
mod render;
mod signing;
mod types;
mod utils;

use config::{ApiConfig, SiteConfig, SiteLayout};
use curator::ManualCurator;
use finder::ProductFinder;
use render::WebsiteUpdater;
use utils::banner;

#[derive(Parser)]
#[command(name = "storefront-updater")]
#[command(about = "Affiliate storefront product finder and category page updater")]
struct Cli {
    /// Site root; default paths are resolved against it
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
    /// Site config file [default: <root>/automation/config.yaml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CredentialArgs {
    #[arg(long, env = "AMAZON_ACCESS_KEY", hide_env_values = true)]
    access_key: Option<String>,
    #[arg(long, env = "AMAZON_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,
    #[arg(long, env = "AMAZON_ASSOCIATE_TAG")]
    associate_tag: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search products for every configured category and save products.json
    Find {
        #[command(flatten)]
        credentials: CredentialArgs,
    },
    /// Publish manually curated products and update the category pages
    Manual {
        /// Manual products file [default: <root>/automation/products-manual.yaml]
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Partner tag for generated affiliate links
        #[arg(long, env = "AMAZON_ASSOCIATE_TAG")]
        associate_tag: Option<String>,
    },
    /// Rewrite category pages from products.json
    Render,
}

fn run_find(layout: &SiteLayout, config_path: &Path, credentials: CredentialArgs) -> Result<()> {
    banner("Amazon Product Finder");

    let config = SiteConfig::load(config_path)?;
    let api = ApiConfig::new(
        credentials.access_key,
        credentials.secret_key,
        credentials.associate_tag,
        &config.amazon,
    );
    let finder = ProductFinder::new(api)?;

    let all_products = finder.find_products_for_all_categories(&config.categories);
    finder.save_products(all_products.clone(), &layout.products_json())?;

    println!("\n{}", "=".repeat(60));
    println!("Summary:");
    for (category, products) in &all_products {
        println!("  {}: {} products", category, products.len());
    }
    println!("{}", "=".repeat(60));
    Ok(())
}

fn run_manual(layout: &SiteLayout, file: Option<PathBuf>, associate_tag: Option<String>) -> Result<()> {
    let path = file.unwrap_or_else(|| layout.manual_products());
    ManualCurator::new(path, associate_tag).update_website(layout)
}

fn run_render(layout: &SiteLayout) -> Result<()> {
    banner("Website Updater");

    let updater = WebsiteUpdater::load(layout.clone())?;
    if updater.products().is_empty() {
        println!("No products to render. Run `storefront-updater find` or `manual` first.");
    }
    updater.update_all_categories()?;
    updater.review_homepage_stats();

    println!();
    banner("Website Update Complete!");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .init();

    let layout = SiteLayout::new(&cli.root);
    let config_path = cli.config.unwrap_or_else(|| layout.config_file());

    match cli.command {
        Commands::Find { credentials } => run_find(&layout, &config_path, credentials),
        Commands::Manual {
            file,
            associate_tag,
        } => run_manual(&layout, file, associate_tag),
        Commands::Render => run_render(&layout),
    }
}
