//! Manually curated products from `automation/products-manual.yaml`

use anyhow::Result;
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

use crate::config::SiteLayout;
use crate::render::WebsiteUpdater;
use crate::types::{
    affiliate_url, CatalogSnapshot, CategoryBucket, ProductRecord, DEFAULT_AFFILIATE_URL,
    DEFAULT_PRODUCT_NAME, DEFAULT_RATING, DEFAULT_REVIEW_COUNT,
};
use crate::utils::banner;

/// Tag used when a link has to be generated and no partner tag is configured
pub const FALLBACK_PARTNER_TAG: &str = "yourname-20";
pub const MANUAL_SOURCE: &str = "manual";
const DEFAULT_PRICE: &str = "Check Amazon";
const DEFAULT_TIER: &str = "mid";

/// One operator-authored product, as written in the YAML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManualProduct {
    pub name: Option<String>,
    pub asin: Option<String>,
    pub price_range: Option<String>,
    pub description: Option<String>,
    pub features: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub tier: Option<String>,
    pub affiliate_url: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ManualFile {
    #[serde(default)]
    products: Option<IndexMap<String, Vec<serde_yaml::Value>>>,
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

impl ManualProduct {
    /// Names of required fields that are missing or empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !present(&self.name) {
            missing.push("name");
        }
        if !present(&self.asin) {
            missing.push("asin");
        }
        if !present(&self.price_range) {
            missing.push("price_range");
        }
        if !present(&self.affiliate_url) {
            missing.push("affiliate_url");
        }
        missing
    }
}

pub struct ManualCurator {
    path: PathBuf,
    partner_tag: Option<String>,
    products: IndexMap<String, Vec<ManualProduct>>,
}

impl ManualCurator {
    pub fn new(path: impl Into<PathBuf>, partner_tag: Option<String>) -> Self {
        let path = path.into();
        let products = load_manual_products(&path);
        Self {
            path,
            partner_tag: partner_tag.filter(|t| !t.trim().is_empty()),
            products,
        }
    }

    /// Raw entries as loaded, per category
    pub fn entries(&self) -> &IndexMap<String, Vec<ManualProduct>> {
        &self.products
    }

    /// Generate an affiliate link, using the fallback tag if none is given
    pub fn generate_affiliate_url(&self, asin: &str, tag: Option<&str>) -> String {
        let tag = tag
            .or(self.partner_tag.as_deref())
            .unwrap_or(FALLBACK_PARTNER_TAG);
        affiliate_url(asin, tag)
    }

    /// Fill every canonical field; generates the affiliate link from the
    /// ASIN when it's absent and a partner tag is configured
    pub fn normalize(&self, product: &ManualProduct) -> ProductRecord {
        let mut link = product.affiliate_url.clone().filter(|u| !u.trim().is_empty());
        if link.is_none() {
            if let (Some(asin), Some(tag)) = (product.asin.as_deref(), self.partner_tag.as_deref()) {
                if !asin.trim().is_empty() {
                    link = Some(self.generate_affiliate_url(asin, Some(tag)));
                }
            }
        }

        let price = product
            .price_range
            .clone()
            .unwrap_or_else(|| DEFAULT_PRICE.to_string());

        ProductRecord {
            name: product.name.clone().unwrap_or_else(|| DEFAULT_PRODUCT_NAME.to_string()),
            asin: product.asin.clone().unwrap_or_default(),
            price: price.clone(),
            price_range: price,
            description: product.description.clone().unwrap_or_default(),
            features: product.features.clone().unwrap_or_default(),
            image_url: product.image_url.clone().unwrap_or_default(),
            tier: product.tier.clone().unwrap_or_else(|| DEFAULT_TIER.to_string()),
            affiliate_url: link.unwrap_or_else(|| DEFAULT_AFFILIATE_URL.to_string()),
            rating: product.rating.unwrap_or(DEFAULT_RATING),
            review_count: product.review_count.unwrap_or(DEFAULT_REVIEW_COUNT),
        }
    }

    /// Validate and normalize every entry. Invalid entries are dropped with
    /// a warning; every category key is kept, even if it ends up empty.
    pub fn process_products(&self) -> CategoryBucket {
        let mut processed = CategoryBucket::new();

        for (category, products) in &self.products {
            let mut records = Vec::new();

            for product in products {
                let missing = product.missing_fields();
                if !missing.is_empty() {
                    warn!("Product in {} missing: {}", category, missing.join(", "));
                    continue;
                }
                records.push(self.normalize(product));
            }

            println!("✅ Processed {} products for {}", records.len(), category);
            processed.insert(category.clone(), records);
        }

        processed
    }

    /// Process, save the snapshot and rewrite the category pages
    pub fn update_website(&self, layout: &SiteLayout) -> Result<()> {
        banner("Manual Product Updater - Updating Website");

        if self.entries().is_empty() {
            println!("❌ No products to update. Please add products to {}", self.path.display());
            return Ok(());
        }
        let total: usize = self.entries().values().map(Vec::len).sum();
        println!("Loaded {} manual entries from {}", total, self.path.display());

        let processed = self.process_products();

        let products_file = layout.products_json();
        CatalogSnapshot::new(processed.clone(), Some(MANUAL_SOURCE)).save(&products_file)?;
        println!("\n✅ Saved products to {}", products_file.display());

        println!();
        banner("Updating HTML Files");

        let updater = WebsiteUpdater::with_products(layout.clone(), processed);
        updater.update_all_categories()?;

        println!();
        banner("✅ Website Updated Successfully!");
        println!("\n📝 Next steps:");
        println!("  1. Check your category pages to verify updates");
        println!("  2. Commit and push changes to GitHub");
        println!("  3. Wait 1-2 minutes for site to deploy");
        println!("\nCommands to push:");
        println!("  git add -A");
        println!("  git commit -m \"Update products manually\"");
        println!("  git push");

        Ok(())
    }
}

/// Read the `products:` mapping. Problems are reported and yield no products;
/// a record that can't be read is skipped and the rest of its category kept.
fn load_manual_products(path: &Path) -> IndexMap<String, Vec<ManualProduct>> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            error!("Manual products file not found: {}", path.display());
            println!("📝 Please create it using products-manual.example.yaml as a template");
            return IndexMap::new();
        }
        Err(e) => {
            error!("Could not read manual products file {}: {}", path.display(), e);
            return IndexMap::new();
        }
    };

    if content.trim().is_empty() {
        return IndexMap::new();
    }

    let raw = match serde_yaml::from_str::<ManualFile>(&content) {
        Ok(file) => file.products.unwrap_or_default(),
        Err(e) => {
            error!("Error loading manual products: {}", e);
            return IndexMap::new();
        }
    };

    raw.into_iter()
        .map(|(category, entries)| {
            let products = entries
                .into_iter()
                .enumerate()
                .filter_map(|(idx, entry)| match serde_yaml::from_value::<ManualProduct>(entry) {
                    Ok(product) => Some(product),
                    Err(e) => {
                        warn!("Skipping product {} in {}: {}", idx + 1, category, e);
                        None
                    }
                })
                .collect();
            (category, products)
        })
        .collect()
}
