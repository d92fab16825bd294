//! Product catalog types shared by the finder, the curator and the renderer

use anyhow::{Context, Result};
use chrono::Local;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_PRODUCT_NAME: &str = "Product Name";
pub const DEFAULT_AFFILIATE_URL: &str = "#";
pub const DEFAULT_RATING: f64 = 4.5;
pub const DEFAULT_REVIEW_COUNT: u64 = 100;

/// Category key (e.g. "chairs") to products, in rendering order
pub type CategoryBucket = IndexMap<String, Vec<ProductRecord>>;

/// Coarse price segment shown as a badge on the product card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Budget,
    Mid,
    Premium,
}

impl Tier {
    /// Case-insensitive; anything unrecognized yields no tier
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "budget" => Some(Tier::Budget),
            "mid" => Some(Tier::Mid),
            "premium" => Some(Tier::Premium),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Budget => "budget",
            Tier::Mid => "mid",
            Tier::Premium => "premium",
        }
    }

    pub fn badge_label(&self) -> &'static str {
        match self {
            Tier::Budget => "Budget Pick",
            Tier::Mid => "Mid-Range",
            Tier::Premium => "Premium Pick",
        }
    }
}

fn default_name() -> String {
    DEFAULT_PRODUCT_NAME.to_string()
}

fn default_affiliate_url() -> String {
    DEFAULT_AFFILIATE_URL.to_string()
}

fn default_rating() -> f64 {
    DEFAULT_RATING
}

fn default_review_count() -> u64 {
    DEFAULT_REVIEW_COUNT
}

/// Canonical product record.
///
/// Every field has a serde default, so a snapshot written by an older run
/// (or by the mock data path, which only knows name/price/tier) still
/// deserializes into a record the renderer can use as-is. Empty strings
/// mean "absent" for `description`, `image_url`, `tier` and the price fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub asin: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub price_range: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub image_url: String,
    /// Kept as text so unknown values survive a snapshot round-trip
    #[serde(default)]
    pub tier: String,
    #[serde(default = "default_affiliate_url")]
    pub affiliate_url: String,
    #[serde(default = "default_rating")]
    pub rating: f64,
    #[serde(default = "default_review_count")]
    pub review_count: u64,
}

impl Default for ProductRecord {
    fn default() -> Self {
        Self {
            name: default_name(),
            asin: String::new(),
            price: String::new(),
            price_range: String::new(),
            description: String::new(),
            features: Vec::new(),
            image_url: String::new(),
            tier: String::new(),
            affiliate_url: default_affiliate_url(),
            rating: DEFAULT_RATING,
            review_count: DEFAULT_REVIEW_COUNT,
        }
    }
}

impl ProductRecord {
    pub fn tier(&self) -> Option<Tier> {
        Tier::from_str(&self.tier)
    }

    /// Price shown on the card: range first, then the single price
    pub fn display_price(&self) -> &str {
        if !self.price_range.is_empty() {
            &self.price_range
        } else if !self.price.is_empty() {
            &self.price
        } else {
            "Check Amazon"
        }
    }
}

/// Build an affiliate deep link for an ASIN
pub fn affiliate_url(asin: &str, tag: &str) -> String {
    format!("https://www.amazon.com/dp/{}?tag={}", asin, tag)
}

/// The JSON hand-off between a product source and the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub products: CategoryBucket,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl CatalogSnapshot {
    /// Snapshot stamped with the current local time
    pub fn new(products: CategoryBucket, source: Option<&str>) -> Self {
        Self {
            last_updated: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            products,
            source: source.map(str::to_string),
        }
    }

    /// Overwrite `path` with this snapshot (2-space pretty JSON)
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_tier_parsing() {
        assert_eq!(Tier::from_str("budget"), Some(Tier::Budget));
        assert_eq!(Tier::from_str("Premium"), Some(Tier::Premium));
        assert_eq!(Tier::from_str(" MID "), Some(Tier::Mid));
        assert_eq!(Tier::from_str("luxury"), None);
        assert_eq!(Tier::from_str(""), None);
        assert_eq!(Tier::Budget.badge_label(), "Budget Pick");
    }

    #[test]
    fn test_affiliate_url_is_stable() {
        let first = affiliate_url("B08XYZ1234", "mytag-20");
        let second = affiliate_url("B08XYZ1234", "mytag-20");
        assert_eq!(first, second);
        assert_eq!(first, "https://www.amazon.com/dp/B08XYZ1234?tag=mytag-20");
    }

    #[test]
    fn test_sparse_record_gets_defaults() {
        let record: ProductRecord =
            serde_json::from_str(r#"{"name": "Desk Lamp", "price_range": "$30-50", "tier": "budget"}"#)
                .unwrap();
        assert_eq!(record.name, "Desk Lamp");
        assert_eq!(record.affiliate_url, "#");
        assert_eq!(record.rating, 4.5);
        assert_eq!(record.review_count, 100);
        assert!(record.features.is_empty());
        assert_eq!(record.tier(), Some(Tier::Budget));

        let empty: ProductRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, ProductRecord::default());
        assert_eq!(empty.name, "Product Name");
    }

    #[test]
    fn test_display_price_fallbacks() {
        let mut record = ProductRecord::default();
        assert_eq!(record.display_price(), "Check Amazon");
        record.price = "$19.99".to_string();
        assert_eq!(record.display_price(), "$19.99");
        record.price_range = "$15-25".to_string();
        assert_eq!(record.display_price(), "$15-25");
    }

    #[test]
    fn test_snapshot_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("automation").join("products.json");

        let mut products = CategoryBucket::new();
        products.insert(
            "monitors".to_string(),
            vec![ProductRecord {
                name: "27\" 4K Monitor".to_string(),
                tier: "mid".to_string(),
                ..Default::default()
            }],
        );
        products.insert("chairs".to_string(), Vec::new());

        let snapshot = CatalogSnapshot::new(products, None);
        snapshot.save(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("\"source\""));
        assert!(raw.contains("\n  \"products\""));

        let loaded = CatalogSnapshot::load(&path).unwrap();
        assert_eq!(loaded, snapshot);
        let keys: Vec<_> = loaded.products.keys().cloned().collect();
        assert_eq!(keys, vec!["monitors", "chairs"]);
    }

    #[test]
    fn test_hand_edited_snapshot_without_timestamp() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("products.json");
        fs::write(&path, r#"{"products":{"chairs":[{"name":"A"}]}}"#).unwrap();

        let loaded = CatalogSnapshot::load(&path).unwrap();
        assert!(loaded.last_updated.is_empty());
        assert_eq!(loaded.products["chairs"][0].name, "A");
        assert_eq!(loaded.products["chairs"][0].rating, DEFAULT_RATING);
    }
}
