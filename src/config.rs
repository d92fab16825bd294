//! Site layout, YAML site configuration and API credentials

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_MARKETPLACE: &str = "www.amazon.com";
pub const DEFAULT_MAX_PRODUCTS: usize = 6;

/// Where everything lives, relative to the site root
#[derive(Debug, Clone)]
pub struct SiteLayout {
    pub root: PathBuf,
}

impl SiteLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("automation").join("config.yaml")
    }

    pub fn products_json(&self) -> PathBuf {
        self.root.join("automation").join("products.json")
    }

    pub fn manual_products(&self) -> PathBuf {
        self.root.join("automation").join("products-manual.yaml")
    }

    pub fn descriptions_file(&self) -> PathBuf {
        self.root.join("content").join("product-descriptions.yaml")
    }

    pub fn category_page(&self, category_key: &str) -> PathBuf {
        self.root
            .join("categories")
            .join(format!("{}.html", category_key))
    }

    pub fn homepage(&self) -> PathBuf {
        self.root.join("index.html")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AmazonSettings {
    pub region: String,
    pub marketplace: String,
}

impl Default for AmazonSettings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            marketplace: DEFAULT_MARKETPLACE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    pub keywords: Option<String>,
    pub max_products: Option<usize>,
}

impl CategoryConfig {
    /// Search keywords, falling back to the display name
    pub fn keywords(&self) -> &str {
        self.keywords.as_deref().unwrap_or(&self.name)
    }

    pub fn max_products(&self) -> usize {
        self.max_products.unwrap_or(DEFAULT_MAX_PRODUCTS)
    }
}

/// Contents of `automation/config.yaml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub amazon: AmazonSettings,
    /// Category key to settings, in file order
    pub categories: IndexMap<String, CategoryConfig>,
}

impl SiteConfig {
    /// Load the config file. A missing file is a warning and yields the
    /// default config; a file that exists but can't be read or parsed is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Config file not found at {}", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read config {}", path.display()));
            }
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// Everything the product search client needs, passed in explicitly.
///
/// `access_key`, `secret_key` and `partner_tag` must all be present for live
/// requests; if any is missing the client serves sample data instead.
/// `region` and `marketplace` default to `us-east-1` and `www.amazon.com`.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub partner_tag: Option<String>,
    pub region: String,
    pub marketplace: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            access_key: None,
            secret_key: None,
            partner_tag: None,
            region: DEFAULT_REGION.to_string(),
            marketplace: DEFAULT_MARKETPLACE.to_string(),
        }
    }
}

impl ApiConfig {
    /// Combine credentials with the region/marketplace from the site config.
    /// Blank credentials count as missing.
    pub fn new(
        access_key: Option<String>,
        secret_key: Option<String>,
        partner_tag: Option<String>,
        settings: &AmazonSettings,
    ) -> Self {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            access_key: present(access_key),
            secret_key: present(secret_key),
            partner_tag: present(partner_tag),
            region: settings.region.clone(),
            marketplace: settings.marketplace.clone(),
        }
    }

    /// Credentials for live requests, if all three are set
    pub fn credentials(&self) -> Option<Credentials<'_>> {
        Some(Credentials {
            access_key: self.access_key.as_deref()?,
            secret_key: self.secret_key.as_deref()?,
            partner_tag: self.partner_tag.as_deref()?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub access_key: &'a str,
    pub secret_key: &'a str,
    pub partner_tag: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_is_default() {
        let tmp = TempDir::new().unwrap();
        let config = SiteConfig::load(&tmp.path().join("nope.yaml")).unwrap();
        assert!(config.categories.is_empty());
        assert_eq!(config.amazon.region, "us-east-1");
        assert_eq!(config.amazon.marketplace, "www.amazon.com");
    }

    #[test]
    fn test_config_preserves_category_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(
            &path,
            r#"
amazon:
  region: eu-west-1
categories:
  monitors:
    name: Monitors
    keywords: 4k monitor
    max_products: 3
  chairs:
    name: Office Chairs
"#,
        )
        .unwrap();

        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.amazon.region, "eu-west-1");
        assert_eq!(config.amazon.marketplace, "www.amazon.com");

        let keys: Vec<_> = config.categories.keys().cloned().collect();
        assert_eq!(keys, vec!["monitors", "chairs"]);

        let chairs = &config.categories["chairs"];
        assert_eq!(chairs.keywords(), "Office Chairs");
        assert_eq!(chairs.max_products(), 6);
        assert_eq!(config.categories["monitors"].max_products(), 3);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "categories: [unclosed").unwrap();
        assert!(SiteConfig::load(&path).is_err());
    }

    #[test]
    fn test_unreadable_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = SiteConfig::load(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }

    #[test]
    fn test_credentials_require_all_three() {
        let settings = AmazonSettings::default();
        let partial = ApiConfig::new(Some("AK".into()), Some("SK".into()), None, &settings);
        assert!(partial.credentials().is_none());

        let blank = ApiConfig::new(Some("AK".into()), Some("  ".into()), Some("tag-20".into()), &settings);
        assert!(blank.credentials().is_none());

        let full = ApiConfig::new(Some("AK".into()), Some("SK".into()), Some("tag-20".into()), &settings);
        let creds = full.credentials().unwrap();
        assert_eq!(creds.partner_tag, "tag-20");
    }

    #[test]
    fn test_layout_paths() {
        let layout = SiteLayout::new("/srv/site");
        assert_eq!(layout.category_page("chairs"), PathBuf::from("/srv/site/categories/chairs.html"));
        assert_eq!(layout.products_json(), PathBuf::from("/srv/site/automation/products.json"));
    }
}
