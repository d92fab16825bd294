//! Category page renderer: product cards into `categories/<key>.html`

use anyhow::{Context, Result};
use chrono::Local;
use std::collections::HashMap;
use std::fs;
use tracing::warn;

use crate::config::SiteLayout;
use crate::page::replace_products;
use crate::types::{CatalogSnapshot, CategoryBucket, ProductRecord};
use crate::utils::{banner, html_escape, osc8_file_link};

pub const DEFAULT_DESCRIPTION: &str = "Quality product for your home office.";
const GENERIC_FEATURES: [&str; 4] = [
    "High-quality construction",
    "Great customer reviews",
    "Fast shipping available",
    "Reliable performance",
];
const MAX_CARD_FEATURES: usize = 4;
const PLACEHOLDER_GLYPH: &str = "🪑";
const DESCRIPTION_KEY_LEN: usize = 30;

/// Lookup key for custom descriptions: lowercased, spaces to underscores,
/// first 30 characters.
///
/// Names sharing a 30-character prefix map to the same key.
pub fn description_key(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "_")
        .chars()
        .take(DESCRIPTION_KEY_LEN)
        .collect()
}

/// Load `content/product-descriptions.yaml`; missing, empty or unreadable
/// files mean no overrides
pub fn load_custom_descriptions(layout: &SiteLayout) -> HashMap<String, String> {
    let path = layout.descriptions_file();
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(_) => return HashMap::new(),
    };
    if content.trim().is_empty() {
        return HashMap::new();
    }
    match serde_yaml::from_str::<Option<HashMap<String, String>>>(&content) {
        Ok(descriptions) => descriptions.unwrap_or_default(),
        Err(e) => {
            warn!("Ignoring custom descriptions in {}: {}", path.display(), e);
            HashMap::new()
        }
    }
}

/// Result of updating one category page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageUpdate {
    Updated { products: usize },
    MissingPage,
    MissingContainer,
}

pub struct WebsiteUpdater {
    layout: SiteLayout,
    products: CategoryBucket,
    descriptions: HashMap<String, String>,
}

impl WebsiteUpdater {
    /// Renderer fed from the snapshot file. A missing snapshot is a warning
    /// and leaves nothing to render.
    pub fn load(layout: SiteLayout) -> Result<Self> {
        let path = layout.products_json();
        let products = if path.exists() {
            CatalogSnapshot::load(&path)?.products
        } else {
            warn!("Products file not found at {}", path.display());
            CategoryBucket::new()
        };
        Ok(Self::with_products(layout, products))
    }

    /// Renderer fed with products already in memory
    pub fn with_products(layout: SiteLayout, products: CategoryBucket) -> Self {
        let descriptions = load_custom_descriptions(&layout);
        Self {
            layout,
            products,
            descriptions,
        }
    }

    pub fn products(&self) -> &CategoryBucket {
        &self.products
    }

    fn description_for<'a>(&'a self, product: &'a ProductRecord) -> &'a str {
        if let Some(custom) = self.descriptions.get(&description_key(&product.name)) {
            return custom;
        }
        if !product.description.is_empty() {
            &product.description
        } else {
            DEFAULT_DESCRIPTION
        }
    }

    /// HTML for a single product card; `index` is zero-based
    pub fn product_card_html(&self, product: &ProductRecord, index: usize) -> String {
        let badge_html = match product.tier() {
            Some(tier) => format!(
                r#"<div class="product-badge {}">{}</div>"#,
                tier.as_str(),
                tier.badge_label()
            ),
            None => String::new(),
        };

        let features_html = if product.features.is_empty() {
            GENERIC_FEATURES
                .iter()
                .map(|f| format!("<li>✓ {}</li>", html_escape(f)))
                .collect::<Vec<_>>()
        } else {
            product
                .features
                .iter()
                .take(MAX_CARD_FEATURES)
                .map(|f| format!("<li>✓ {}</li>", html_escape(f)))
                .collect::<Vec<_>>()
        }
        .join("\n      ");

        let name = html_escape(&product.name);

        let image_html = if !product.image_url.is_empty() {
            format!(
                r#"<img src="{}" alt="{}" style="width: 100%; height: 100%; object-fit: cover;">"#,
                html_escape(&product.image_url),
                name
            )
        } else {
            format!(r#"<span class="product-emoji">{}</span>"#, PLACEHOLDER_GLYPH)
        };

        format!(
            r#"
<!-- Product Card {} -->
<div class="product-card">
  {}
  <div class="product-image-placeholder">
    {}
  </div>
  <div class="product-content">
    <h3 class="product-name">{}</h3>
    <div class="product-price">{}</div>
    <p class="product-description">{}</p>
    <ul class="product-features">
      {}
    </ul>
    <div class="product-footer">
      <a href="{}" class="btn btn-primary btn-block" data-affiliate="true" data-product-name="{}">
        View on Amazon →
      </a>
    </div>
  </div>
</div>"#,
            index + 1,
            badge_html,
            image_html,
            name,
            html_escape(product.display_price()),
            html_escape(self.description_for(product)),
            features_html,
            html_escape(&product.affiliate_url),
            name
        )
    }

    /// Rewrite one category page. Missing page or container is reported
    /// and the page is left alone.
    pub fn update_category_page(&self, category_key: &str, products: &[ProductRecord]) -> Result<PageUpdate> {
        let page_path = self.layout.category_page(category_key);

        if !page_path.exists() {
            warn!("Category file not found: {}", page_path.display());
            return Ok(PageUpdate::MissingPage);
        }

        println!("Updating {} with {} products...", page_path.display(), products.len());

        let source = fs::read_to_string(&page_path)
            .with_context(|| format!("Failed to read {}", page_path.display()))?;

        let cards: Vec<String> = products
            .iter()
            .enumerate()
            .map(|(idx, product)| self.product_card_html(product, idx))
            .collect();

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let Some(html) = replace_products(&source, &cards, &timestamp) else {
            warn!("Could not find products-grid in {}", page_path.display());
            return Ok(PageUpdate::MissingContainer);
        };

        fs::write(&page_path, html)
            .with_context(|| format!("Failed to write {}", page_path.display()))?;

        println!(
            "  ✓ Updated {}",
            osc8_file_link(&page_path, &page_path.display().to_string())
        );
        Ok(PageUpdate::Updated {
            products: products.len(),
        })
    }

    /// Rewrite every category page that has data, in bucket order
    pub fn update_all_categories(&self) -> Result<Vec<(String, PageUpdate)>> {
        println!();
        banner("Updating Category Pages");

        let mut results = Vec::new();
        for (category_key, products) in &self.products {
            let outcome = self.update_category_page(category_key, products)?;
            results.push((category_key.clone(), outcome));
        }

        println!("\n✓ All category pages updated!");
        Ok(results)
    }

    /// Count products for the homepage stats. The homepage itself is not
    /// modified; its stats are hand-maintained placeholders.
    pub fn review_homepage_stats(&self) -> Option<usize> {
        println!("\nUpdating homepage stats...");

        let index_file = self.layout.homepage();
        if !index_file.exists() {
            warn!("index.html not found");
            return None;
        }

        let total_products = self.products.values().map(Vec::len).sum();
        println!("  ✓ Homepage stats reviewed ({} products listed)", total_products);
        Some(total_products)
    }
}
