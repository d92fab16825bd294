//! Product Advertising API search client with sample-data fallback

use anyhow::Result;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{ApiConfig, CategoryConfig, Credentials};
use crate::mock::mock_products;
use crate::signing::RequestSigner;
use crate::types::{affiliate_url, CatalogSnapshot, CategoryBucket, ProductRecord};

const SEARCH_PATH: &str = "/paapi5/searchitems";
const SEARCH_INDEX: &str = "OfficeProducts";
const RESOURCES: &str = "Images.Primary.Large,ItemInfo.Title,ItemInfo.Features,Offers.Listings.Price";
const MAX_FEATURES: usize = 5;
const API_DEFAULT_RATING: f64 = 4.0;
const API_DEFAULT_REVIEW_COUNT: u64 = 100;

/// Pause between categories in a batch run
pub const CATEGORY_PAUSE: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request signing failed: {0}")]
    Signing(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("invalid response body: {0}")]
    Parse(#[from] serde_json::Error),
}

/// What a live search attempt produced
#[derive(Debug)]
pub enum SearchOutcome {
    Success(Vec<ProductRecord>),
    NoCredentials,
    TransientFailure(FetchError),
}

// Search response types. Items stay as raw JSON so one bad item can be
// skipped without failing the whole response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct SearchResponse {
    search_result: SearchResult,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct SearchResult {
    items: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ApiItem {
    #[serde(rename = "ASIN")]
    asin: Option<String>,
    item_info: ItemInfo,
    images: Images,
    customer_reviews: CustomerReviews,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ItemInfo {
    title: DisplayValue,
    features: DisplayValues,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DisplayValue {
    display_value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DisplayValues {
    display_values: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Images {
    primary: PrimaryImage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct PrimaryImage {
    large: ImageSize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImageSize {
    #[serde(rename = "URL")]
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct CustomerReviews {
    star_rating: StarRating,
    count: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct StarRating {
    value: Option<f64>,
}

/// Format the first listing's price: `$X.XX` for USD, `X.XX CUR` otherwise,
/// `$0.00` when anything is missing or malformed
pub fn extract_price(item: &Value) -> String {
    let price = item
        .get("Offers")
        .and_then(|o| o.get("Listings"))
        .and_then(|l| l.get(0))
        .and_then(|l| l.get("Price"));

    let Some(price) = price else {
        return "$0.00".to_string();
    };

    let Some(amount) = price.get("Amount").and_then(Value::as_f64) else {
        return "$0.00".to_string();
    };

    match price.get("Currency") {
        None => format!("${:.2}", amount),
        Some(Value::String(currency)) if currency == "USD" => format!("${:.2}", amount),
        Some(Value::String(currency)) => format!("{:.2} {}", amount, currency),
        Some(_) => "$0.00".to_string(),
    }
}

/// Affiliate link for an ASIN, or `#` when either piece is missing
pub fn generate_affiliate_url(asin: Option<&str>, tag: Option<&str>) -> String {
    match (asin, tag) {
        (Some(asin), Some(tag)) if !asin.is_empty() && !tag.is_empty() => affiliate_url(asin, tag),
        _ => "#".to_string(),
    }
}

/// Turn a search response body into product records, skipping items that
/// don't have the expected shape
pub fn parse_products(body: &Value, partner_tag: Option<&str>) -> Vec<ProductRecord> {
    let response: SearchResponse = match serde_json::from_value(body.clone()) {
        Ok(r) => r,
        Err(e) => {
            warn!("Unexpected search response shape: {}", e);
            return Vec::new();
        }
    };

    let mut products = Vec::new();

    for raw in &response.search_result.items {
        let item: ApiItem = match serde_json::from_value(raw.clone()) {
            Ok(item) => item,
            Err(e) => {
                warn!("Error parsing product: {}", e);
                continue;
            }
        };

        let price = extract_price(raw);
        let mut features = item.item_info.features.display_values;
        features.truncate(MAX_FEATURES);

        products.push(ProductRecord {
            affiliate_url: generate_affiliate_url(item.asin.as_deref(), partner_tag),
            asin: item.asin.unwrap_or_default(),
            name: item
                .item_info
                .title
                .display_value
                .unwrap_or_else(|| "Unknown Product".to_string()),
            price_range: price.clone(),
            price,
            image_url: item.images.primary.large.url.unwrap_or_default(),
            features,
            rating: item.customer_reviews.star_rating.value.unwrap_or(API_DEFAULT_RATING),
            review_count: item.customer_reviews.count.unwrap_or(API_DEFAULT_REVIEW_COUNT),
            description: String::new(),
            tier: String::new(),
        });
    }

    products
}

pub struct ProductFinder {
    api: ApiConfig,
    client: reqwest::blocking::Client,
    pause: Duration,
}

impl ProductFinder {
    pub fn new(api: ApiConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; StorefrontUpdater/1.0)")
            .build()?;
        Ok(Self {
            api,
            client,
            pause: CATEGORY_PAUSE,
        })
    }

    /// Override the pause between categories
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Products for a category, falling back to sample data when the API
    /// can't be used
    pub fn search(&self, category: &str, keywords: &str, max_results: usize) -> Vec<ProductRecord> {
        match self.try_search(keywords, max_results) {
            SearchOutcome::Success(products) => products,
            SearchOutcome::NoCredentials => {
                warn!("Amazon PA-API credentials not set. Returning mock data.");
                debug!("Using mock data for category: {}", category);
                mock_products(category, max_results)
            }
            SearchOutcome::TransientFailure(e) => {
                warn!("Error fetching products from Amazon: {}", e);
                debug!("Using mock data for category: {}", category);
                mock_products(category, max_results)
            }
        }
    }

    /// One live search attempt, no fallback
    pub fn try_search(&self, keywords: &str, max_results: usize) -> SearchOutcome {
        let Some(creds) = self.api.credentials() else {
            return SearchOutcome::NoCredentials;
        };

        match self.fetch(creds, keywords, max_results) {
            Ok(products) => SearchOutcome::Success(products),
            Err(e) => SearchOutcome::TransientFailure(e),
        }
    }

    fn fetch(
        &self,
        creds: Credentials<'_>,
        keywords: &str,
        max_results: usize,
    ) -> std::result::Result<Vec<ProductRecord>, FetchError> {
        let mut params = BTreeMap::new();
        params.insert("Keywords".to_string(), keywords.to_string());
        params.insert("SearchIndex".to_string(), SEARCH_INDEX.to_string());
        params.insert("ItemCount".to_string(), max_results.to_string());
        params.insert("Resources".to_string(), RESOURCES.to_string());

        let signer = RequestSigner::new(
            creds.access_key,
            creds.secret_key,
            creds.partner_tag,
            &self.api.region,
            &self.api.marketplace,
        );
        let signed = signer
            .sign("GET", SEARCH_PATH, &mut params)
            .map_err(|e| FetchError::Signing(e.to_string()))?;

        let url = format!(
            "https://{}{}?{}",
            self.api.marketplace, SEARCH_PATH, signed.canonical_query
        );
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", signed.authorization)
            .header("Content-Type", "application/json")
            .send()?;

        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(FetchError::Status { status, body: text });
        }

        let body: Value = serde_json::from_str(&text)?;
        Ok(parse_products(&body, Some(creds.partner_tag)))
    }

    /// Search every configured category in config order
    pub fn find_products_for_all_categories(
        &self,
        categories: &IndexMap<String, CategoryConfig>,
    ) -> CategoryBucket {
        let mut all_products = CategoryBucket::new();

        for (category_key, category) in categories {
            println!("\nFinding products for: {}", category.name);

            let products = self.search(category_key, category.keywords(), category.max_products());
            println!("  Found {} products", products.len());
            all_products.insert(category_key.clone(), products);

            // Fixed courtesy pause, not adaptive
            thread::sleep(self.pause);
        }

        all_products
    }

    pub fn save_products(&self, products: CategoryBucket, path: &Path) -> Result<()> {
        CatalogSnapshot::new(products, None).save(path)?;
        println!("\nProducts saved to {}", path.display());
        Ok(())
    }
}
