//! Sample products served when the Product Advertising API can't be used

use crate::types::ProductRecord;

const FALLBACK_CATEGORY: &str = "chairs";

// (name, price_range, tier)
type Sample = (&'static str, &'static str, &'static str);

const CHAIRS: &[Sample] = &[
    ("Ergonomic Mesh Office Chair", "$150-200", "budget"),
    ("Executive Leather Chair", "$250-350", "mid"),
    ("Premium Ergonomic Task Chair", "$600-900", "premium"),
    ("Gaming Chair with Lumbar Support", "$200-300", "mid"),
    ("Drafting Stool for Standing Desk", "$150-250", "budget"),
    ("High-Back Executive Chair", "$300-400", "mid"),
];

const DESKS: &[Sample] = &[
    ("Adjustable Standing Desk", "$300-500", "mid"),
    ("Budget L-Shaped Desk", "$150-250", "budget"),
    ("Premium Electric Standing Desk", "$700-1000", "premium"),
    ("Compact Computer Desk", "$100-150", "budget"),
    ("Executive Wood Desk", "$400-600", "mid"),
    ("Gaming Desk with LED", "$250-350", "mid"),
];

const MONITORS: &[Sample] = &[
    ("27\" 4K Monitor", "$300-400", "mid"),
    ("24\" Budget Full HD Monitor", "$120-180", "budget"),
    ("32\" Curved Gaming Monitor", "$400-600", "premium"),
    ("Ultrawide 34\" Monitor", "$500-700", "premium"),
    ("Portable USB-C Monitor", "$200-300", "mid"),
    ("Dual Monitor Mount", "$50-100", "budget"),
];

const LIGHTING: &[Sample] = &[
    ("LED Desk Lamp with USB", "$30-50", "budget"),
    ("Monitor Light Bar", "$80-120", "mid"),
    ("Smart LED Strip Lights", "$40-70", "mid"),
    ("Floor Lamp for Office", "$60-100", "mid"),
    ("Clamp Desk Lamp", "$25-40", "budget"),
    ("Ring Light for Video Calls", "$50-80", "mid"),
];

const AUDIO_VIDEO: &[Sample] = &[
    ("Wireless Noise-Cancelling Headset", "$150-250", "mid"),
    ("1080p Webcam", "$60-100", "mid"),
    ("USB Condenser Microphone", "$80-120", "mid"),
    ("Budget Wired Headset", "$30-50", "budget"),
    ("Premium 4K Webcam", "$150-200", "premium"),
    ("Bluetooth Speaker", "$40-70", "budget"),
];

/// "Audio Video" -> "audio-video"
pub fn normalize_category(category: &str) -> String {
    category.to_lowercase().replace(' ', "-")
}

fn samples_for(category_key: &str) -> Option<&'static [Sample]> {
    match category_key {
        "chairs" => Some(CHAIRS),
        "desks" => Some(DESKS),
        "monitors" => Some(MONITORS),
        "lighting" => Some(LIGHTING),
        "audio-video" => Some(AUDIO_VIDEO),
        _ => None,
    }
}

/// Sample products for a category (unknown categories get the chairs list),
/// truncated to `count`
pub fn mock_products(category: &str, count: usize) -> Vec<ProductRecord> {
    let key = normalize_category(category);
    let samples = samples_for(&key)
        .or_else(|| samples_for(FALLBACK_CATEGORY))
        .unwrap_or_default();

    samples
        .iter()
        .take(count)
        .map(|(name, price_range, tier)| ProductRecord {
            name: name.to_string(),
            price_range: price_range.to_string(),
            tier: tier.to_string(),
            ..Default::default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(products: &[ProductRecord]) -> Vec<&str> {
        products.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_known_category() {
        let products = mock_products("desks", 10);
        assert_eq!(products.len(), 6);
        assert_eq!(products[0].name, "Adjustable Standing Desk");
        assert_eq!(products[0].price_range, "$300-500");
        assert_eq!(products[0].tier, "mid");
    }

    #[test]
    fn test_category_key_is_normalized() {
        assert_eq!(
            names(&mock_products("Audio Video", 2)),
            vec!["Wireless Noise-Cancelling Headset", "1080p Webcam"]
        );
    }

    #[test]
    fn test_unknown_category_falls_back_to_chairs() {
        assert_eq!(mock_products("plants", 6), mock_products("chairs", 6));
    }

    #[test]
    fn test_truncation() {
        assert_eq!(mock_products("lighting", 3).len(), 3);
        assert!(mock_products("lighting", 0).is_empty());
    }
}
