//! AWS Signature Version 4 for Product Advertising API requests

use anyhow::Result;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const SERVICE: &str = "ProductAdvertisingAPI";
pub const OPERATION: &str = "SearchItems";
const PARTNER_TYPE: &str = "Associates";
const SIGNED_HEADERS: &str = "host";

/// RFC 3986 unreserved characters stay as-is, everything else is escaped
const QUERY_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub authorization: String,
    pub canonical_query: String,
}

#[derive(Debug, Clone)]
pub struct RequestSigner {
    access_key: String,
    secret_key: String,
    partner_tag: String,
    region: String,
    host: String,
}

impl RequestSigner {
    pub fn new(
        access_key: &str,
        secret_key: &str,
        partner_tag: &str,
        region: &str,
        host: &str,
    ) -> Self {
        Self {
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
            partner_tag: partner_tag.to_string(),
            region: region.to_string(),
            host: host.to_string(),
        }
    }

    pub fn sign(
        &self,
        method: &str,
        uri: &str,
        params: &mut BTreeMap<String, String>,
    ) -> Result<SignedRequest> {
        self.sign_at(method, uri, params, Utc::now())
    }

    /// Sign a request as of `now`. Injects `Operation`, `PartnerTag`,
    /// `PartnerType` and `Timestamp` into `params`.
    pub fn sign_at(
        &self,
        method: &str,
        uri: &str,
        params: &mut BTreeMap<String, String>,
        now: DateTime<Utc>,
    ) -> Result<SignedRequest> {
        let timestamp = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = now.format("%Y%m%d").to_string();

        params.insert("Operation".to_string(), OPERATION.to_string());
        params.insert("PartnerTag".to_string(), self.partner_tag.clone());
        params.insert("PartnerType".to_string(), PARTNER_TYPE.to_string());
        params.insert("Timestamp".to_string(), timestamp.clone());

        let canonical_query = canonical_query(params);
        let canonical_headers = format!("host:{}\n", self.host);
        let payload_hash = sha256_hex(b"");

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method, uri, canonical_query, canonical_headers, SIGNED_HEADERS, payload_hash
        );

        let credential_scope = format!("{}/{}/{}/aws4_request", date_stamp, self.region, SERVICE);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            timestamp,
            credential_scope,
            sha256_hex(canonical_request.as_bytes())
        );

        let signing_key = signing_key(&self.secret_key, &date_stamp, &self.region, SERVICE)?;
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.access_key, credential_scope, SIGNED_HEADERS, signature
        );

        Ok(SignedRequest {
            authorization,
            canonical_query,
        })
    }
}

/// Sorted `key=value` pairs joined with `&`, both sides percent-encoded
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(k, QUERY_ENCODE),
                utf8_percent_encode(v, QUERY_ENCODE)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// kDate -> kRegion -> kService -> kSigning
pub fn signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Result<Vec<u8>> {
    let k_date = hmac_sha256(format!("AWS4{}", secret_key).as_bytes(), date_stamp.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| anyhow::anyhow!("Invalid signing key: {}", e))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 30).unwrap()
    }

    fn signer() -> RequestSigner {
        RequestSigner::new("AKIDEXAMPLE", "secret", "mytag-20", "us-east-1", "www.amazon.com")
    }

    #[test]
    fn test_signing_key_matches_published_vector() {
        let key = signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        )
        .unwrap();
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_empty_payload_hash() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_canonical_query_sorted_and_encoded() {
        let mut params = BTreeMap::new();
        params.insert("Resources".to_string(), "ItemInfo.Title,Images.Primary.Large".to_string());
        params.insert("Keywords".to_string(), "standing desk".to_string());
        params.insert("ItemCount".to_string(), "6".to_string());
        assert_eq!(
            canonical_query(&params),
            "ItemCount=6&Keywords=standing%20desk&Resources=ItemInfo.Title%2CImages.Primary.Large"
        );
    }

    #[test]
    fn test_sign_injects_required_params() {
        let mut params = BTreeMap::new();
        params.insert("Keywords".to_string(), "desk lamp".to_string());

        let signed = signer().sign_at("GET", "/paapi5/searchitems", &mut params, fixed_time()).unwrap();

        assert_eq!(params["Operation"], "SearchItems");
        assert_eq!(params["PartnerTag"], "mytag-20");
        assert_eq!(params["PartnerType"], "Associates");
        assert_eq!(params["Timestamp"], "20240309T140530Z");
        assert_eq!(
            signed.canonical_query,
            "Keywords=desk%20lamp&Operation=SearchItems&PartnerTag=mytag-20&PartnerType=Associates&Timestamp=20240309T140530Z"
        );
    }

    #[test]
    fn test_authorization_header_shape() {
        let mut params = BTreeMap::new();
        let signed = signer().sign_at("GET", "/paapi5/searchitems", &mut params, fixed_time()).unwrap();

        let prefix = "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240309/us-east-1/ProductAdvertisingAPI/aws4_request, SignedHeaders=host, Signature=";
        assert!(signed.authorization.starts_with(prefix));
        let signature = &signed.authorization[prefix.len()..];
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_signature_is_deterministic_and_key_dependent() {
        let sign_with = |signer: &RequestSigner| {
            let mut params = BTreeMap::new();
            params.insert("Keywords".to_string(), "monitor".to_string());
            signer.sign_at("GET", "/paapi5/searchitems", &mut params, fixed_time()).unwrap()
        };

        let a = sign_with(&signer());
        let b = sign_with(&signer());
        assert_eq!(a, b);

        let other = RequestSigner::new("AKIDEXAMPLE", "other-secret", "mytag-20", "us-east-1", "www.amazon.com");
        let c = sign_with(&other);
        assert_eq!(a.canonical_query, c.canonical_query);
        assert_ne!(a.authorization, c.authorization);
    }
}
