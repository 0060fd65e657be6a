//! AWS Signature Version 4 for the few S3 requests issued outside `object_store`.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::adapters::outbound::storage::error::StoreError;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";

/// Headers to attach to a signed request
#[derive(Debug, Clone, PartialEq)]
pub struct SignedHeaders {
    pub authorization: String,
    pub amz_date: String,
    pub content_sha256: String,
}

/// Signs requests for one set of credentials and one region
#[derive(Clone)]
pub struct RequestSigner {
    access_key: String,
    secret_key: String,
    region: String,
    service: String,
}

impl RequestSigner {
    pub fn new(access_key: &str, secret_key: &str, region: &str) -> Self {
        Self {
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
            region: region.to_string(),
            service: "s3".to_string(),
        }
    }

    /// Sign a request.
    ///
    /// `host` must be exactly what the transport sends in the Host header
    /// (including a non-default port), `uri` the already-encoded path and
    /// `query` the canonical query string (sorted, encoded, empty if none).
    pub fn sign(
        &self,
        method: &str,
        host: &str,
        uri: &str,
        query: &str,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> Result<SignedHeaders, StoreError> {
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let content_sha256 = hex::encode(Sha256::digest(payload));

        let canonical_request =
            canonical_request(method, host, uri, query, &content_sha256, &amz_date);
        let credential_scope = format!(
            "{}/{}/{}/aws4_request",
            date_stamp, self.region, self.service
        );
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            credential_scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let key = signing_key(&self.secret_key, &date_stamp, &self.region, &self.service)?;
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.access_key, credential_scope, SIGNED_HEADERS, signature
        );

        Ok(SignedHeaders {
            authorization,
            amz_date,
            content_sha256,
        })
    }
}

fn canonical_request(
    method: &str,
    host: &str,
    uri: &str,
    query: &str,
    content_sha256: &str,
    amz_date: &str,
) -> String {
    let canonical_headers = format!(
        "host:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n",
        host, content_sha256, amz_date
    );
    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method, uri, query, canonical_headers, SIGNED_HEADERS, content_sha256
    )
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| StoreError::Signing(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn signing_key(
    secret_key: &str,
    date_stamp: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, StoreError> {
    let k_date = hmac_sha256(format!("AWS4{}", secret_key).as_bytes(), date_stamp.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}
