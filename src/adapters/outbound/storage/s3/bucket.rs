use chrono::Utc;
use quick_xml::de::from_str;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::sigv4::RequestSigner;
use crate::{
    adapters::outbound::storage::error::StoreError,
    config::ConnectionConfig,
    domain::{models::BucketCreation, value_objects::BucketName},
};

/// Error document returned by S3-compatible servers
#[derive(Debug, Deserialize)]
struct S3ErrorBody {
    #[serde(rename = "Code", default)]
    code: String,
    #[serde(rename = "Message", default)]
    message: String,
}

fn parse_error_body(body: &str) -> Result<S3ErrorBody, StoreError> {
    from_str(body).map_err(|e| StoreError::Xml(e.to_string()))
}

/// Servers that answer with a non-XML body keep it as the message
fn error_body_or_text(text: String) -> S3ErrorBody {
    parse_error_body(&text).unwrap_or(S3ErrorBody {
        code: String::new(),
        message: text,
    })
}

fn is_already_exists(code: &str) -> bool {
    matches!(code, "BucketAlreadyOwnedByYou" | "BucketAlreadyExists")
}

/// Client for bucket-level S3 calls that `object_store` does not expose
#[derive(Clone)]
pub struct S3BucketClient {
    endpoint: Url,
    region: String,
    path_style: bool,
    signer: RequestSigner,
    http_client: Client,
}

impl S3BucketClient {
    pub fn new(config: &ConnectionConfig) -> Result<Self, StoreError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            endpoint: Url::parse(config.endpoint())?,
            region: config.region().to_string(),
            path_style: config.path_style(),
            signer: RequestSigner::new(config.access_key(), config.secret_key(), config.region()),
            http_client: builder.build()?,
        })
    }

    /// URL and canonical URI addressing the bucket itself
    fn bucket_url(&self, bucket: &BucketName) -> Result<(Url, String), StoreError> {
        let mut url = self.endpoint.clone();
        if self.path_style {
            let uri = format!("/{}", bucket);
            url.set_path(&uri);
            Ok((url, uri))
        } else {
            let host = url
                .host_str()
                .ok_or_else(|| StoreError::Signing("endpoint has no host".to_string()))?;
            let host = format!("{}.{}", bucket, host);
            url.set_host(Some(&host))?;
            url.set_path("/");
            Ok((url, "/".to_string()))
        }
    }

    fn create_bucket_body(&self) -> String {
        if self.region == "us-east-1" {
            String::new()
        } else {
            format!(
                "<CreateBucketConfiguration xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
                 <LocationConstraint>{}</LocationConstraint></CreateBucketConfiguration>",
                self.region
            )
        }
    }

    /// Issue `PUT /{bucket}`; a bucket that already exists is reported, not rejected
    pub async fn create_bucket(&self, bucket: &BucketName) -> Result<BucketCreation, StoreError> {
        let (url, uri) = self.bucket_url(bucket)?;
        let host = host_header(&url)?;
        let body = self.create_bucket_body();

        let signed = self
            .signer
            .sign("PUT", &host, &uri, "", body.as_bytes(), Utc::now())?;

        let response = self
            .http_client
            .put(url)
            .header("x-amz-date", signed.amz_date)
            .header("x-amz-content-sha256", signed.content_sha256)
            .header(reqwest::header::AUTHORIZATION, signed.authorization)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(bucket = %bucket, "bucket created");
            return Ok(BucketCreation::Created);
        }

        let text = response.text().await?;
        let error = error_body_or_text(text);

        if status == StatusCode::CONFLICT && is_already_exists(&error.code) {
            debug!(bucket = %bucket, code = %error.code, "bucket already exists");
            return Ok(BucketCreation::AlreadyExists);
        }

        Err(StoreError::Service {
            status_code: status.as_u16(),
            code: error.code,
            message: error.message,
        })
    }
}

/// Host header value as reqwest will send it
fn host_header(url: &Url) -> Result<String, StoreError> {
    let host = url
        .host_str()
        .ok_or_else(|| StoreError::Signing("endpoint has no host".to_string()))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigOverrides, ConfigResolver, ConnectionDefaults};

    fn client(endpoint: &str, region: &str, path_style: bool) -> S3BucketClient {
        let overrides = ConfigOverrides {
            endpoint: Some(endpoint.to_string()),
            region: Some(region.to_string()),
            access_key: Some("test".to_string()),
            secret_key: Some("test".to_string()),
            path_style: Some(path_style),
            ..Default::default()
        };
        let config = ConfigResolver::new(ConnectionDefaults::default(), overrides, |_: &str| None)
            .resolve()
            .unwrap();
        S3BucketClient::new(&config).unwrap()
    }

    #[test]
    fn test_path_style_bucket_url() {
        let client = client("http://localhost:8333", "us-east-1", true);
        let bucket = BucketName::new("email-attachments").unwrap();

        let (url, uri) = client.bucket_url(&bucket).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8333/email-attachments");
        assert_eq!(uri, "/email-attachments");
        assert_eq!(host_header(&url).unwrap(), "localhost:8333");
    }

    #[test]
    fn test_virtual_hosted_bucket_url() {
        let client = client("https://s3.example.com", "us-east-1", false);
        let bucket = BucketName::new("email-attachments").unwrap();

        let (url, uri) = client.bucket_url(&bucket).unwrap();
        assert_eq!(url.as_str(), "https://email-attachments.s3.example.com/");
        assert_eq!(uri, "/");
        assert_eq!(host_header(&url).unwrap(), "email-attachments.s3.example.com");
    }

    #[test]
    fn test_location_constraint_outside_us_east_1() {
        assert!(client("http://localhost:8333", "us-east-1", true)
            .create_bucket_body()
            .is_empty());

        let body = client("http://localhost:8333", "eu-west-1", true).create_bucket_body();
        assert!(body.contains("<LocationConstraint>eu-west-1</LocationConstraint>"));
    }

    #[test]
    fn test_parse_error_body() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>BucketAlreadyOwnedByYou</Code><Message>Your previous request to create the named bucket succeeded and you already own it.</Message><Resource>/email-attachments</Resource></Error>"#;

        let error = parse_error_body(xml).unwrap();
        assert_eq!(error.code, "BucketAlreadyOwnedByYou");
        assert!(error.message.starts_with("Your previous request"));
        assert!(is_already_exists(&error.code));
        assert!(!is_already_exists("AccessDenied"));
    }

    #[test]
    fn test_non_xml_error_body_kept_as_message() {
        let error = error_body_or_text("upstream unavailable".to_string());
        assert_eq!(error.code, "");
        assert_eq!(error.message, "upstream unavailable");
    }

    // Answers one request with a canned response, then closes the connection
    async fn serve_once(response: String) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_conflict_reported_as_already_exists() {
        let body = "<Error><Code>BucketAlreadyOwnedByYou</Code><Message>owned</Message></Error>";
        let endpoint = serve_once(format!(
            "HTTP/1.1 409 Conflict\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        ))
        .await;
        let bucket = BucketName::new("email-attachments").unwrap();

        let creation = client(&endpoint, "us-east-1", true)
            .create_bucket(&bucket)
            .await
            .unwrap();
        assert_eq!(creation, BucketCreation::AlreadyExists);
    }

    #[tokio::test]
    async fn test_truncated_error_body_is_a_transport_error() {
        // Promises 200 bytes, sends a few, then hangs up
        let endpoint = serve_once(
            "HTTP/1.1 403 Forbidden\r\nContent-Length: 200\r\nConnection: close\r\n\r\n<Error><Code>Acc"
                .to_string(),
        )
        .await;
        let bucket = BucketName::new("email-attachments").unwrap();

        let err = client(&endpoint, "us-east-1", true)
            .create_bucket(&bucket)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Http(_)), "{:?}", err);
    }
}
