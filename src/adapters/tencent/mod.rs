//! Client for the Tencent Cloud SSL certificate API (version 2019-12-05).

pub mod signer;

use crate::domain::model::CertificateSummary;
use crate::domain::ports::CertificateApi;
use crate::utils::error::{RenewError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use url::Url;

pub use signer::Credential;

pub const DEFAULT_ENDPOINT: &str = "https://ssl.tencentcloudapi.com";
pub const API_VERSION: &str = "2019-12-05";
pub const SERVICE: &str = "ssl";
pub const DV_AUTH_METHOD: &str = "DNS_AUTO";

const PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone)]
pub struct TencentSslClient {
    client: Client,
    credential: Credential,
    endpoint: String,
    host: String,
    region: String,
    dv_auth_method: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Response")]
    response: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ResponseMeta {
    #[serde(rename = "Error")]
    error: Option<ApiErrorBody>,
    #[serde(rename = "RequestId", default)]
    request_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiErrorBody {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeCertificatesData {
    #[serde(default)]
    total_count: u64,
    #[serde(default)]
    certificates: Option<Vec<CertificateSummary>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApplyCertificateData {
    certificate_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeCertificateData {
    #[serde(default)]
    deployable: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DownloadCertificateData {
    #[serde(default)]
    content: Option<String>,
}

impl TencentSslClient {
    pub fn with_endpoint(
        credential: Credential,
        region: impl Into<String>,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let url = Url::parse(endpoint).map_err(|e| RenewError::InvalidConfigValueError {
            field: "endpoint".to_string(),
            value: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(RenewError::InvalidConfigValueError {
                    field: "endpoint".to_string(),
                    value: endpoint.to_string(),
                    reason: "URL has no host".to_string(),
                })
            }
        };

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            credential,
            endpoint: endpoint.to_string(),
            host,
            region: region.into(),
            dv_auth_method: DV_AUTH_METHOD.to_string(),
        })
    }

    pub fn with_dv_auth_method(mut self, method: impl Into<String>) -> Self {
        self.dv_auth_method = method.into();
        self
    }

    async fn call<P: Serialize, T: DeserializeOwned>(&self, action: &str, params: &P) -> Result<T> {
        let payload = serde_json::to_string(params)?;
        let timestamp = chrono::Utc::now().timestamp();
        let authorization = signer::authorization(
            &self.credential,
            SERVICE,
            &self.host,
            action,
            &payload,
            timestamp,
        )?;

        tracing::debug!("Calling {} on {}", action, self.endpoint);
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", signer::CONTENT_TYPE)
            .header("Host", &self.host)
            .header("X-TC-Action", action)
            .header("X-TC-Version", API_VERSION)
            .header("X-TC-Timestamp", timestamp.to_string())
            .header("Authorization", authorization);
        if !self.region.is_empty() {
            request = request.header("X-TC-Region", &self.region);
        }

        let response = request.body(payload).send().await?.error_for_status()?;
        let body = response.text().await?;
        tracing::debug!("{} response: {} bytes", action, body.len());

        let Envelope { response } = serde_json::from_str(&body)?;
        let ResponseMeta { error, request_id } = ResponseMeta::deserialize(&response)?;

        if let Some(err) = error {
            tracing::error!("An API error has returned: [{}] {} ({})", err.code, err.message, request_id);
            return Err(RenewError::ApiError {
                code: err.code,
                message: err.message,
                request_id,
            });
        }

        serde_json::from_value(response).map_err(|e| {
            tracing::error!("Malformed {} response ({}): {}", action, request_id, e);
            RenewError::SerializationError(e)
        })
    }
}

#[async_trait]
impl CertificateApi for TencentSslClient {
    async fn describe_certificates(&self) -> Result<Vec<CertificateSummary>> {
        let mut all = Vec::new();
        let mut offset = 0u64;

        loop {
            let page: DescribeCertificatesData = self
                .call(
                    "DescribeCertificates",
                    &json!({ "Offset": offset, "Limit": PAGE_SIZE }),
                )
                .await?;
            let certificates = page.certificates.unwrap_or_default();
            let fetched = certificates.len() as u64;
            all.extend(certificates);
            offset += fetched;

            tracing::debug!("Listed {}/{} certificates", offset, page.total_count);
            if fetched == 0 || offset >= page.total_count {
                break;
            }
        }

        Ok(all)
    }

    async fn apply_certificate(&self, domain: &str) -> Result<String> {
        let data: ApplyCertificateData = self
            .call(
                "ApplyCertificate",
                &json!({ "DvAuthMethod": self.dv_auth_method, "DomainName": domain }),
            )
            .await?;
        Ok(data.certificate_id)
    }

    async fn describe_certificate(&self, certificate_id: &str) -> Result<bool> {
        let data: DescribeCertificateData = self
            .call("DescribeCertificate", &json!({ "CertificateId": certificate_id }))
            .await?;
        Ok(data.deployable.unwrap_or(false))
    }

    async fn download_certificate(&self, certificate_id: &str) -> Result<Vec<u8>> {
        let data: DownloadCertificateData = self
            .call("DownloadCertificate", &json!({ "CertificateId": certificate_id }))
            .await?;

        match data.content.as_deref().map(str::trim) {
            Some(content) if !content.is_empty() => Ok(STANDARD.decode(content)?),
            _ => Err(RenewError::BundleError {
                message: format!("certificate {} download returned no content", certificate_id),
            }),
        }
    }
}
