use crate::client::traits::CatalogApi;
use crate::config::AppConfig;
use crate::model::{ApiError, ConfigData, ConfigVersion, LeadRequest, Machine, Spec};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) CzConfigurator/0.1";

/// Maps transport failures, keeping timeouts distinct.
pub fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::HttpError(e)
    }
}

/// Sends a request and turns non-2xx answers into `ApiError::Status`.
pub async fn send_checked(request: RequestBuilder) -> Result<Response, ApiError> {
    let response = request.send().await.map_err(transport_error)?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_else(|_| "unknown".into());
        warn!("❌ API responded [{}]: {}", status, body);
        return Err(ApiError::from_status(status.as_u16(), &body));
    }
    Ok(response)
}

pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response.text().await.map_err(transport_error)?;
    serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

pub struct ApiClient {
    pub client: Client,
    api_base: String,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base(),
        })
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.build_url(path);
        info!("GET {}", url);
        let response = send_checked(self.client.get(&url)).await?;
        read_json(response).await
    }
}

#[async_trait::async_trait]
impl CatalogApi for ApiClient {
    async fn config_data(&self) -> Result<ConfigData, ApiError> {
        self.get_json("config-data").await
    }

    async fn coffee_machines(&self) -> Result<Vec<Machine>, ApiError> {
        self.get_json("coffee-machines").await
    }

    async fn specs(&self) -> Result<Vec<Spec>, ApiError> {
        self.get_json("specs").await
    }

    async fn config_version(&self) -> Result<Option<String>, ApiError> {
        let version: ConfigVersion = self.get_json("config-version").await?;
        Ok(version.token())
    }

    async fn submit_lead(&self, lead: &LeadRequest) -> Result<(), ApiError> {
        let url = self.build_url("lead");
        info!("📤 Sending lead for {}", lead.phone);
        send_checked(self.client.post(&url).json(lead)).await?;
        info!("✅ Lead accepted");
        Ok(())
    }
}
