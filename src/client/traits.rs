use crate::model::{ApiError, ConfigData, LeadRequest, Machine, Spec};

/// Public catalog endpoints of the backend.
#[async_trait::async_trait]
pub trait CatalogApi: Send + Sync {
    /// `GET /api/config-data`: machines and specs in one payload.
    async fn config_data(&self) -> Result<ConfigData, ApiError>;
    async fn coffee_machines(&self) -> Result<Vec<Machine>, ApiError>;
    async fn specs(&self) -> Result<Vec<Spec>, ApiError>;
    /// Current catalog version token, `None` when the server has none.
    async fn config_version(&self) -> Result<Option<String>, ApiError>;
    async fn submit_lead(&self, lead: &LeadRequest) -> Result<(), ApiError>;
}
