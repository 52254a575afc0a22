use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument};
use xjob_core::{CallbackSink, CoreError};
use xjob_model::{ACCESS_TOKEN_HEADER, AdminReply, HandleCallback, RegistryParam};

use crate::{config::DiscoverConfig, errors::DiscoverError};

/// HTTP client for the scheduling center's `/api/*` endpoints.
///
/// Every call carries the access token header and is bounded by the
/// configured timeout.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl AdminClient {
    pub fn new(cfg: &DiscoverConfig) -> Result<Self, DiscoverError> {
        let http = reqwest::Client::builder().timeout(cfg.timeout).build()?;
        Ok(Self {
            http,
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            token: cfg.access_token.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[instrument(level = "debug", skip(self), fields(key = %param.registry_key))]
    pub async fn registry(&self, param: &RegistryParam) -> Result<(), DiscoverError> {
        self.post("api/registry", param).await
    }

    #[instrument(level = "debug", skip(self), fields(key = %param.registry_key))]
    pub async fn registry_remove(&self, param: &RegistryParam) -> Result<(), DiscoverError> {
        self.post("api/registryRemove", param).await
    }

    #[instrument(level = "debug", skip_all, fields(items = items.len()))]
    pub async fn callback(&self, items: &[HandleCallback]) -> Result<(), DiscoverError> {
        self.post("api/callback", items).await
    }

    async fn post<B>(&self, path: &str, body: &B) -> Result<(), DiscoverError>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}/{}", self.endpoint, path);
        let response = self
            .http
            .post(&url)
            .header(ACCESS_TOKEN_HEADER, &self.token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(DiscoverError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        debug!(%url, "scheduling center replied");
        validate_response(&text)
    }
}

fn validate_response(body: &str) -> Result<(), DiscoverError> {
    if body.trim().is_empty() {
        return Ok(());
    }
    let reply: AdminReply = serde_json::from_str(body).map_err(|e| {
        DiscoverError::InvalidResponse(format!("failed to parse response: {e}, body: {body}"))
    })?;
    if !reply.is_success() {
        return Err(DiscoverError::Rejected(reply.message()));
    }
    Ok(())
}

#[async_trait]
impl CallbackSink for AdminClient {
    async fn deliver(&self, items: Vec<HandleCallback>) -> Result<(), CoreError> {
        self.callback(&items).await.map_err(CoreError::from)
    }
}
