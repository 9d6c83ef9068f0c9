//! REST-backed [`EntityStore`](crate::store::EntityStore).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};

use crate::error::StoreError;
use crate::store::{EntityStore, Record, SortKey};

// ─── HttpEntityStore ──────────────────────────────────────────────────────

/// An [`EntityStore`] speaking the backend's REST entity API:
///
/// ```text
/// GET    {base}/entities/{Entity}?sort=-order_position
/// GET    {base}/entities/{Entity}?q={"column":"today"}
/// POST   {base}/entities/{Entity}
/// PUT    {base}/entities/{Entity}/{id}
/// DELETE {base}/entities/{Entity}/{id}
/// ```
#[derive(Debug, Clone)]
pub struct HttpEntityStore {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpEntityStore {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, StoreError> {
        Self::with_timeout(base_url, token, None)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, StoreError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn collection_url(&self, entity: &str) -> String {
        format!("{}/entities/{entity}", self.base_url)
    }

    fn record_url(&self, entity: &str, id: &str) -> String {
        format!("{}/entities/{entity}/{id}", self.base_url)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder, entity: &str, id: &str) -> Result<Response, StoreError> {
        let resp = self.authorize(req).send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                entity: entity.to_string(),
                id: id.to_string(),
            });
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl EntityStore for HttpEntityStore {
    async fn list(&self, entity: &str, sort: Option<&SortKey>) -> Result<Vec<Record>, StoreError> {
        let mut req = self.client.get(self.collection_url(entity));
        if let Some(sort) = sort {
            req = req.query(&[("sort", sort.to_string())]);
        }
        let resp = self.send(req, entity, "*").await?;
        Ok(resp.json().await?)
    }

    async fn filter(&self, entity: &str, criteria: &Record) -> Result<Vec<Record>, StoreError> {
        let q = serde_json::to_string(criteria).map_err(|e| StoreError::Decode(e.to_string()))?;
        let req = self.client.get(self.collection_url(entity)).query(&[("q", q)]);
        let resp = self.send(req, entity, "*").await?;
        Ok(resp.json().await?)
    }

    async fn create(&self, entity: &str, fields: Record) -> Result<Record, StoreError> {
        let req = self.client.post(self.collection_url(entity)).json(&fields);
        let resp = self.send(req, entity, "(new)").await?;
        Ok(resp.json().await?)
    }

    async fn update(&self, entity: &str, id: &str, patch: Record) -> Result<Record, StoreError> {
        let req = self.client.put(self.record_url(entity, id)).json(&patch);
        let resp = self.send(req, entity, id).await?;
        Ok(resp.json().await?)
    }

    async fn delete(&self, entity: &str, id: &str) -> Result<(), StoreError> {
        let req = self.client.delete(self.record_url(entity, id));
        self.send(req, entity, id).await?;
        Ok(())
    }
}
