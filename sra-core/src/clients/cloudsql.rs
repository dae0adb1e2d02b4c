// sra-core/src/clients/cloudsql.rs
//! Live [`CloudSqlAdmin`] over the Cloud SQL Admin v1beta4 REST API.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use log::debug;

use crate::clients::auth::{Credentials, TokenSource};
use crate::clients::http;
use crate::errors::ServiceError;
use crate::services::{CloudSqlAdmin, DatabaseInstance, Operation};

pub const DEFAULT_SQL_ADMIN_ENDPOINT: &str = "https://sqladmin.googleapis.com";

#[derive(Debug, Clone)]
pub struct CloudSqlClient {
    http: reqwest::Client,
    tokens: Arc<TokenSource>,
    endpoint: String,
}

impl CloudSqlClient {
    pub fn new(http: reqwest::Client, tokens: Arc<TokenSource>) -> Self {
        Self { http, tokens, endpoint: DEFAULT_SQL_ADMIN_ENDPOINT.to_string() }
    }

    /// Builds a client that authenticates with the key file at `path`.
    pub fn from_credentials_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let http = http::build_http_client()?;
        let tokens = TokenSource::new(http.clone(), Credentials::from_file(path)?);
        Ok(Self::new(http, Arc::new(tokens)))
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn instance_url(&self, project: &str, instance: &str) -> String {
        format!(
            "{}/sql/v1beta4/projects/{project}/instances/{instance}",
            self.endpoint.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl CloudSqlAdmin for CloudSqlClient {
    async fn instance(&self, project: &str, instance: &str) -> Result<DatabaseInstance, ServiceError> {
        let url = self.instance_url(project, instance);
        debug!("GET {url}");
        let token = self.tokens.token().await?;
        let resp = self.http.get(&url).bearer_auth(token).send().await.map_err(http::transport)?;
        http::json(resp).await
    }

    async fn patch_instance(
        &self,
        project: &str,
        instance: &str,
        patch: &DatabaseInstance,
    ) -> Result<Operation, ServiceError> {
        let url = self.instance_url(project, instance);
        debug!("PATCH {url}");
        let token = self.tokens.token().await?;
        let resp = self
            .http
            .patch(&url)
            .bearer_auth(token)
            .json(patch)
            .send()
            .await
            .map_err(http::transport)?;
        http::json(resp).await
    }
}
