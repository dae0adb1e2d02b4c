// sra-core/src/clients/security_center.rs
//! Live [`SecurityMarksApi`] over the Security Command Center v1 REST API.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use log::debug;

use crate::clients::auth::{Credentials, TokenSource};
use crate::clients::http;
use crate::errors::ServiceError;
use crate::services::{SecurityMarks, SecurityMarksApi, UpdateSecurityMarksRequest};

pub const DEFAULT_SECURITY_CENTER_ENDPOINT: &str = "https://securitycenter.googleapis.com";

#[derive(Debug, Clone)]
pub struct SecurityCenterClient {
    http: reqwest::Client,
    tokens: Arc<TokenSource>,
    endpoint: String,
}

impl SecurityCenterClient {
    pub fn new(http: reqwest::Client, tokens: Arc<TokenSource>) -> Self {
        Self { http, tokens, endpoint: DEFAULT_SECURITY_CENTER_ENDPOINT.to_string() }
    }

    pub fn from_credentials_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let http = http::build_http_client()?;
        let tokens = TokenSource::new(http.clone(), Credentials::from_file(path)?);
        Ok(Self::new(http, Arc::new(tokens)))
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SecurityMarksApi for SecurityCenterClient {
    async fn update_security_marks(
        &self,
        request: &UpdateSecurityMarksRequest,
    ) -> Result<SecurityMarks, ServiceError> {
        let marks = &request.security_marks;
        if marks.name.is_empty() {
            return Err(ServiceError::InvalidRequest("security marks name is empty".into()));
        }
        let url = format!("{}/v1/{}", self.endpoint.trim_end_matches('/'), marks.name);
        debug!("PATCH {url}");

        let token = self.tokens.token().await?;
        let mut req = self.http.patch(&url).bearer_auth(token).json(marks);
        if !request.update_mask.is_empty() {
            req = req.query(&[("updateMask", request.update_mask.join(","))]);
        }
        let resp = req.send().await.map_err(http::transport)?;
        http::json(resp).await
    }
}
