// sra-core/src/clients/http.rs
//! Shared HTTP plumbing for the live adapters.

use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::errors::ServiceError;

pub(crate) const USER_AGENT: &str = concat!("sra/", env!("CARGO_PKG_VERSION"));

/// Builds the client every live adapter shares.
pub fn build_http_client() -> Result<reqwest::Client, ServiceError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ServiceError::Transport(e.to_string()))
}

pub(crate) fn transport(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::DeadlineExceeded
    } else if err.is_decode() {
        ServiceError::Decode(err.to_string())
    } else {
        ServiceError::Transport(err.to_string())
    }
}

#[derive(Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
}

/// Turns a non-success response into a classified error.
pub(crate) async fn check(resp: Response) -> Result<Response, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<GoogleErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or(body);
    Err(ServiceError::from_status(status.as_u16(), message))
}

pub(crate) async fn json<T: DeserializeOwned>(resp: Response) -> Result<T, ServiceError> {
    let resp = check(resp).await?;
    resp.json::<T>().await.map_err(|e| ServiceError::Decode(e.to_string()))
}
