#[macro_use]
extern crate log;

pub mod auth;
pub use auth::{AuthSession, AuthorizationRequest};

pub mod client;
pub use client::{Post, RedditClient};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Connection level failure, including timeouts. Recoverable by the next
    /// scheduled cycle.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The endpoint answered with a non-success status. The body is not
    /// inspected in this case.
    #[error("request rejected with status {status} ({reason})")]
    Rejected { status: u16, reason: String },
    #[error("empty response body")]
    EmptyResponse,
    #[error("malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
    /// The state returned on the redirect does not belong to the in-flight
    /// authorization attempt.
    #[error("authorization state mismatch")]
    AuthMismatch,
    #[error("code exchange failed: {0}")]
    AuthExchangeFailed(String),
    #[error("other error: {0}")]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Token {
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}
