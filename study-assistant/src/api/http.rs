// reqwest-based client for the study API.
//
// Every request goes through `send_text`, which turns non-2xx responses into
// `ApiError::Status` carrying the response body so the UI can show it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Url};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{
    parse_evaluation, parse_question, parse_token, ApiError, AuthClient, Credentials, Evaluation,
    FriendScore, FriendsClient, QuestionClient, SignupRequest,
};
use crate::session::SessionStore;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    pwd: &'a str,
}

#[derive(Serialize)]
struct SignupBody<'a> {
    username: &'a str,
    pwd: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    grade: Option<u8>,
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    input: &'a str,
}

#[derive(Serialize)]
struct EvaluateBody<'a> {
    answer: &'a str,
    question: &'a str,
}

// ---------------------------------------------------------------------------
// HttpApi
// ---------------------------------------------------------------------------

/// Client for the remote study API.
pub struct HttpApi {
    http: reqwest::Client,
    base_url: Url,
    sessions: SessionStore,
}

impl HttpApi {
    /// Create a client for `base_url`. Every request is bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration, sessions: SessionStore) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url.trim().trim_end_matches('/'))
            .map_err(|e| ApiError::InvalidResponse(format!("invalid base URL: {e}")))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            sessions,
        })
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidResponse("base URL cannot hold a path".into()))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    /// Attach the stored bearer token, if any.
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.sessions.load().token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send_text(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!("API returned status {}: {}", status, body.trim());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }
        debug!("API returned {} ({} bytes)", status, body.len());
        Ok(body)
    }
}

#[async_trait]
impl AuthClient for HttpApi {
    async fn login(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let url = self.endpoint(&["login"])?;
        let body = self
            .send_text(self.http.post(url).json(&LoginBody {
                username: &credentials.username,
                pwd: &credentials.password,
            }))
            .await?;
        parse_token(&body)
            .ok_or_else(|| ApiError::InvalidResponse("login response has no token".into()))
    }

    async fn signup(&self, request: &SignupRequest) -> Result<String, ApiError> {
        let url = self.endpoint(&["signup"])?;
        let body = self
            .send_text(self.http.post(url).json(&SignupBody {
                username: &request.credentials.username,
                pwd: &request.credentials.password,
                grade: request.grade,
            }))
            .await?;
        match parse_token(&body) {
            Some(token) => Ok(token),
            None => {
                // The account exists now; a token comes from logging in.
                info!(
                    "Signup for {} returned no token, logging in",
                    request.credentials.username
                );
                self.login(&request.credentials).await
            }
        }
    }
}

#[async_trait]
impl QuestionClient for HttpApi {
    async fn generate_question(&self, topic: &str) -> Result<String, ApiError> {
        let url = self.endpoint(&["gen"])?;
        let body = self
            .send_text(self.http.post(url).json(&GenerateBody { input: topic }))
            .await?;
        parse_question(&body)
            .ok_or_else(|| ApiError::InvalidResponse("empty question from server".into()))
    }

    async fn evaluate(&self, question: &str, answer: &str) -> Result<Evaluation, ApiError> {
        let url = self.endpoint(&["eval"])?;
        let body = self
            .send_text(self.http.post(url).json(&EvaluateBody { answer, question }))
            .await?;
        Ok(parse_evaluation(&body))
    }
}

#[async_trait]
impl FriendsClient for HttpApi {
    async fn list_friends(&self, user: &str) -> Result<Vec<FriendScore>, ApiError> {
        let url = self.endpoint(&["getallfriends", user])?;
        let body = self.send_text(self.http.get(url)).await?;
        serde_json::from_str(body.trim())
            .map_err(|e| ApiError::InvalidResponse(format!("bad friends list: {e}")))
    }

    async fn add_friend(&self, user: &str, friend: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["addfriend"])?;
        self.send_text(
            self.http
                .post(url)
                .query(&[("user1", user), ("user2", friend)]),
        )
        .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
