use std::time::Duration;

use anyhow::anyhow;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, HttpRequest, HttpResponse,
    RedirectUrl, Scope, TokenUrl, basic::BasicClient, http,
};

use crate::{Error, Token};

/// An authorization URL plus the state the redirect has to echo back.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

/// Owns the authorization-code flow against Reddit. Only one attempt is
/// tracked at a time; beginning a new one replaces the previous state.
/// The token lives for the lifetime of the process, nothing is persisted.
pub struct AuthSession {
    oauth_client: BasicClient,
    api_client: reqwest::Client,
    scope: String,
    user_agent: String,
    state: Option<CsrfToken>,
    token: Option<Token>,
}

impl AuthSession {
    pub fn new(
        host: &str,
        client_id: String,
        client_secret: Option<String>,
        redirect_uri: &str,
        scope: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let authorization_url =
            AuthUrl::new(format!("{host}/api/v1/authorize")).map_err(|e| anyhow!("{e}"))?;
        let token_url =
            TokenUrl::new(format!("{host}/api/v1/access_token")).map_err(|e| anyhow!("{e}"))?;
        let redirect_url =
            RedirectUrl::new(redirect_uri.to_string()).map_err(|e| anyhow!("{e}"))?;

        let oauth_client = BasicClient::new(
            ClientId::new(client_id),
            client_secret.map(ClientSecret::new),
            authorization_url,
            Some(token_url),
        )
        .set_redirect_uri(redirect_url);

        // every request this session sends carries the configured timeout;
        // redirects are never followed, a redirect status is a rejection
        let api_client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            oauth_client,
            api_client,
            scope: scope.to_string(),
            user_agent: user_agent.to_string(),
            state: None,
            token: None,
        })
    }

    /// Builds the authorization URL with a fresh random state. Replaces any
    /// state from a previous attempt.
    pub fn begin_authorization(&mut self) -> AuthorizationRequest {
        let (authorize_url, csrf_state) = self
            .oauth_client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(self.scope.clone()))
            .add_extra_param("duration", "permanent")
            .url();

        let request = AuthorizationRequest {
            url: authorize_url.to_string(),
            state: csrf_state.secret().clone(),
        };
        self.state = Some(csrf_state);

        request
    }

    /// Issues a GET against the authorize URL so a broken client id or
    /// redirect URI surfaces before the user is sent to the browser.
    pub async fn probe_authorization(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<(), Error> {
        let response = self
            .api_client
            .get(&request.url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() >= 300 {
            return Err(Error::Rejected {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        Ok(())
    }

    /// Validates the redirect against the in-flight attempt and exchanges the
    /// code for a token. The state is consumed on success.
    pub async fn complete_authorization(
        &mut self,
        returned_state: &str,
        code: &str,
    ) -> Result<Token, Error> {
        let expected = self.state.as_ref().ok_or(Error::AuthMismatch)?;
        if expected.secret() != returned_state {
            return Err(Error::AuthMismatch);
        }

        let token = self
            .oauth_client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(|req| self.send_exchange_request(req))
            .await
            .map_err(|e| Error::AuthExchangeFailed(e.to_string()))?;

        let token_str =
            serde_json::to_string(&token).map_err(|e| Error::AuthExchangeFailed(e.to_string()))?;
        let token: Token =
            serde_json::from_str(&token_str).map_err(|e| Error::AuthExchangeFailed(e.to_string()))?;

        debug!("code exchange succeeded, token type {}", token.token_type);

        self.state = None;
        self.token = Some(token.clone());

        Ok(token)
    }

    pub fn access_token(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.access_token.as_str())
    }

    /// Transport for the code exchange, over the same timed client the probe
    /// uses. oauth2 speaks its own request/response types, so the method,
    /// headers and status are converted on the way through.
    async fn send_exchange_request(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| Error::Other(anyhow!("{e}")))?;

        let mut builder = self
            .api_client
            .request(method, request.url.as_str())
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .body(request.body);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_bytes());
        }

        let response = builder.send().await?;

        let status_code = http::StatusCode::from_u16(response.status().as_u16())
            .map_err(|e| Error::Other(anyhow!("{e}")))?;
        let mut headers = http::HeaderMap::new();
        for (name, value) in response.headers() {
            if let (Ok(name), Ok(value)) = (
                http::header::HeaderName::from_bytes(name.as_str().as_bytes()),
                http::header::HeaderValue::from_bytes(value.as_bytes()),
            ) {
                headers.append(name, value);
            }
        }
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse {
            status_code,
            headers,
            body,
        })
    }
}
