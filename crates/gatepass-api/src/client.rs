// Visitor pass REST client
//
// Wraps `reqwest::Client` with bearer auth, URL construction, and status /
// error-body handling. Endpoint methods live in `passes.rs` as inherent
// methods to keep this module focused on transport mechanics.

use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::bearer_headers;
use crate::error::Error;
use crate::models::ErrorBody;
use crate::transport::TransportConfig;

/// Maximum number of body bytes quoted back in error messages.
const BODY_PREVIEW: usize = 200;

/// Raw HTTP client for the backend's visitor pass API.
///
/// All endpoints hang off `{base_url}/api/...`. Responses are decoded into
/// the wire types in [`models`](crate::models); non-2xx statuses become
/// typed [`Error`]s carrying the backend's message when it sent one.
#[derive(Clone)]
pub struct PassClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PassClient {
    /// Create a client that authenticates every request with `token`.
    ///
    /// `base_url` is the backend root (e.g. `https://api.example.org`);
    /// a path prefix such as `https://host/community` is preserved.
    pub fn new(
        base_url: Url,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let headers = bearer_headers(token)?;
        let http = transport.build_client_with_headers(headers)?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// The caller is responsible for any auth headers.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/{segments...}`, percent-encoding every segment.
    pub(crate) fn api_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;

        self.parse_response(resp).await
    }

    /// Send a POST request with a JSON body and decode the JSON response.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        self.parse_response(resp).await
    }

    /// Map the HTTP status to an error, or decode the body as `T`.
    async fn parse_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        trace!(%status, "response received");

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = backend_message(&body);

            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(Error::Authentication {
                    message: message.unwrap_or_else(|| "token expired or invalid".into()),
                });
            }

            if status == reqwest::StatusCode::FORBIDDEN {
                return Err(Error::Forbidden {
                    message: message.unwrap_or_else(|| "insufficient permissions".into()),
                });
            }

            return Err(Error::Api {
                status: status.as_u16(),
                message: message.unwrap_or_else(|| preview(&body).to_owned()),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })
    }
}

/// Pull `message` / `error` out of a JSON error body, if there is one.
fn backend_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
}

/// First `BODY_PREVIEW` bytes of `body`, cut on a char boundary.
fn preview(body: &str) -> &str {
    if body.len() <= BODY_PREVIEW {
        return body;
    }
    let mut end = BODY_PREVIEW;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
