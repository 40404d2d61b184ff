use log::debug;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::auth::Token;
use crate::error::{JanitorError, Result};

pub(super) const PAGE_SIZE: usize = 100;

const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

pub struct GitLabClient {
    client: Client,
    api_url: Url,
    token: Option<Token>,
}

/// Error payloads GitLab returns on non-2xx responses.
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<serde_json::Value>,
    error: Option<String>,
    error_description: Option<String>,
}

impl GitLabClient {
    /// Creates a REST v4 client for the GitLab instance at `base_url`.
    ///
    /// A bare host such as `gitlab.com` is treated as `https://gitlab.com`.
    pub fn new(base_url: &str, token: Option<Token>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("pipeline-janitor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| JanitorError::Config(format!("Failed to create HTTP client: {e}")))?;

        let mut base = if base_url.contains("://") {
            base_url.to_string()
        } else {
            format!("https://{base_url}")
        };
        if !base.ends_with('/') {
            base.push('/');
        }

        let api_url = Url::parse(&base)
            .map_err(|e| JanitorError::Config(format!("Invalid base URL: {e}")))?
            .join("api/v4/")
            .map_err(|e| JanitorError::Config(format!("Invalid API base URL: {e}")))?;

        Ok(Self {
            client,
            api_url,
            token,
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub(super) fn auth_request(&self, request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.token {
            request.header(TOKEN_HEADER, token.as_str())
        } else {
            request
        }
    }

    /// Resolves an endpoint path (e.g., `projects/42/pipelines`) against the API root.
    pub(super) fn endpoint(&self, path: &str) -> Result<Url> {
        self.api_url
            .join(path)
            .map_err(|e| JanitorError::Config(format!("Invalid endpoint URL '{path}': {e}")))
    }

    pub(super) async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T> {
        let request = self.auth_request(self.client.get(url).query(query));
        let response = ensure_success(request.send().await?).await?;
        Ok(response.json().await?)
    }

    pub(super) async fn delete(&self, url: Url) -> Result<()> {
        let request = self.auth_request(self.client.delete(url));
        ensure_success(request.send().await?).await?;
        Ok(())
    }

    /// Fetches every page of a list endpoint.
    ///
    /// Stops only at the first empty page, so a full last page costs one extra request.
    pub(super) async fn paginated<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let mut all_items = Vec::new();
        let mut page = 1_usize;

        loop {
            let mut query = vec![("page", page.to_string()), ("per_page", PAGE_SIZE.to_string())];
            query.extend(params.iter().cloned());

            let items: Vec<T> = self.get_json(url.clone(), &query).await?;
            if items.is_empty() {
                break;
            }

            debug!("{} page {page}: {} items", url.path(), items.len());
            all_items.extend(items);
            page += 1;
        }

        Ok(all_items)
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(api_error(status.as_u16(), &body))
}

/// Builds an error from a failed response, preferring GitLab's `message`, then
/// an OAuth style `error`/`error_description` pair, then the bare status.
pub(super) fn api_error(status: u16, body: &str) -> JanitorError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message: Some(message),
            ..
        }) => match message {
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        },
        Ok(ErrorBody {
            error: Some(error),
            error_description: Some(description),
            ..
        }) => format!("[{error}] {description}"),
        _ => format!("server returned an error: {status}"),
    };

    JanitorError::Api { status, message }
}
