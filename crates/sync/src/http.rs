use crate::api::UserApi;
use crate::config::RosterConfig;
use crate::error::{ApiError, ApiResult, Result, SyncError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response};
use roster_model::{User, UserId};

/// [`UserApi`] over HTTP: `GET {base}/users`, `DELETE {base}/users/{id}`.
#[derive(Debug, Clone)]
pub struct HttpUserApi {
    client: Client,
    base_url: String,
}

impl HttpUserApi {
    pub fn new(config: &RosterConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .default_headers(default_headers())
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| SyncError::config(format!("cannot build HTTP client: {err}")))?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn users_url(&self) -> String {
        format!("{}/users", self.base_url)
    }

    fn user_url(&self, id: UserId) -> String {
        format!("{}/users/{id}", self.base_url)
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        HeaderName::from_static("x-requested-with"),
        HeaderValue::from_static("XMLHttpRequest"),
    );
    headers
}

fn check_status(response: Response, what: &str) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    log::error!("Error {what}: HTTP {status}");
    Err(ApiError::Status {
        status: status.as_u16(),
    })
}

fn transport_error(what: &str, err: &reqwest::Error) -> ApiError {
    log::error!("Error {what}: {err}");
    ApiError::Transport(err.to_string())
}

#[async_trait]
impl UserApi for HttpUserApi {
    async fn fetch_users(&self) -> ApiResult<Vec<User>> {
        let url = self.users_url();
        log::debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| transport_error("fetching users", &err))?;
        let response = check_status(response, "fetching users")?;
        response.json::<Vec<User>>().await.map_err(|err| {
            log::error!("Error decoding users from {url}: {err}");
            ApiError::Decode(err.to_string())
        })
    }

    async fn delete_user(&self, id: UserId) -> ApiResult<()> {
        let url = self.user_url(id);
        log::debug!("DELETE {url}");
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|err| transport_error("deleting user", &err))?;
        check_status(response, "deleting user")?;
        Ok(())
    }
}
