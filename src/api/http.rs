use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::timeout;

use crate::config::ApiConfig;
use crate::model::{
    ActivityPredicate, FollowPredicate, Photo, PhotoUpload, Profile, ProfileUpdate, UserActivity,
};

use super::error::ApiError;
use super::ProfilesApi;

/// Multipart field name the upload endpoint reads the file from.
const UPLOAD_FIELD: &str = "File";

/// [`ProfilesApi`] over HTTP/JSON.
pub struct HttpProfilesApi {
    client: Client,
    base_url: Url,
    token: Option<String>,
    request_timeout: Duration,
}

impl HttpProfilesApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ApiError::InvalidRequest(format!("Invalid base URL '{}': {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidRequest(format!(
                "Base URL '{}' cannot carry a path",
                config.base_url
            )));
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds as u64))
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            token: None,
            request_timeout: Duration::from_secs(config.timeout_seconds as u64),
        })
    }

    /// Attach a bearer token to every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join percent-encoded path segments onto the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ApiError::InvalidRequest(format!("Base URL '{}' cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        let builder = self.client.request(method, url.clone());
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Bound a whole exchange, body included, by the request timeout.
    async fn within<T>(
        &self,
        exchange: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<T, ApiError> {
        match timeout(self.request_timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout {
                duration: self.request_timeout.as_secs(),
            }),
        }
    }

    async fn execute(&self, builder: RequestBuilder, url: &Url) -> Result<Response, ApiError> {
        tracing::debug!(url = %url, "Sending profiles API request");

        let response = builder.send().await.map_err(|e| ApiError::Connection {
            url: url.to_string(),
            source: e,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("Unknown error").to_string()
        } else {
            body.trim().to_string()
        };

        tracing::debug!(url = %url, status = status.as_u16(), "Profiles API returned error status");
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        url: &Url,
    ) -> Result<T, ApiError> {
        let response = self.execute(builder, url).await?;
        response.json::<T>().await.map_err(|e| ApiError::Decode {
            url: url.to_string(),
            source: e,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        self.within(self.decode(self.request(Method::GET, &url), &url))
            .await
    }

    async fn send(&self, method: Method, url: Url) -> Result<(), ApiError> {
        self.within(self.execute(self.request(method, &url), &url))
            .await?;
        Ok(())
    }

    async fn send_json<B: Serialize + Sync>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> Result<(), ApiError> {
        self.within(self.execute(self.request(method, &url).json(body), &url))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProfilesApi for HttpProfilesApi {
    async fn get(&self, username: &str) -> Result<Profile, ApiError> {
        self.fetch(self.endpoint(&["profiles", username])?).await
    }

    async fn upload_photo(&self, upload: PhotoUpload) -> Result<Photo, ApiError> {
        let url = self.endpoint(&["photos"])?;
        let part = Part::bytes(upload.bytes).file_name(upload.file_name);
        let form = Form::new().part(UPLOAD_FIELD, part);

        self.within(self.decode(self.request(Method::POST, &url).multipart(form), &url))
            .await
    }

    async fn set_main_photo(&self, photo_id: &str) -> Result<(), ApiError> {
        self.send(Method::POST, self.endpoint(&["photos", photo_id, "setmain"])?)
            .await
    }

    async fn delete_photo(&self, photo_id: &str) -> Result<(), ApiError> {
        self.send(Method::DELETE, self.endpoint(&["photos", photo_id])?)
            .await
    }

    async fn update(&self, profile: &Profile) -> Result<(), ApiError> {
        self.send_json(Method::PUT, self.endpoint(&["profiles"])?, profile)
            .await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError> {
        self.send_json(Method::PUT, self.endpoint(&["profiles"])?, update)
            .await
    }

    async fn follow(&self, username: &str) -> Result<(), ApiError> {
        self.send(Method::POST, self.endpoint(&["profiles", username, "follow"])?)
            .await
    }

    async fn unfollow(&self, username: &str) -> Result<(), ApiError> {
        self.send(Method::DELETE, self.endpoint(&["profiles", username, "follow"])?)
            .await
    }

    async fn list_followings(
        &self,
        username: &str,
        predicate: FollowPredicate,
    ) -> Result<Vec<Profile>, ApiError> {
        let mut url = self.endpoint(&["profiles", username, "follow"])?;
        url.query_pairs_mut()
            .append_pair("predicate", predicate.as_str());
        self.fetch(url).await
    }

    async fn list_activities(
        &self,
        username: &str,
        predicate: Option<ActivityPredicate>,
    ) -> Result<Vec<UserActivity>, ApiError> {
        let mut url = self.endpoint(&["profiles", username, "activities"])?;
        if let Some(predicate) = predicate {
            url.query_pairs_mut()
                .append_pair("predicate", predicate.as_str());
        }
        self.fetch(url).await
    }
}
