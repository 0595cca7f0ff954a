//! HTTP client for the textbook backend

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::types::{
    Category, CategoryForm, IncreaseProgress, Profile, ProgressStatus, RateRequest, RoleCheck,
    StartProgress, Textbook, Topic, UserRating,
};
use crate::error::{ReaderError, Result};
use crate::session::Session;

/// User agent string for API requests
const USER_AGENT_VALUE: &str = concat!("textbook-reader/", env!("CARGO_PKG_VERSION"));

/// How the token is presented in the Authorization header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthScheme {
    /// `/user/*` routes take the bare token
    Raw,
    /// `/admin/*` routes take `Bearer <token>`
    Bearer,
}

/// Backend API client
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client for `base_url` carrying the session's token
    pub fn new(base_url: &str, session: &Session) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ReaderError::Message(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: session.token().map(str::to_string),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    /// Absolute URL of an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Absolute URL of an uploaded asset (category image, book avatar)
    pub fn asset_url(&self, path: &str) -> String {
        self.url(path)
    }

    fn authorization(&self, scheme: AuthScheme) -> Result<String> {
        let token = self.token.as_deref().ok_or(ReaderError::NotSignedIn)?;
        Ok(match scheme {
            AuthScheme::Raw => token.to_string(),
            AuthScheme::Bearer => format!("Bearer {token}"),
        })
    }

    fn authed(&self, request: RequestBuilder, scheme: AuthScheme) -> Result<RequestBuilder> {
        Ok(request.header(AUTHORIZATION, self.authorization(scheme)?))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReaderError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        let url = self.url("textbooks/categories");
        tracing::debug!(%url, "fetching categories");
        self.fetch(self.http.get(url)).await
    }

    pub async fn textbooks(&self) -> Result<Vec<Textbook>> {
        let url = self.url("textbooks/books");
        tracing::debug!(%url, "fetching textbooks");
        self.fetch(self.http.get(url)).await
    }

    pub async fn textbook(&self, textbook_id: &str) -> Result<Textbook> {
        let url = self.url(&format!("textbooks/books/{textbook_id}"));
        tracing::debug!(%url, "fetching textbook");
        self.fetch(self.http.get(url)).await
    }

    pub async fn topic(&self, textbook_id: &str, index: usize) -> Result<Topic> {
        let url = self.url(&format!("textbooks/books/{textbook_id}/topics/{index}"));
        tracing::debug!(%url, "fetching topic");
        self.fetch(self.http.get(url)).await
    }

    pub async fn profile(&self) -> Result<Profile> {
        let request = self.authed(self.http.get(self.url("user/profile")), AuthScheme::Raw)?;
        self.fetch(request).await
    }

    /// Whether the user has started the textbook
    pub async fn progress_exists(&self, user_id: &str, textbook_id: &str) -> Result<bool> {
        let url = self.url(&format!("user/progress/{user_id}/{textbook_id}"));
        let request = self.authed(self.http.get(url), AuthScheme::Raw)?;
        let status: ProgressStatus = self.fetch(request).await?;
        Ok(status.exists)
    }

    /// Create (or touch) the progress record for a textbook
    pub async fn start_progress(&self, user_id: &str, textbook_id: &str) -> Result<()> {
        let body = StartProgress {
            user: user_id,
            textbook: textbook_id,
        };
        let request = self.authed(
            self.http.post(self.url("user/progress")).json(&body),
            AuthScheme::Raw,
        )?;
        self.send(request).await?;
        Ok(())
    }

    /// Record a topic as read
    pub async fn increase_progress(
        &self,
        user_id: &str,
        textbook_id: &str,
        topic_id: Option<&str>,
    ) -> Result<()> {
        let url = self.url(&format!("user/increaseProgress/{user_id}/{textbook_id}"));
        let body = IncreaseProgress {
            user_id,
            textbook_id,
            topic_id,
        };
        let request = self.authed(self.http.post(url).json(&body), AuthScheme::Raw)?;
        self.send(request).await?;
        Ok(())
    }

    pub async fn user_rating(&self, textbook_id: &str) -> Result<Option<u8>> {
        let url = self.url(&format!("user/userRating/{textbook_id}"));
        let request = self.authed(self.http.get(url), AuthScheme::Raw)?;
        let rating: UserRating = self.fetch(request).await?;
        Ok(rating.user_rating)
    }

    pub async fn rate(&self, textbook_id: &str, rating: u8) -> Result<()> {
        if !(1..=5).contains(&rating) {
            return Err(ReaderError::InvalidRating(rating));
        }
        let body = RateRequest {
            textbook_id,
            rating,
        };
        let request = self.authed(
            self.http.post(self.url("user/rate")).json(&body),
            AuthScheme::Raw,
        )?;
        self.send(request).await?;
        Ok(())
    }

    pub async fn is_admin(&self) -> Result<bool> {
        let request = self.authed(self.http.get(self.url("admin/check-role")), AuthScheme::Bearer)?;
        let role: RoleCheck = self.fetch(request).await?;
        Ok(role.is_admin)
    }

    pub async fn admin_categories(&self) -> Result<Vec<Category>> {
        let request = self.authed(self.http.get(self.url("admin/categories")), AuthScheme::Bearer)?;
        self.fetch(request).await
    }

    pub async fn create_category(&self, form: &CategoryForm) -> Result<()> {
        let body = category_form(form).await?;
        let request = self.authed(
            self.http.post(self.url("admin/categories")).multipart(body),
            AuthScheme::Bearer,
        )?;
        self.send(request).await?;
        Ok(())
    }

    pub async fn update_category(&self, category_id: &str, form: &CategoryForm) -> Result<()> {
        let body = category_form(form).await?;
        let url = self.url(&format!("admin/categories/{category_id}"));
        let request = self.authed(self.http.put(url).multipart(body), AuthScheme::Bearer)?;
        self.send(request).await?;
        Ok(())
    }

    pub async fn delete_category(&self, category_id: &str) -> Result<()> {
        let url = self.url(&format!("admin/categories/{category_id}"));
        let request = self.authed(self.http.delete(url), AuthScheme::Bearer)?;
        self.send(request).await?;
        Ok(())
    }
}

/// Multipart body with name, description and an optional image file
async fn category_form(form: &CategoryForm) -> Result<Form> {
    let mut body = Form::new()
        .text("name", form.name.clone())
        .text("description", form.description.clone());

    if let Some(path) = &form.image {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        body = body.part("image", Part::bytes(bytes).file_name(file_name));
    }

    Ok(body)
}
