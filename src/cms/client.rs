//! CMS REST client module

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;
use url::Url;

use super::content::{popup_from_value, post_from_value, term_from_value};
use crate::core::config::AppConfig;
use crate::core::models::{Popup, Post, PostPage, PostQuery, Term};
use crate::crm::client::read_json;
use crate::errors::RelayError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const TERMS_PER_PAGE: u32 = 100;
pub const MAX_POSTS_PER_PAGE: u32 = 50;

/// Taxonomies the site is allowed to list through the relay.
pub const TAXONOMIES: &[&str] = &["categories", "tags", "zones", "property_types", "amenities"];

#[async_trait]
pub trait CmsApi: Send + Sync {
    async fn get_popup(&self, id: u64) -> Result<Popup, RelayError>;

    async fn list_posts(&self, query: &PostQuery) -> Result<PostPage, RelayError>;

    async fn get_post_by_slug(&self, slug: &str, lang: Option<&str>) -> Result<Post, RelayError>;

    async fn list_zones(&self) -> Result<Vec<Term>, RelayError>;

    /// Terms of one of [`TAXONOMIES`].
    async fn list_terms(&self, taxonomy: &str) -> Result<Vec<Term>, RelayError>;
}

#[derive(Debug, Clone)]
pub struct CmsClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl CmsClient {
    /// # Errors
    ///
    /// `ConfigError` if the HTTP client cannot be built.
    pub fn new(base_url: Url, token: Option<String>) -> Result<Self, RelayError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RelayError::ConfigError(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, RelayError> {
        Self::new(config.cms_base_url.clone(), config.cms_api_token.clone())
    }

    async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<(HeaderMap, Value), RelayError> {
        let url = self.base_url.join(path)?;
        let mut request = self.http.get(url).query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let resp = request.send().await?;
        let headers = resp.headers().clone();
        let body = read_json(resp).await?;
        Ok((headers, body))
    }

    async fn get_terms(&self, path: &str) -> Result<Vec<Term>, RelayError> {
        let (_, body) = self
            .get(
                path,
                &[
                    ("per_page", TERMS_PER_PAGE.to_string()),
                    ("hide_empty", "false".to_string()),
                ],
            )
            .await?;
        Ok(collect(&body, term_from_value))
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Reshape each element of an array body, skipping (and logging) bad records.
fn collect<T>(body: &Value, reshape: impl Fn(&Value) -> Result<T, RelayError>) -> Vec<T> {
    body.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match reshape(item) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        warn!("Skipping CMS record: {}", e);
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl CmsApi for CmsClient {
    async fn get_popup(&self, id: u64) -> Result<Popup, RelayError> {
        match self.get(&format!("popups/{id}"), &[]).await {
            Ok((_, body)) => popup_from_value(&body, &self.base_url),
            Err(RelayError::Upstream { status: 404, .. }) => {
                Err(RelayError::NotFound(format!("popup {id}")))
            }
            Err(e) => Err(e),
        }
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<PostPage, RelayError> {
        let page = query.page.max(1);
        let per_page = query.per_page.clamp(1, MAX_POSTS_PER_PAGE);
        let mut params = vec![
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
            ("_embed", "1".to_string()),
        ];
        if let Some(category) = query.category {
            params.push(("categories", category.to_string()));
        }
        if let Some(lang) = &query.lang {
            params.push(("lang", lang.clone()));
        }

        let (headers, body) = match self.get("posts", &params).await {
            // Asking past the last page is an empty page, not an error.
            Err(RelayError::Upstream { status: 400, message }) if message.contains("page") => {
                return Ok(PostPage {
                    total: 0,
                    total_pages: 0,
                    page,
                    posts: Vec::new(),
                });
            }
            other => other?,
        };
        let posts = collect(&body, post_from_value);
        let total = header_u64(&headers, "x-wp-total").unwrap_or(posts.len() as u64);
        let total_pages = header_u64(&headers, "x-wp-totalpages")
            .unwrap_or_else(|| total.div_ceil(u64::from(per_page)));

        Ok(PostPage {
            total,
            total_pages,
            page,
            posts,
        })
    }

    async fn get_post_by_slug(&self, slug: &str, lang: Option<&str>) -> Result<Post, RelayError> {
        let mut params = vec![("slug", slug.to_string()), ("_embed", "1".to_string())];
        if let Some(lang) = lang {
            params.push(("lang", lang.to_string()));
        }
        let (_, body) = self.get("posts", &params).await?;
        let record = body
            .as_array()
            .and_then(|items| items.first())
            .ok_or_else(|| RelayError::NotFound(format!("post '{slug}'")))?;
        post_from_value(record)
    }

    async fn list_zones(&self) -> Result<Vec<Term>, RelayError> {
        self.get_terms("zones").await
    }

    async fn list_terms(&self, taxonomy: &str) -> Result<Vec<Term>, RelayError> {
        if !TAXONOMIES.contains(&taxonomy) {
            return Err(RelayError::NotFound(format!("taxonomy '{taxonomy}'")));
        }
        self.get_terms(taxonomy).await
    }
}
