//! API Lambda handler - thin router that delegates to specialized handlers.
//!
//! This module handles:
//! - Request extraction (method, path, query, body)
//! - Property search and lookup (delegated to `property_handler`)
//! - Lead submissions (delegated to `lead_handler`)
//! - CMS content (delegated to `content_handler`)
//! - Sitemap, robots and site config (delegated to `site_handler`)
//! - Legacy redirects for anything else

use std::sync::Arc;

use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    content_handler, helpers, lead_handler, parsing::Request, property_handler, site_handler,
};
use crate::cms::{CmsApi, CmsClient};
use crate::core::config::AppConfig;
use crate::crm::{CrmApi, CrmClient};
use crate::errors::RelayError;
use crate::seo::Redirects;

pub use self::function_handler as handler;

/// Everything a request needs: config and the upstream clients.
pub struct AppState {
    pub config: AppConfig,
    pub crm: Arc<dyn CrmApi>,
    pub cms: Arc<dyn CmsApi>,
    pub redirects: Redirects,
}

impl AppState {
    /// State backed by the real CRM and CMS clients.
    ///
    /// # Errors
    ///
    /// `ConfigError` if the redirect rules do not parse or an HTTP client
    /// cannot be built.
    pub fn from_config(config: AppConfig) -> Result<Self, RelayError> {
        let crm = Arc::new(CrmClient::from_config(&config)?);
        let cms = Arc::new(CmsClient::from_config(&config)?);
        Self::new(config, crm, cms)
    }

    /// # Errors
    ///
    /// `ConfigError` if the configured redirect rules do not parse.
    pub fn new(
        config: AppConfig,
        crm: Arc<dyn CrmApi>,
        cms: Arc<dyn CmsApi>,
    ) -> Result<Self, RelayError> {
        let redirects = Redirects::from_config(config.redirect_rules_json.as_deref())?;
        Ok(Self {
            config,
            crm,
            cms,
            redirects,
        })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("redirects", &self.redirects)
            .finish_non_exhaustive()
    }
}

/// Lambda handler for the API entrypoint.
///
/// # Errors
///
/// Only when the environment configuration is unusable; every request-level
/// failure is turned into an HTTP error response by [`route`].
#[tracing::instrument(level = "info", skip(event), fields(request_id = %Uuid::new_v4()))]
pub async fn function_handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;
    let state = AppState::from_config(config).map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;

    Ok(route(&state, &event.payload).await)
}

/// Route one gateway event. Never fails: errors become JSON error responses.
pub async fn route(state: &AppState, payload: &Value) -> Value {
    let response = match Request::from_event(payload) {
        Ok(request) => {
            info!(method = %request.method, path = %request.path, "API request");
            dispatch(state, &request).await
        }
        Err(e) => Err(e),
    };

    let response = response.unwrap_or_else(|e| {
        let status = e.status_code();
        if status >= 500 {
            error!(status, "Request failed: {}", e);
        } else {
            warn!(status, "Request rejected: {}", e);
        }
        helpers::err_response(status, &e.public_message())
    });

    helpers::with_cors(response, &state.config.cors_allow_origin)
}

async fn dispatch(state: &AppState, request: &Request) -> Result<Value, RelayError> {
    let segments: Vec<&str> = request
        .path
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match (request.method.as_str(), segments.as_slice()) {
        ("OPTIONS", _) => Ok(helpers::no_content()),

        // ====================================================================
        // Listings
        // ====================================================================
        ("GET", ["api", "properties"]) => property_handler::handle_search(state, request).await,
        ("POST", ["api", "properties"]) => property_handler::handle_lookup(state, request).await,
        ("GET", ["api", "properties", reference]) => {
            property_handler::handle_detail(state, reference, request).await
        }

        // ====================================================================
        // Leads
        // ====================================================================
        ("POST", ["api", "leads"]) => lead_handler::handle_lead(state, request).await,
        ("GET", ["api", "origins"]) => site_handler::handle_origins(state).await,

        // ====================================================================
        // CMS content
        // ====================================================================
        ("GET", ["api", "popup"]) => content_handler::handle_popup(state, None, request).await,
        ("GET", ["api", "popup", id]) => {
            content_handler::handle_popup(state, Some(*id), request).await
        }
        ("GET", ["api", "posts"]) => content_handler::handle_posts(state, request).await,
        ("GET", ["api", "posts", slug]) => {
            content_handler::handle_post(state, slug, request).await
        }
        ("GET", ["api", "zones"]) => content_handler::handle_zones(state).await,
        ("GET", ["api", "taxonomies", kind]) => content_handler::handle_terms(state, kind).await,

        // ====================================================================
        // Site / SEO
        // ====================================================================
        ("GET", ["api", "site-config"]) => Ok(site_handler::handle_site_config(state)),
        ("GET", ["api", "sitemap"]) => Ok(site_handler::handle_sitemap_json(state).await),
        ("GET", ["sitemap.xml"]) => Ok(site_handler::handle_sitemap_xml(state).await),
        ("GET", ["robots.txt"]) => Ok(site_handler::handle_robots(state)),

        (_, ["api", ..]) => Err(RelayError::NotFound(format!(
            "{} {}",
            request.method, request.path
        ))),

        ("GET" | "HEAD", _) => match state
            .redirects
            .resolve(&request.path, request.raw_query.as_deref())
        {
            Some((target, permanent)) => {
                info!(from = %request.path, to = %target, "Legacy redirect");
                Ok(helpers::redirect(&target, permanent))
            }
            None => Err(RelayError::NotFound(request.path.clone())),
        },

        _ => Err(RelayError::NotFound(request.path.clone())),
    }
}
