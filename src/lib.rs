/// Realty - the server side of a real-estate marketing and booking website.
///
/// This crate implements a single API Lambda that sits between the browser
/// and two external systems:
/// 1. A CRM/property API that owns listings and receives leads
/// 2. A headless CMS that owns blog posts, zones, taxonomies and popups
///
/// # Architecture
///
/// The system uses:
/// - AWS Lambda behind an HTTP gateway, one invocation per request
/// - reqwest for the CRM and CMS REST APIs
/// - Thin relays that reshape upstream JSON for the site
/// - Tokio for async runtime
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use realty::api::{AppState, route};
/// use realty::core::config::AppConfig;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     realty::setup_logging();
///
///     let config = AppConfig::with_endpoints(
///         "https://crm.example.com/api/v1",
///         "https://cms.example.com/wp-json/wp/v2",
///         "https://www.example.com",
///     )?;
///     let state = AppState::from_config(config)?;
///
///     let response = route(
///         &state,
///         &serde_json::json!({
///             "rawPath": "/api/properties",
///             "rawQueryString": "operation=sale&bedrooms=3",
///             "requestContext": {"http": {"method": "GET"}}
///         }),
///     )
///     .await;
///     println!("{}", response["body"]);
///     Ok(())
/// }
/// ```
// Module declarations
pub mod api;
pub mod cms;
pub mod core;
pub mod crm;
pub mod errors;
pub mod favorites;
pub mod leads;
pub mod search;
pub mod seo;
pub mod utils;

pub use errors::RelayError;

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// This function sets up tracing-subscriber with a JSON formatter suitable for
/// `CloudWatch` Logs integration, filtered by `RUST_LOG` (default `info`).
/// Calling it again is a no-op.
///
/// # Example
///
/// ```
/// // Initialize structured logging at the start of your Lambda handler
/// realty::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let default_level = if cfg!(feature = "debug-logs") { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
