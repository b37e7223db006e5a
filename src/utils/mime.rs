//! MIME utilities shared across modules

use crate::core::models::{Asset, AssetKind};

/// Guess the MIME type of an asset URL from its path extension.
#[must_use]
pub fn mime_for_url(url: &str) -> String {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url);
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}

#[must_use]
pub fn kind_for_mime(mime: &str) -> AssetKind {
    match mime {
        "text/css" => AssetKind::Style,
        "application/javascript" | "text/javascript" => AssetKind::Script,
        m if m.starts_with("font/") || m.contains("font") => AssetKind::Font,
        m if m.starts_with("image/") => AssetKind::Image,
        _ => AssetKind::Other,
    }
}

#[must_use]
pub fn classify_asset(url: String) -> Asset {
    let mime = mime_for_url(&url);
    Asset {
        kind: kind_for_mime(&mime),
        mime,
        url,
    }
}
