//! CMS integration: popups, blog posts, zones and taxonomies.

pub mod client;
pub mod content;

pub use client::{CmsApi, CmsClient};
