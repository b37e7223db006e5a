//! SEO tooling: sitemap, robots file and legacy redirects.

pub mod redirects;
pub mod sitemap;

pub use redirects::{RedirectRule, Redirects};
pub use sitemap::{SitemapEntry, build_sitemap, collect_sitemap, render_xml, robots_txt};
