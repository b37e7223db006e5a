use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A listing as served to the browser, reshaped from the CRM record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: u64,
    pub reference: Option<String>,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub operation: Option<String>,
    pub property_type: Option<String>,
    pub price: Option<f64>,
    pub currency: String,
    pub price_on_request: bool,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub area: Option<f64>,
    pub zone: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub images: Vec<String>,
    pub features: Vec<String>,
    pub featured: bool,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub total: u64,
    pub skip: u32,
    pub take: u32,
    pub properties: Vec<Property>,
}

/// Client record sent to the CRM when a lead is captured.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Style,
    Script,
    Font,
    Image,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    pub url: String,
    pub kind: AssetKind,
    pub mime: String,
}

/// CMS popup: rendered HTML plus the assets it needs on the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub id: u64,
    pub title: String,
    pub html: String,
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeoMeta {
    pub title: String,
    pub description: String,
    pub canonical: Option<String>,
    pub og_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: u64,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub html: String,
    pub date: Option<String>,
    pub modified: Option<String>,
    pub categories: Vec<u64>,
    pub image: Option<String>,
    pub seo: SeoMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostPage {
    pub total: u64,
    pub total_pages: u64,
    pub page: u32,
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    pub page: u32,
    pub per_page: u32,
    pub category: Option<u64>,
    pub lang: Option<String>,
}

/// Zone or taxonomy term as listed by the CMS.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Term {
    pub id: u64,
    pub slug: String,
    pub name: String,
    pub count: Option<u64>,
    pub parent: Option<u64>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub extra: Value,
}
