//! CRM integration: listings, clients, labels and origins.

pub mod client;

pub use client::{CrmApi, CrmClient};
