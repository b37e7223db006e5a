//! Property search: filter parsing and listing normalization.

pub mod filters;
pub mod normalize;

pub use filters::{Operation, SearchFilters, SortOrder};
pub use normalize::{normalize_page, normalize_property};
