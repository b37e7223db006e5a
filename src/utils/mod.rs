pub mod json;
pub mod links;
pub mod mime;
pub mod slug;
pub mod text;
