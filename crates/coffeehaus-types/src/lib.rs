pub mod api;
pub mod feed;
pub mod models;
pub mod search;
pub mod validate;
