pub mod api;
pub mod repositories;
