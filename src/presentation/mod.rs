pub mod error_views;
pub mod views;
