//! Veneer: surface controllers for content-managed sites.
//!
//! A surface controller renders the template named by the current route and,
//! when a request fails, logs it, purges the output cache and substitutes an
//! error view unless the host runs in debug mode.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
