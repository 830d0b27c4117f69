//! Application layer: the surface controller and HTTP-facing errors.

pub mod error;
pub mod surface;
