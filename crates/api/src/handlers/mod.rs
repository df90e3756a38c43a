//! HTTP handlers, grouped by resource.

pub mod analysis;
pub mod annotation;
pub mod auth;
pub mod reannotation;
