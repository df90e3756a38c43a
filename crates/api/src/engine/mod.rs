//! The agreement analysis engine: target discovery and batch computation.

pub mod batch;
pub mod scanner;
