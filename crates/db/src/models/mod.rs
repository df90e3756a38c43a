//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create/upsert DTO for writes

pub mod agreement_score;
pub mod annotation_version;
pub mod annotator;
pub mod audit;
pub mod project;
pub mod reannotation;
