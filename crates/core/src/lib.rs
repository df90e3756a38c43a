//! Pure domain logic for the concord annotation platform.
//!
//! No I/O lives here: the agreement calculator, the annotation task
//! taxonomy, version-resolution and diff rules, the reannotation round
//! state machine, and eligibility predicates are all plain functions
//! shared by the persistence and HTTP layers.

pub mod agreement;
pub mod annotation;
pub mod eligibility;
pub mod error;
pub mod roles;
pub mod round;
pub mod task;
pub mod types;
