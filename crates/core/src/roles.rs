//! Role name constants shared by the identity tables and the API layer.

/// Administrators may run batch analysis and manage reannotation rounds.
pub const ROLE_ADMIN: &str = "admin";

/// Annotators produce judgements and work their own reannotation queue.
pub const ROLE_ANNOTATOR: &str = "annotator";
