//! Stateless repository structs, one per table family.

pub mod agreement_score_repo;
pub mod annotation_version_repo;
pub mod annotator_repo;
pub mod audit_repo;
pub mod project_repo;
pub mod reannotation_repo;

pub use agreement_score_repo::AgreementScoreRepo;
pub use annotation_version_repo::AnnotationVersionRepo;
pub use annotator_repo::AnnotatorRepo;
pub use audit_repo::AuditLogRepo;
pub use project_repo::ProjectRepo;
pub use reannotation_repo::ReannotationRepo;
