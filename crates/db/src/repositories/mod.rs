//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` (reads) or `&mut PgConnection` (writes that must join
//! an engine transaction) as the first argument.

pub mod chat_repo;
pub mod document_repo;
pub mod flow_repo;
pub mod log_repo;
pub mod membership_repo;
pub mod template_repo;

pub use chat_repo::ChatRepo;
pub use document_repo::DocumentRepo;
pub use flow_repo::FlowRepo;
pub use log_repo::LogRepo;
pub use membership_repo::MembershipRepo;
pub use template_repo::TemplateRepo;
