pub mod chat;
pub mod document;
pub mod organization;
pub mod workflow;
