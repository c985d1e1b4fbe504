pub mod template;
pub mod workflow;
