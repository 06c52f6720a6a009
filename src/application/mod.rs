//! Application services layer.

pub mod drafts;
pub mod error;
pub mod events;
pub mod jobs;
pub mod merge;
pub mod moderation;
pub mod repos;
