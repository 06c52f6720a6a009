//! Domain layer types and invariants.

pub mod adverts;
pub mod entities;
pub mod error;
pub mod moderation;
pub mod types;
