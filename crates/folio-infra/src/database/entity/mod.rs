//! SeaORM entities, one per table, with conversions to domain types.

pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;
