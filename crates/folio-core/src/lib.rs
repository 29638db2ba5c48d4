//! # Folio Core
//!
//! The domain layer of Folio: entities, authorization rules, pagination,
//! ports and the services built on them.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod pagination;
pub mod policy;
pub mod ports;
pub mod services;

pub use error::DomainError;
