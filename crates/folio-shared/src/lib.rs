//! # Folio Shared
//!
//! Wire types shared by the server and any client: submitted forms, the
//! contexts handed to the presentation layer, and problem-details errors.

pub mod dto;
pub mod response;

pub use response::{ErrorResponse, View};
