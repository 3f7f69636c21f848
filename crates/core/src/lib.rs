//! `storekeep-core` — identifiers and the error model shared by every crate.
//!
//! This crate contains no I/O and no auth policy.

pub mod error;
pub mod id;

pub use error::DomainError;
pub use id::{RoleId, UserId};
