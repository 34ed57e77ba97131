//! Chalkboard Core - Shared types library.
//!
//! This crate provides common types used across all Chalkboard components:
//! - `web` - The marketplace server (student and educator surfaces)
//! - `cli` - Command-line tools for seeding and account management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no Firebase
//! access. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, roles,
//!   and course categories

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
