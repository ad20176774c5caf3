//! tenderwatch - Screens public tender listings against an institutional profile
//!
//! This crate retrieves a tender listing, ranks the entries by embedding
//! distance to a profile text, filters them with a keyword denylist and
//! mails a digest of the best matches.

pub mod config;
pub mod domain;
pub mod embedding;
pub mod providers;
pub mod services;

pub use services::{ScreeningService, ScreeningSession};
