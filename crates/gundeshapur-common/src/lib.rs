//! Common types for the Gundeshapur library
//!
//! This crate provides the pieces shared by the data-access layer and its front ends:
//! the error taxonomy, the persisted configuration value and signed-in identity routing.

pub mod config;
pub mod error;
pub mod identity;

pub use config::LibraryConfig;
pub use error::{ErrorCategory, LibraryError, Result};
pub use identity::{route, AppView, Role, SignInMode, UserProfile};
