//! Shared domain types for PrintFlow ERP
//!
//! This crate contains the domain models, the production-workflow state
//! machine, and the validation rules shared by the backend services and
//! their tests.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
