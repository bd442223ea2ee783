//! HTTP handlers for PrintFlow ERP

pub mod account;
pub mod asset;
pub mod auth;
pub mod bill;
pub mod customer;
pub mod health;
pub mod inventory;
pub mod invoice;
pub mod journal;
pub mod ledger;
pub mod order;
pub mod period;
pub mod production;
pub mod role;
pub mod whatsapp;

pub use account::*;
pub use asset::*;
pub use auth::*;
pub use bill::*;
pub use customer::*;
pub use health::*;
pub use inventory::*;
pub use invoice::*;
pub use journal::*;
pub use ledger::*;
pub use order::*;
pub use period::*;
pub use production::*;
pub use role::*;
pub use whatsapp::*;
