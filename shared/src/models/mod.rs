//! Domain models for PrintFlow ERP

mod customer;
mod finance;
mod inventory;
mod order;
mod production;
mod user;
mod whatsapp;

pub use customer::*;
pub use finance::*;
pub use inventory::*;
pub use order::*;
pub use production::*;
pub use user::*;
pub use whatsapp::*;
