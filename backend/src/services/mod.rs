//! Business logic services for PrintFlow ERP

pub mod account;
pub mod asset;
pub mod auth;
pub mod bill;
pub mod customer;
pub mod inventory;
pub mod invoice;
pub mod journal;
pub mod ledger;
pub mod order;
pub mod period;
pub mod production;
pub mod role;
pub mod whatsapp;

pub use account::AccountService;
pub use asset::AssetService;
pub use auth::AuthService;
pub use bill::BillService;
pub use customer::CustomerService;
pub use inventory::InventoryService;
pub use invoice::InvoiceService;
pub use journal::JournalService;
pub use ledger::LedgerService;
pub use order::OrderService;
pub use period::PeriodService;
pub use production::ProductionService;
pub use role::RoleService;
pub use whatsapp::WhatsAppService;
