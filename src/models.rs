pub mod auth;
pub mod catalog;
pub mod crm;
pub mod inventory;
pub mod orders;
