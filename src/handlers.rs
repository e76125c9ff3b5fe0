pub mod crm;
pub mod inventory;
pub mod orders;
