pub mod auth;
pub mod catalog_service;
pub mod crm_service;
pub mod inventory_service;
pub mod order_number;
pub mod order_service;
pub mod pricing;
