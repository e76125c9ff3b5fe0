pub mod user_repo;
pub use user_repo::UserRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod crm_repo;
pub use crm_repo::CrmRepository;
pub mod orders_repo;
pub use orders_repo::OrdersRepository;
