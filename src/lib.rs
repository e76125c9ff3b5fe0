//! Backend do balcão da gráfica: checkout de pedidos com baixa de materiais,
//! esteira de produção e livro-razão de estoque.

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
