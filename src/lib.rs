//! Exportador de compras (buys) de tokens Solana
//!
//! Pagina a API GraphQL da Bitquery do mais recente para o mais antigo,
//! grava os trades em chunks CSV de tamanho fixo e no final junta tudo
//! num arquivo mestre.

pub mod config;
pub mod credentials;
pub mod csv_buffer;
pub mod csv_writer;
pub mod cursor;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod logging;
pub mod merge;
pub mod orchestrator;
pub mod types;
