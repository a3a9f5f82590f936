//! Database layer - connection, DDL generation, and table loading

pub mod connection;
pub mod loader;
pub mod schema;

pub use connection::DbConnection;
pub use loader::replace_table;
pub use schema::TableDescriptor;
