// Public API - only expose the handler module
pub mod handler;

// Internal modules - one per pipeline stage
mod config;
mod db;
mod error;
mod event;
mod formats;
mod io;
