pub mod analytics;
pub mod auth;
pub mod config;
pub mod feedback;
pub mod gmail;
pub mod list;
pub mod stats;
pub mod sync;
