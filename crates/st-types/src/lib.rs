pub mod config;
pub mod data;
pub mod errors;
pub mod models;

pub use config::*;
pub use data::*;
pub use errors::*;
pub use models::*;
