pub mod config;
pub mod errors;
pub mod fixed;
pub mod manager;
pub mod moving;
pub mod types;
pub mod util;
