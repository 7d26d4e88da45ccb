pub mod cli;
pub mod core;
pub mod error;
pub mod providers;
pub mod server;

pub use error::WingmanError;
