pub mod agents;
pub mod cli;
pub mod context;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod utils;

pub use cli::{Cli, Commands};
pub use context::AppContext;
pub use error::AppError;
pub use models::{Config, OutputFormat};
