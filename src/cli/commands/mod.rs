mod ask;
mod config;
mod ingest;
mod query;
mod status;
mod topics;

pub use ask::AskArgs;
pub use config::ConfigCommand;
pub use ingest::IngestArgs;
pub use query::QueryArgs;

pub use ask::handle_ask;
pub use config::handle_config;
pub use ingest::handle_ingest;
pub use query::handle_query;
pub use status::handle_status;
pub use topics::handle_topics;
