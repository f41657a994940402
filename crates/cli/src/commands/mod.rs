//! Command handlers for the askdoc CLI.

pub mod ask;
pub mod chat;
pub mod ingest;
pub mod qa;
pub mod stats;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use ingest::IngestCommand;
pub use stats::StatsCommand;
