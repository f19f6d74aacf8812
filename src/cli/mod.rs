pub mod commands;

// Re-export for clean API
pub use commands::Cli;
