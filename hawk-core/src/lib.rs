pub mod config;
pub mod files;
pub mod lifecycle;
pub mod parse;
pub mod probe;
pub mod scheduler;
pub mod state;
pub mod summary;
pub mod text;

// Scripted gateway for demos and tests
pub mod fake;
