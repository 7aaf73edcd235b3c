pub mod app;
pub mod calendar;
pub mod clock;
pub mod completion;
pub mod config;
pub mod content;
pub mod engine;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod planner;
pub mod state;
pub mod storage;
pub mod streak;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use engine::ProgressEngine;
pub use state::AppState;
pub use storage::{JsonFileStore, MemoryStore, RecordStore};
