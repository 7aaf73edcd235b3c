use crate::clock::{Clock, FixedClock, SystemClock};
use crate::config::Config;
use crate::engine::ProgressEngine;
use crate::storage::JsonFileStore;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Mutex<ProgressEngine<JsonFileStore>>>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(store: JsonFileStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            engine: Arc::new(Mutex::new(ProgressEngine::new(store))),
            clock,
        }
    }

    pub fn from_config(config: &Config, store: JsonFileStore) -> Self {
        let clock: Arc<dyn Clock> = match config.fixed_today {
            Some(date) => Arc::new(FixedClock(date)),
            None => Arc::new(SystemClock),
        };
        Self::new(store, clock)
    }
}
