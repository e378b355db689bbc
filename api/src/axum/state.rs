use std::sync::Arc;

use docuchat::{ChatRegistry, Processor};

pub struct State {
    pub processor: Processor,
    pub registry: ChatRegistry,
}

#[allow(clippy::module_name_repetitions)]
pub type AppState = Arc<State>;

pub fn create(processor: Processor, registry: ChatRegistry) -> AppState {
    Arc::new(State {
        processor,
        registry,
    })
}
