// Adapters layer: concrete implementations for external systems (script
// backend, local storage).

pub mod gateway;
pub mod storage;

pub use gateway::{InMemoryGateway, ScriptGateway};
pub use storage::LocalStorage;
