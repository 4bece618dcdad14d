pub mod broadcaster;
pub mod orchestrator;
pub mod scheduler;
pub mod symbol_registry;
