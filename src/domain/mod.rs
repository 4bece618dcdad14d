// Domain-specific error types
pub mod errors;

// Port interfaces
pub mod ports;

pub mod sentiment;
pub mod tick;
