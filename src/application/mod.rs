// Headline fetching, price polling and the rolling sentiment buffer
pub mod market_data;

// Incremental per-symbol classifier
pub mod ml;

// Cycle scheduling, symbol state and subscriber fan-out
pub mod streaming;

// System orchestrator
pub mod system;
