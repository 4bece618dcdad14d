//! Push-based observability for Sentitick
//!
//! Pipeline counters live in a Prometheus registry. The reporter renders a
//! periodic JSON snapshot to stdout; nothing listens for scrape requests.

pub mod metrics;
pub mod reporter;

pub use metrics::Metrics;
pub use reporter::MetricsReporter;
