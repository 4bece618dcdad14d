use thiserror::Error;
use uuid::Uuid;

/// Errors raised by news and price providers (network, HTTP status, payload shape)
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} request failed for {symbol}: {reason}")]
    Request {
        provider: String,
        symbol: String,
        reason: String,
    },

    #[error("{provider} returned HTTP {status} for {symbol}")]
    Status {
        provider: String,
        symbol: String,
        status: u16,
    },

    #[error("Malformed {provider} payload for {symbol}: {reason}")]
    Malformed {
        provider: String,
        symbol: String,
        reason: String,
    },

    #[error("{provider} rate limited: {message}")]
    RateLimited { provider: String, message: String },
}

/// Errors raised while turning a batch of texts into sentiment scores
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Scorer returned {actual} results for {expected} texts")]
    CountMismatch { expected: usize, actual: usize },

    #[error("Sentiment backend failed: {reason}")]
    Backend { reason: String },
}

/// Numerical or input failures inside the online classifier
#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("Non-finite {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid classifier setting {name}={value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("Model diverged after step {step}")]
    Diverged { step: u64 },
}

/// Failures pushing a payload to one subscriber
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Subscriber {subscriber} closed")]
    Closed { subscriber: Uuid },

    #[error("Transport error for subscriber {subscriber}: {reason}")]
    Transport { subscriber: Uuid, reason: String },

    #[error("Delivery to subscriber {subscriber} timed out after {after_ms}ms")]
    Timeout { subscriber: Uuid, after_ms: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_formatting() {
        let err = ProviderError::Status {
            provider: "Finnhub".to_string(),
            symbol: "AAPL".to_string(),
            status: 429,
        };

        let msg = err.to_string();
        assert!(msg.contains("Finnhub"));
        assert!(msg.contains("AAPL"));
        assert!(msg.contains("429"));
    }

    #[test]
    fn test_delivery_timeout_formatting() {
        let id = Uuid::new_v4();
        let err = DeliveryError::Timeout {
            subscriber: id,
            after_ms: 5000,
        };

        let msg = err.to_string();
        assert!(msg.contains(&id.to_string()));
        assert!(msg.contains("5000ms"));
    }
}
