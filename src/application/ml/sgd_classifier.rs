//! Logistic-loss SGD classifier over a single scalar feature.
//!
//! Uses the "optimal" learning-rate schedule
//! `eta_t = 1 / (alpha * (t0 + t - 1))`. The L2 penalty shrinks the weight
//! before each gradient step is added. Every `partial_fit` consumes exactly one sample, so the model
//! is deterministic for a given sample sequence.

use super::predictor::{OnlineClassifier, Outcome};
use crate::domain::errors::PredictorError;

pub const DEFAULT_ALPHA: f64 = 0.0001;

#[derive(Debug, Clone)]
pub struct SgdLogisticRegression {
    weight: f64,
    intercept: f64,
    alpha: f64,
    /// Offset of the learning-rate schedule
    t0: f64,
    /// Next step index, starting at 1
    t: f64,
    steps: u64,
}

impl SgdLogisticRegression {
    pub fn new(alpha: f64) -> Result<Self, PredictorError> {
        if !alpha.is_finite() || alpha <= 0.0 {
            return Err(PredictorError::InvalidParameter {
                name: "alpha",
                value: alpha,
            });
        }

        let typical_weight = (1.0 / alpha.sqrt()).sqrt();
        let eta0 = typical_weight / log_dloss(-typical_weight, 1.0).max(1.0);

        Ok(Self {
            weight: 0.0,
            intercept: 0.0,
            alpha,
            t0: 1.0 / (eta0 * alpha),
            t: 1.0,
            steps: 0,
        })
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn decision(&self, feature: f64) -> f64 {
        self.weight * feature + self.intercept
    }
}

impl Default for SgdLogisticRegression {
    fn default() -> Self {
        Self {
            weight: 0.0,
            intercept: 0.0,
            alpha: DEFAULT_ALPHA,
            // eta0 = 10 for the default alpha
            t0: 1000.0,
            t: 1.0,
            steps: 0,
        }
    }
}

impl OnlineClassifier for SgdLogisticRegression {
    fn partial_fit(&mut self, feature: f64, outcome: Outcome) -> Result<(), PredictorError> {
        if !feature.is_finite() {
            return Err(PredictorError::NonFinite {
                what: "feature",
                value: feature,
            });
        }

        let y = match outcome {
            Outcome::Up => 1.0,
            Outcome::NotUp => -1.0,
        };
        let eta = 1.0 / (self.alpha * (self.t0 + self.t - 1.0));
        let update = -eta * log_dloss(self.decision(feature), y);

        let shrink = (1.0 - eta * self.alpha).max(0.0);
        let weight = self.weight * shrink + update * feature;
        let intercept = self.intercept + update;

        if !weight.is_finite() || !intercept.is_finite() {
            return Err(PredictorError::Diverged {
                step: self.steps + 1,
            });
        }

        self.weight = weight;
        self.intercept = intercept;
        self.t += 1.0;
        self.steps += 1;
        Ok(())
    }

    fn predict_proba(&self, feature: f64) -> Result<f64, PredictorError> {
        if !feature.is_finite() {
            return Err(PredictorError::NonFinite {
                what: "feature",
                value: feature,
            });
        }
        let p = sigmoid(self.decision(feature));
        if p.is_nan() {
            return Err(PredictorError::NonFinite {
                what: "probability",
                value: p,
            });
        }
        Ok(p)
    }

    fn name(&self) -> &str {
        "SGD Logistic Regression"
    }
}

/// Derivative of the log loss w.r.t. the decision value `p`, for `y` in {-1, 1}
fn log_dloss(p: f64, y: f64) -> f64 {
    let z = p * y;
    if z > 18.0 {
        -y * (-z).exp()
    } else if z < -18.0 {
        -y
    } else {
        -y / (z.exp() + 1.0)
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_alpha() {
        assert!(SgdLogisticRegression::new(0.0).is_err());
        assert!(SgdLogisticRegression::new(-1.0).is_err());
        assert!(SgdLogisticRegression::new(f64::NAN).is_err());
    }

    #[test]
    fn test_default_matches_default_alpha() {
        let built = SgdLogisticRegression::new(DEFAULT_ALPHA).unwrap();
        let default = SgdLogisticRegression::default();
        assert!((built.t0 - default.t0).abs() < 1e-6);
    }

    #[test]
    fn test_untrained_model_is_undecided() {
        let model = SgdLogisticRegression::default();
        assert_eq!(model.predict_proba(0.4).unwrap(), 0.5);
    }

    #[test]
    fn test_first_step_is_deterministic() {
        // eta = 10, dloss(0, 1) = -0.5 -> update = 5
        let mut model = SgdLogisticRegression::default();
        model.partial_fit(0.4, Outcome::Up).unwrap();

        assert!((model.intercept() - 5.0).abs() < 1e-9);
        assert!((model.weight() - 2.0).abs() < 1e-9);
        assert_eq!(model.steps(), 1);
    }

    #[test]
    fn test_shrink_applies_to_previous_weight() {
        let mut model = SgdLogisticRegression::default();
        model.partial_fit(0.4, Outcome::Up).unwrap();
        let (w, b) = (model.weight(), model.intercept());

        model.partial_fit(0.4, Outcome::NotUp).unwrap();

        // Second step: eta = 1 / (alpha * (t0 + 1))
        let eta = 1.0 / (DEFAULT_ALPHA * (model.t0 + 1.0));
        let update = -eta * log_dloss(w * 0.4 + b, -1.0);
        let expected = w * (1.0 - eta * DEFAULT_ALPHA) + update * 0.4;
        assert!((model.weight() - expected).abs() < 1e-9);
        assert!((model.intercept() - (b + update)).abs() < 1e-9);
    }

    #[test]
    fn test_learns_positive_association() {
        let mut model = SgdLogisticRegression::default();
        for i in 0..200 {
            let (x, outcome) = if i % 2 == 0 {
                (0.6, Outcome::Up)
            } else {
                (-0.6, Outcome::NotUp)
            };
            model.partial_fit(x, outcome).unwrap();
        }

        let up = model.predict_proba(0.6).unwrap();
        let down = model.predict_proba(-0.6).unwrap();
        assert!(up > 0.5, "expected bullish probability, got {up}");
        assert!(down < 0.5, "expected bearish probability, got {down}");
        assert!((0.0..=1.0).contains(&up));
    }

    #[test]
    fn test_non_finite_feature_leaves_parameters_untouched() {
        let mut model = SgdLogisticRegression::default();
        model.partial_fit(0.3, Outcome::Up).unwrap();
        let (w, b) = (model.weight(), model.intercept());

        assert!(model.partial_fit(f64::NAN, Outcome::Up).is_err());
        assert!(model.predict_proba(f64::INFINITY).is_err());
        assert_eq!(model.weight(), w);
        assert_eq!(model.intercept(), b);
        assert_eq!(model.steps(), 1);
    }

    #[test]
    fn test_extreme_decision_values_stay_in_range() {
        assert_eq!(sigmoid(-1000.0), 0.0);
        assert_eq!(sigmoid(1000.0), 1.0);
        assert!((log_dloss(50.0, 1.0)).abs() < 1e-15);
        assert_eq!(log_dloss(-50.0, 1.0), -1.0);
    }
}
