pub mod online_predictor;
pub mod predictor;
pub mod sgd_classifier;
