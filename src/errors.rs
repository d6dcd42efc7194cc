use thiserror::Error;

use crate::nutrition::{capture::CaptureError, client::NutritionError};
use crate::questionnaire::flow::FlowError;

/// Error type that captures common onboarding failures.
#[derive(Debug, Error)]
pub enum WelloError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Nutrition(#[from] NutritionError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
}
