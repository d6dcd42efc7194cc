//! Client-side glue for the remote nutrition analysis service used by the
//! food scanning screens.

pub mod analysis;
pub mod capture;
pub mod client;

pub use analysis::{parse_analysis, parse_rating, AnalysisReport, Finding, Rating};
pub use capture::{CaptureError, CaptureSession, CaptureState};
pub use client::{
    HttpNutritionService, NutritionError, NutritionService, ScanPayload, ScanResponse, ScanResult,
};
