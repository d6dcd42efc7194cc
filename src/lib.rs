#![doc(test(attr(deny(warnings))))]

//! Wello Core hosts the onboarding questionnaire flow, the unit conversions
//! it relies on, and the client glue for the remote nutrition analysis
//! service that backs food scanning.

pub mod cli;
pub mod config;
pub mod errors;
pub mod nutrition;
pub mod questionnaire;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Wello Core tracing initialized.");
    });
}
