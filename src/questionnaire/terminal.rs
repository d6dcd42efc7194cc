//! Final assembly and hand-off of the accumulated record.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::codec::Params;
use super::record::{QuestionnaireRecord, SubmittedQuestionnaire};
use crate::errors::WelloError;
use crate::utils::persistence;

/// Which step owns the final hand-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminalStrategy {
    /// Health conditions submits directly.
    HealthConditions,
    /// A completion screen follows health conditions and submits.
    #[default]
    Completion,
}

impl fmt::Display for TerminalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::HealthConditions => "health-conditions",
            Self::Completion => "completion",
        })
    }
}

impl FromStr for TerminalStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "health-conditions" => Ok(Self::HealthConditions),
            "completion" => Ok(Self::Completion),
            other => Err(format!("unknown terminal step `{}`", other)),
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("could not export record to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: Box<WelloError>,
    },
    #[error("submission rejected: {0}")]
    Rejected(String),
}

/// External collaborator receiving the completed questionnaire.
pub trait RecordSink {
    fn submit(&mut self, submission: &SubmittedQuestionnaire) -> Result<(), SubmitError>;
}

/// Builds the submission from the accumulated mapping. Earlier gates are
/// trusted; nothing is re-validated here.
pub fn assemble(params: &Params) -> SubmittedQuestionnaire {
    SubmittedQuestionnaire::new(QuestionnaireRecord::from_params(params))
}

/// In-process hand-off to the home view.
#[derive(Debug, Default)]
pub struct HomeView {
    latest: Option<SubmittedQuestionnaire>,
    received: usize,
}

impl HomeView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<&SubmittedQuestionnaire> {
        self.latest.as_ref()
    }

    pub fn received(&self) -> usize {
        self.received
    }
}

impl RecordSink for HomeView {
    fn submit(&mut self, submission: &SubmittedQuestionnaire) -> Result<(), SubmitError> {
        self.latest = Some(submission.clone());
        self.received += 1;
        Ok(())
    }
}

/// Writes each submission as `onboarding_<id>.json` below a directory.
#[derive(Debug, Clone)]
pub struct JsonExportSink {
    dir: PathBuf,
}

impl JsonExportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, submission: &SubmittedQuestionnaire) -> PathBuf {
        self.dir.join(format!("onboarding_{}.json", submission.id))
    }
}

impl RecordSink for JsonExportSink {
    fn submit(&mut self, submission: &SubmittedQuestionnaire) -> Result<(), SubmitError> {
        let path = self.path_for(submission);
        persistence::save_json_atomic(submission, &path).map_err(|source| SubmitError::Export {
            path: path.clone(),
            source: Box::new(source),
        })?;
        tracing::info!(path = %path.display(), "exported onboarding record");
        Ok(())
    }
}
