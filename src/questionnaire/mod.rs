//! Onboarding questionnaire: a linear chain of steps that accumulate one
//! record, threaded step to step as a flat parameter mapping.

pub mod codec;
pub mod flow;
pub mod record;
pub mod step;
pub mod terminal;
pub mod units;

pub use codec::Params;
pub use flow::{FlowError, FlowEvent, FlowSequencer, OnboardingSession};
pub use record::{QuestionnaireRecord, SubmittedQuestionnaire};
pub use step::{StepAction, StepKind, StepSettings};
pub use terminal::{HomeView, JsonExportSink, RecordSink, TerminalStrategy};
