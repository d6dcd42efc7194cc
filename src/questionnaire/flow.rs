//! Ordered onboarding steps and the navigation rules between them.
//!
//! [`OnboardingSession`] keeps a navigation stack of [`StepFrame`]s. Each
//! frame owns a copy of the mapping it was entered with and the step's local
//! state, so going back lands on the previous frame exactly as it was left.
//! "Next" pushes a new frame built from what the current step forwards; the
//! step designated as terminal hands the record to a [`RecordSink`] instead.

use thiserror::Error;

use super::codec::Params;
use super::record::SubmittedQuestionnaire;
use super::step::{forward, Step, StepAction, StepKind, StepSettings, ValidationError};
use super::terminal::{self, RecordSink, SubmitError, TerminalStrategy};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("terminal hand-off failed: {0}")]
    Submit(#[from] SubmitError),
    #[error("step `{0}` is not part of this flow")]
    UnknownStep(String),
    #[error("the questionnaire has already been submitted")]
    Finished,
}

/// Fixed, acyclic step order for one flow configuration.
#[derive(Debug, Clone)]
pub struct FlowSequencer {
    order: Vec<StepKind>,
    strategy: TerminalStrategy,
    settings: StepSettings,
}

impl FlowSequencer {
    pub fn new(strategy: TerminalStrategy, settings: StepSettings) -> Self {
        let mut order = vec![
            StepKind::DietaryRestrictions,
            StepKind::WeightHeight,
            StepKind::Age,
            StepKind::BiologicalSex,
            StepKind::PhysicalActivity,
            StepKind::HealthConditions,
        ];
        if strategy == TerminalStrategy::Completion {
            order.push(StepKind::Completion);
        }
        Self {
            order,
            strategy,
            settings,
        }
    }

    pub fn steps(&self) -> &[StepKind] {
        &self.order
    }

    pub fn strategy(&self) -> TerminalStrategy {
        self.strategy
    }

    pub fn settings(&self) -> &StepSettings {
        &self.settings
    }

    pub fn first(&self) -> StepKind {
        self.order[0]
    }

    /// The step with no forward transition.
    pub fn terminal(&self) -> StepKind {
        self.order[self.order.len() - 1]
    }

    pub fn position(&self, kind: StepKind) -> Option<usize> {
        self.order.iter().position(|candidate| *candidate == kind)
    }

    pub fn next_after(&self, kind: StepKind) -> Option<StepKind> {
        self.position(kind)
            .and_then(|index| self.order.get(index + 1))
            .copied()
    }

    pub fn previous_before(&self, kind: StepKind) -> Option<StepKind> {
        self.position(kind)
            .and_then(|index| index.checked_sub(1))
            .and_then(|index| self.order.get(index))
            .copied()
    }
}

impl Default for FlowSequencer {
    fn default() -> Self {
        Self::new(TerminalStrategy::default(), StepSettings::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationPhase {
    Idle,
    Hydrated,
}

/// One entry on the navigation stack.
#[derive(Debug)]
pub struct StepFrame {
    received: Params,
    step: Box<dyn Step>,
    phase: HydrationPhase,
}

impl StepFrame {
    fn new(kind: StepKind, settings: &StepSettings, received: Params) -> Self {
        Self {
            received,
            step: kind.build(settings),
            phase: HydrationPhase::Idle,
        }
    }

    /// Idle -> Hydrated. Entering an already hydrated frame changes nothing.
    fn activate(&mut self) {
        if self.phase == HydrationPhase::Idle {
            self.step.hydrate(&self.received);
            self.phase = HydrationPhase::Hydrated;
            tracing::debug!(step = %self.step.kind(), fields = self.received.len(), "step hydrated");
        }
    }

    pub fn step(&self) -> &dyn Step {
        self.step.as_ref()
    }

    pub fn received(&self) -> &Params {
        &self.received
    }

    pub fn phase(&self) -> HydrationPhase {
        self.phase
    }

    fn forwarded(&self) -> Params {
        forward(self.step.as_ref(), &self.received)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    Advanced(StepKind),
    /// "Next" pressed while the gate is closed; nothing changed.
    Blocked(StepKind),
    Returned(StepKind),
    /// "Back" pressed on the first step.
    AtStart,
    Submitted(SubmittedQuestionnaire),
    /// Navigation after the record was handed off.
    Finished,
}

/// One traversal of the onboarding flow.
#[derive(Debug)]
pub struct OnboardingSession {
    sequencer: FlowSequencer,
    frames: Vec<StepFrame>,
    finished: bool,
}

impl OnboardingSession {
    pub fn new(sequencer: FlowSequencer) -> Self {
        let mut frame = StepFrame::new(sequencer.first(), sequencer.settings(), Params::new());
        frame.activate();
        Self {
            sequencer,
            frames: vec![frame],
            finished: false,
        }
    }

    /// Enters the flow directly at `kind` with a parameter mapping, as when a
    /// step is addressed as a route. Earlier steps are seeded from the same
    /// mapping so "Back" still walks the full order.
    pub fn enter_at(
        sequencer: FlowSequencer,
        kind: StepKind,
        params: Params,
    ) -> Result<Self, FlowError> {
        let index = sequencer
            .position(kind)
            .ok_or_else(|| FlowError::UnknownStep(kind.slug().to_string()))?;
        let frames = sequencer.steps()[..=index]
            .iter()
            .map(|step_kind| {
                let mut frame = StepFrame::new(*step_kind, sequencer.settings(), params.clone());
                frame.activate();
                frame
            })
            .collect();
        tracing::info!(step = %kind, "entered onboarding flow by route");
        Ok(Self {
            sequencer,
            frames,
            finished: false,
        })
    }

    pub fn sequencer(&self) -> &FlowSequencer {
        &self.sequencer
    }

    fn frame(&self) -> &StepFrame {
        // The stack is never empty: back() refuses to pop the first frame.
        &self.frames[self.frames.len() - 1]
    }

    fn frame_mut(&mut self) -> &mut StepFrame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    pub fn current(&self) -> &dyn Step {
        self.frame().step()
    }

    pub fn current_kind(&self) -> StepKind {
        self.current().kind()
    }

    pub fn current_frame(&self) -> &StepFrame {
        self.frame()
    }

    /// 1-based index of the current step and the number of steps.
    pub fn position(&self) -> (usize, usize) {
        let index = self
            .sequencer
            .position(self.current_kind())
            .unwrap_or(self.frames.len() - 1);
        (index + 1, self.sequencer.steps().len())
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_terminal(&self) -> bool {
        self.current_kind() == self.sequencer.terminal()
    }

    pub fn can_advance(&self) -> bool {
        !self.finished && self.current().can_advance()
    }

    /// The mapping "Next" would forward right now.
    pub fn snapshot(&self) -> Params {
        self.frame().forwarded()
    }

    pub fn apply(&mut self, action: StepAction) -> Result<(), FlowError> {
        if self.finished {
            return Err(FlowError::Finished);
        }
        self.frame_mut().step.apply(action)?;
        Ok(())
    }

    pub fn next(&mut self, sink: &mut dyn RecordSink) -> Result<FlowEvent, FlowError> {
        if self.finished {
            return Ok(FlowEvent::Finished);
        }

        let kind = self.current_kind();
        if !self.current().can_advance() {
            tracing::debug!(step = %kind, "next pressed with the gate closed");
            return Ok(FlowEvent::Blocked(kind));
        }

        let forwarded = self.snapshot();

        match self.sequencer.next_after(kind) {
            Some(next_kind) => {
                let mut frame = StepFrame::new(next_kind, self.sequencer.settings(), forwarded);
                frame.activate();
                self.frames.push(frame);
                tracing::info!(from = %kind, to = %next_kind, "advanced onboarding step");
                Ok(FlowEvent::Advanced(next_kind))
            }
            None => {
                let submission = terminal::assemble(&forwarded);
                if let Err(err) = sink.submit(&submission) {
                    tracing::warn!(step = %kind, %err, "terminal hand-off failed");
                    return Err(err.into());
                }
                self.finished = true;
                tracing::info!(id = %submission.id, "onboarding questionnaire submitted");
                Ok(FlowEvent::Submitted(submission))
            }
        }
    }

    pub fn back(&mut self) -> FlowEvent {
        if self.finished {
            return FlowEvent::Finished;
        }
        if self.frames.len() <= 1 {
            return FlowEvent::AtStart;
        }
        let left = self.frames.pop().map(|frame| frame.step.kind());
        let kind = self.current_kind();
        tracing::info!(from = ?left, to = %kind, "returned to previous onboarding step");
        FlowEvent::Returned(kind)
    }
}
