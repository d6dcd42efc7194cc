//! Shell state, dispatch, and error reporting.

use std::io;

use dialoguer::theme::ColorfulTheme;
use rustyline::error::ReadlineError;

use crate::{
    config::{Config, ConfigManager},
    errors::WelloError,
    nutrition::{CaptureError, CaptureSession, HttpNutritionService, ScanPayload, ScanResult},
    questionnaire::{
        terminal::SubmitError, FlowError, HomeView, JsonExportSink, OnboardingSession, RecordSink,
        SubmittedQuestionnaire,
    },
};

use super::commands::{self, CommandDefinition, CommandRegistry};
use super::help;
use super::io as cli_io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] WelloError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Readline(#[from] ReadlineError),
    #[error(transparent)]
    Command(#[from] CommandError),
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Core(#[from] WelloError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

/// Hands submissions to the home view, exporting them first when enabled.
#[derive(Debug, Default)]
pub struct CliSink {
    pub home: HomeView,
    pub export: Option<JsonExportSink>,
}

impl RecordSink for CliSink {
    fn submit(&mut self, submission: &SubmittedQuestionnaire) -> Result<(), SubmitError> {
        if let Some(export) = self.export.as_mut() {
            export.submit(submission)?;
        }
        self.home.submit(submission)
    }
}

pub struct ShellContext {
    pub mode: CliMode,
    pub(crate) registry: CommandRegistry,
    pub theme: ColorfulTheme,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub session: OnboardingSession,
    pub sink: CliSink,
    pub capture: CaptureSession,
    runtime: Option<tokio::runtime::Runtime>,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_manager(mode, ConfigManager::new()?)
    }

    pub fn with_manager(mode: CliMode, config_manager: ConfigManager) -> Result<Self, CliError> {
        let config = config_manager.load()?;
        let sink = CliSink {
            home: HomeView::new(),
            export: config
                .export_records
                .then(|| JsonExportSink::new(config_manager.records_dir())),
        };
        tracing::debug!(config = %config_manager.path().display(), "shell context ready");

        Ok(Self {
            mode,
            registry: CommandRegistry::new(commands::all_definitions()),
            theme: ColorfulTheme::default(),
            session: OnboardingSession::new(config.sequencer()),
            config_manager,
            config,
            sink,
            capture: CaptureSession::new(),
            runtime: None,
            running: true,
        })
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandDefinition> {
        self.registry.get(name)
    }

    pub(crate) fn prompt(&self) -> String {
        if self.session.is_finished() {
            return "wello [home]> ".into();
        }
        let (index, total) = self.session.position();
        format!("wello [{}/{} {}]> ", index, total, self.session.current_kind())
    }

    /// Starts a fresh traversal with the current configuration.
    pub fn restart_session(&mut self) {
        self.session = OnboardingSession::new(self.config.sequencer());
        self.sink.export = self
            .config
            .export_records
            .then(|| JsonExportSink::new(self.config_manager.records_dir()));
    }

    pub fn persist_config(&self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        Ok(())
    }

    pub fn nutrition_service(&self) -> Result<HttpNutritionService, CommandError> {
        HttpNutritionService::new(
            self.config.nutrition_endpoint.clone(),
            self.config.request_timeout(),
        )
        .map_err(|err| CommandError::Capture(err.into()))
    }

    /// Runs one capture against the configured service. The runtime driving
    /// the async client is built on first use.
    pub fn scan(&mut self, payload: ScanPayload) -> Result<ScanResult, CommandError> {
        let service = self.nutrition_service()?;
        if self.runtime.is_none() {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            self.runtime = Some(runtime);
        }
        let Some(runtime) = self.runtime.as_ref() else {
            return Err(CommandError::Message("async runtime unavailable".into()));
        };
        Ok(runtime.block_on(self.capture.scan(&service, payload))?)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.get(command).map(|entry| entry.handler) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        if let Some(best) = self.registry.closest(input) {
            cli_io::print_info(format!("Suggestion: `{}`?", best));
        }
    }

    pub(crate) fn print_usage(&self, name: &str) {
        if let Some(entry) = self.command(name) {
            help::print_command(entry);
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Ok(cli_io::confirm_action(&self.theme, "Exit shell?")?)
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(message);
                cli_io::print_info("Use `help <command>` for usage details.");
            }
            CommandError::Flow(FlowError::Validation(err)) => {
                cli_io::print_error(&err.message);
                if let Some(suggestion) = err.suggestion {
                    cli_io::print_info(format!("Did you mean `{}`?", suggestion));
                }
            }
            CommandError::Flow(FlowError::Finished) => {
                cli_io::print_warning("Onboarding already submitted. Use `restart` to begin again.");
            }
            other => cli_io::print_error(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questionnaire::{FlowEvent, StepKind};
    use tempfile::TempDir;

    fn context(temp: &TempDir) -> ShellContext {
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        ShellContext::with_manager(CliMode::Script, manager).unwrap()
    }

    #[test]
    fn prompt_shows_position() {
        let temp = TempDir::new().unwrap();
        let context = context(&temp);
        assert_eq!(context.prompt(), "wello [1/7 dietary-restrictions]> ");
    }

    #[test]
    fn unknown_command_keeps_running() {
        let temp = TempDir::new().unwrap();
        let mut context = context(&temp);
        let control = context.dispatch("nxet", "nxet", &[]).unwrap();
        assert_eq!(control, LoopControl::Continue);
    }

    #[test]
    fn exit_command_stops_loop() {
        let temp = TempDir::new().unwrap();
        let mut context = context(&temp);
        assert_eq!(context.dispatch("exit", "exit", &[]).unwrap(), LoopControl::Exit);
    }

    #[test]
    fn sink_exports_before_home_hand_off() {
        let temp = TempDir::new().unwrap();
        let mut context = context(&temp);
        context.config.terminal = crate::questionnaire::TerminalStrategy::HealthConditions;
        context.restart_session();
        for _ in 0..3 {
            context.session.next(&mut context.sink).unwrap();
        }
        context
            .session
            .apply(crate::questionnaire::StepAction::Select("Male".into()))
            .unwrap();
        context.session.next(&mut context.sink).unwrap();
        context
            .session
            .apply(crate::questionnaire::StepAction::Select("2".into()))
            .unwrap();
        context.session.next(&mut context.sink).unwrap();
        assert_eq!(context.session.current_kind(), StepKind::HealthConditions);

        let event = context.session.next(&mut context.sink).unwrap();
        let FlowEvent::Submitted(submission) = event else {
            panic!("expected submission, got {:?}", event);
        };
        assert_eq!(context.sink.home.received(), 1);
        let exported = temp
            .path()
            .join("records")
            .join(format!("onboarding_{}.json", submission.id));
        assert!(exported.exists());
    }
}
