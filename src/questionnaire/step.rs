//! Step contract shared by every onboarding screen.
//!
//! A step restores its editable state from the parameter mapping it was
//! entered with, mutates that state in response to user actions, and on
//! advance forwards the mapping it received with its own fields rewritten.
//! Nothing a step does can remove a field written upstream.

use std::fmt;

use thiserror::Error;

use super::codec::{self, Params};
use super::record::{
    ActivityFloor, ActivityLevel, BiologicalSex, SelectionSet, UnknownLabel, Vocabulary,
    DIETARY_RESTRICTIONS, HEALTH_CONDITIONS,
};
use super::units::{self, HeightUnit, WeightUnit};

pub const MIN_AGE: u8 = 1;
pub const MAX_AGE: u8 = 99;
pub const DEFAULT_AGE: u8 = 35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    DietaryRestrictions,
    WeightHeight,
    Age,
    BiologicalSex,
    PhysicalActivity,
    HealthConditions,
    Completion,
}

impl StepKind {
    pub const ALL: [StepKind; 7] = [
        Self::DietaryRestrictions,
        Self::WeightHeight,
        Self::Age,
        Self::BiologicalSex,
        Self::PhysicalActivity,
        Self::HealthConditions,
        Self::Completion,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Self::DietaryRestrictions => "dietary-restrictions",
            Self::WeightHeight => "weight-height",
            Self::Age => "age",
            Self::BiologicalSex => "biological-sex",
            Self::PhysicalActivity => "physical-activity",
            Self::HealthConditions => "health-conditions",
            Self::Completion => "completion",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        let needle = slug.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| kind.slug() == needle)
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::DietaryRestrictions => "Do you have any dietary restrictions?",
            Self::WeightHeight => "What's your weight and height?",
            Self::Age => "How old are you?",
            Self::BiologicalSex => "What's your biological sex?",
            Self::PhysicalActivity => "How physically active are you?",
            Self::HealthConditions => "Do you have any health conditions?",
            Self::Completion => "Perfect! You're all set.",
        }
    }

    /// Wire keys this step is solely responsible for producing.
    pub fn owned_fields(self) -> &'static [&'static str] {
        match self {
            Self::DietaryRestrictions => &[codec::DIETARY_RESTRICTIONS],
            Self::WeightHeight => &[codec::WEIGHT, codec::HEIGHT],
            Self::Age => &[codec::AGE],
            Self::BiologicalSex => &[codec::BIOLOGICAL_SEX],
            Self::PhysicalActivity => &[codec::PHYSICAL_ACTIVITY],
            Self::HealthConditions => &[codec::HEALTH_CONDITIONS],
            Self::Completion => &[],
        }
    }

    /// Creates an unhydrated step of this kind.
    pub fn build(self, settings: &StepSettings) -> Box<dyn Step> {
        match self {
            Self::DietaryRestrictions => Box::new(MultiSelectStep::dietary()),
            Self::WeightHeight => Box::new(WeightHeightStep::default()),
            Self::Age => Box::new(AgeStep::new(settings.default_age)),
            Self::BiologicalSex => Box::new(BiologicalSexStep::default()),
            Self::PhysicalActivity => Box::new(PhysicalActivityStep::new(settings.activity_floor)),
            Self::HealthConditions => Box::new(MultiSelectStep::health()),
            Self::Completion => Box::new(CompletionStep),
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Per-flow knobs that change how individual steps behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSettings {
    pub activity_floor: ActivityFloor,
    pub default_age: u8,
}

impl Default for StepSettings {
    fn default() -> Self {
        Self {
            activity_floor: ActivityFloor::default(),
            default_age: DEFAULT_AGE,
        }
    }
}

/// Discrete user interactions a step may react to.
#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    Toggle(String),
    Select(String),
    SetWeight(String),
    SetHeight(String),
    ToggleWeightUnit,
    ToggleHeightUnit,
    SetAge(i64),
}

/// Rejected user input. The step state is unchanged when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
        }
    }

    fn unsupported(kind: StepKind) -> Self {
        Self::new(format!("That action is not available on the {} step", kind))
    }
}

impl From<UnknownLabel> for ValidationError {
    fn from(err: UnknownLabel) -> Self {
        Self {
            message: err.to_string(),
            suggestion: err.suggestion.map(str::to_string),
        }
    }
}

pub trait Step: fmt::Debug + Send {
    fn kind(&self) -> StepKind;

    /// Restores local state from the mapping the step was entered with.
    /// Missing or malformed fields fall back to the step's defaults.
    fn hydrate(&mut self, params: &Params);

    fn apply(&mut self, action: StepAction) -> Result<(), ValidationError>;

    /// Whether "Next" is currently available.
    fn can_advance(&self) -> bool {
        true
    }

    /// Writes the fields this step owns into `out`.
    fn write_fields(&self, out: &mut Params);

    /// Options the user can pick from, in display order.
    fn options(&self) -> Vec<String> {
        Vec::new()
    }

    /// Human readable view of the current local state.
    fn summary(&self) -> Vec<(String, String)>;
}

/// Upstream mapping with the step's own fields rewritten from local state.
pub fn forward(step: &dyn Step, upstream: &Params) -> Params {
    let mut out = upstream.clone();
    step.write_fields(&mut out);
    out
}

/// Accepts either a label or its 1-based position in `labels`.
fn resolve_index<'a>(input: &str, labels: &[&'a str]) -> Option<&'a str> {
    input
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|index| (1..=labels.len()).contains(index))
        .map(|index| labels[index - 1])
}

fn display_list(labels: &[String]) -> String {
    if labels.is_empty() {
        "none".into()
    } else {
        labels.join(", ")
    }
}

#[derive(Debug, Clone)]
pub struct MultiSelectStep {
    kind: StepKind,
    field: &'static str,
    selection: SelectionSet,
}

impl MultiSelectStep {
    pub fn dietary() -> Self {
        Self::new(
            StepKind::DietaryRestrictions,
            codec::DIETARY_RESTRICTIONS,
            DIETARY_RESTRICTIONS,
        )
    }

    pub fn health() -> Self {
        Self::new(
            StepKind::HealthConditions,
            codec::HEALTH_CONDITIONS,
            HEALTH_CONDITIONS,
        )
    }

    fn new(kind: StepKind, field: &'static str, vocabulary: Vocabulary) -> Self {
        Self {
            kind,
            field,
            selection: SelectionSet::new(vocabulary),
        }
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }
}

impl Step for MultiSelectStep {
    fn kind(&self) -> StepKind {
        self.kind
    }

    fn hydrate(&mut self, params: &Params) {
        let labels = codec::decode_list(self.field, params.get(self.field));
        self.selection = SelectionSet::from_labels(self.selection.vocabulary(), &labels);
    }

    fn apply(&mut self, action: StepAction) -> Result<(), ValidationError> {
        match action {
            StepAction::Toggle(input) | StepAction::Select(input) => {
                let vocabulary = self.selection.vocabulary();
                let label = resolve_index(&input, vocabulary.labels()).unwrap_or(&input);
                self.selection.toggle(label)?;
                Ok(())
            }
            _ => Err(ValidationError::unsupported(self.kind)),
        }
    }

    fn write_fields(&self, out: &mut Params) {
        out.insert(self.field, codec::encode_list(&self.selection.labels()));
    }

    fn options(&self) -> Vec<String> {
        self.selection
            .vocabulary()
            .labels()
            .iter()
            .map(|label| {
                let mark = if self.selection.contains(label) { "x" } else { " " };
                format!("[{}] {}", mark, label)
            })
            .collect()
    }

    fn summary(&self) -> Vec<(String, String)> {
        vec![(
            self.field.to_string(),
            display_list(&self.selection.labels()),
        )]
    }
}

#[derive(Debug, Clone, Default)]
pub struct WeightHeightStep {
    weight: String,
    height: String,
    weight_unit: WeightUnit,
    height_unit: HeightUnit,
}

impl WeightHeightStep {
    pub fn weight_display(&self) -> (&str, WeightUnit) {
        (&self.weight, self.weight_unit)
    }

    pub fn height_display(&self) -> (&str, HeightUnit) {
        (&self.height, self.height_unit)
    }

    fn validate_measurement(label: &str, text: &str) -> Result<String, ValidationError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(String::new());
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => Ok(trimmed.to_string()),
            Ok(_) => Err(ValidationError::new(format!(
                "{} must be zero or positive",
                label
            ))),
            Err(_) => Err(ValidationError::new(format!(
                "Enter a numeric {}",
                label.to_ascii_lowercase()
            ))),
        }
    }
}

impl Step for WeightHeightStep {
    fn kind(&self) -> StepKind {
        StepKind::WeightHeight
    }

    fn hydrate(&mut self, params: &Params) {
        // Upstream values are canonical, so the display starts in metric.
        self.weight_unit = WeightUnit::Kg;
        self.height_unit = HeightUnit::Cm;
        self.weight = params
            .get(codec::WEIGHT)
            .and_then(|raw| Self::validate_measurement("Weight", raw).ok())
            .unwrap_or_default();
        self.height = params
            .get(codec::HEIGHT)
            .and_then(|raw| Self::validate_measurement("Height", raw).ok())
            .unwrap_or_default();
    }

    fn apply(&mut self, action: StepAction) -> Result<(), ValidationError> {
        match action {
            StepAction::SetWeight(text) => {
                self.weight = Self::validate_measurement("Weight", &text)?;
            }
            StepAction::SetHeight(text) => {
                self.height = Self::validate_measurement("Height", &text)?;
            }
            StepAction::ToggleWeightUnit => {
                self.weight = units::toggle_weight_display(&self.weight, self.weight_unit);
                self.weight_unit = self.weight_unit.toggled();
            }
            StepAction::ToggleHeightUnit => {
                self.height = units::toggle_height_display(&self.height, self.height_unit);
                self.height_unit = self.height_unit.toggled();
            }
            _ => return Err(ValidationError::unsupported(StepKind::WeightHeight)),
        }
        Ok(())
    }

    fn write_fields(&self, out: &mut Params) {
        out.insert(
            codec::WEIGHT,
            codec::encode_measurement(units::canonical_weight(&self.weight, self.weight_unit)),
        );
        out.insert(
            codec::HEIGHT,
            codec::encode_measurement(units::canonical_height(&self.height, self.height_unit)),
        );
    }

    fn summary(&self) -> Vec<(String, String)> {
        let show = |value: &str, unit: String| {
            if value.is_empty() {
                format!("(empty) [{}]", unit)
            } else {
                format!("{} {}", value, unit)
            }
        };
        vec![
            (
                codec::WEIGHT.to_string(),
                show(&self.weight, self.weight_unit.to_string()),
            ),
            (
                codec::HEIGHT.to_string(),
                show(&self.height, self.height_unit.to_string()),
            ),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct AgeStep {
    age: u8,
    default_age: u8,
}

impl AgeStep {
    pub fn new(default_age: u8) -> Self {
        let default_age = default_age.clamp(MIN_AGE, MAX_AGE);
        Self {
            age: default_age,
            default_age,
        }
    }

    pub fn age(&self) -> u8 {
        self.age
    }

    fn clamp(value: i64) -> u8 {
        value.clamp(MIN_AGE as i64, MAX_AGE as i64) as u8
    }
}

impl Step for AgeStep {
    fn kind(&self) -> StepKind {
        StepKind::Age
    }

    fn hydrate(&mut self, params: &Params) {
        self.age = codec::decode_number::<i64>(params.get(codec::AGE))
            .map(Self::clamp)
            .unwrap_or(self.default_age);
    }

    fn apply(&mut self, action: StepAction) -> Result<(), ValidationError> {
        match action {
            StepAction::SetAge(value) => {
                self.age = Self::clamp(value);
                Ok(())
            }
            _ => Err(ValidationError::unsupported(StepKind::Age)),
        }
    }

    fn write_fields(&self, out: &mut Params) {
        out.insert(codec::AGE, self.age.to_string());
    }

    fn summary(&self) -> Vec<(String, String)> {
        let shown = if self.age >= MAX_AGE {
            format!("{}+", MAX_AGE)
        } else {
            self.age.to_string()
        };
        vec![(codec::AGE.to_string(), shown)]
    }
}

#[derive(Debug, Clone, Default)]
pub struct BiologicalSexStep {
    selected: Option<BiologicalSex>,
}

impl BiologicalSexStep {
    pub fn selected(&self) -> Option<BiologicalSex> {
        self.selected
    }
}

impl Step for BiologicalSexStep {
    fn kind(&self) -> StepKind {
        StepKind::BiologicalSex
    }

    fn hydrate(&mut self, params: &Params) {
        self.selected = params
            .get(codec::BIOLOGICAL_SEX)
            .and_then(|raw| raw.parse().ok());
    }

    fn apply(&mut self, action: StepAction) -> Result<(), ValidationError> {
        match action {
            StepAction::Select(input) => {
                let labels: Vec<&str> = BiologicalSex::ALL.iter().map(|s| s.label()).collect();
                let label = resolve_index(&input, &labels).unwrap_or(&input);
                let sex = label.parse::<BiologicalSex>().map_err(ValidationError::new)?;
                self.selected = Some(sex);
                Ok(())
            }
            _ => Err(ValidationError::unsupported(StepKind::BiologicalSex)),
        }
    }

    fn can_advance(&self) -> bool {
        self.selected.is_some()
    }

    fn write_fields(&self, out: &mut Params) {
        out.insert(
            codec::BIOLOGICAL_SEX,
            self.selected
                .map(|sex| sex.label().to_string())
                .unwrap_or_default(),
        );
    }

    fn options(&self) -> Vec<String> {
        BiologicalSex::ALL
            .iter()
            .map(|sex| {
                let mark = if self.selected == Some(*sex) { "*" } else { " " };
                format!("({}) {}", mark, sex.label())
            })
            .collect()
    }

    fn summary(&self) -> Vec<(String, String)> {
        vec![(
            codec::BIOLOGICAL_SEX.to_string(),
            self.selected
                .map(|sex| sex.label().to_string())
                .unwrap_or_else(|| "not selected".into()),
        )]
    }
}

#[derive(Debug, Clone)]
pub struct PhysicalActivityStep {
    selected: Option<ActivityLevel>,
    floor: ActivityFloor,
}

impl PhysicalActivityStep {
    pub fn new(floor: ActivityFloor) -> Self {
        Self {
            selected: None,
            floor,
        }
    }

    pub fn selected(&self) -> Option<ActivityLevel> {
        self.selected
    }

    fn labels(&self) -> Vec<&'static str> {
        ActivityLevel::ALL
            .iter()
            .map(|level| level.label(self.floor))
            .collect()
    }
}

impl Step for PhysicalActivityStep {
    fn kind(&self) -> StepKind {
        StepKind::PhysicalActivity
    }

    fn hydrate(&mut self, params: &Params) {
        self.selected = params
            .get(codec::PHYSICAL_ACTIVITY)
            .and_then(ActivityLevel::parse);
    }

    fn apply(&mut self, action: StepAction) -> Result<(), ValidationError> {
        match action {
            StepAction::Select(input) => {
                let labels = self.labels();
                let label = resolve_index(&input, &labels).unwrap_or(&input);
                let level = ActivityLevel::parse(label).ok_or_else(|| {
                    ValidationError::new(format!(
                        "Select one of: {}",
                        labels.join(", ")
                    ))
                })?;
                self.selected = Some(level);
                Ok(())
            }
            _ => Err(ValidationError::unsupported(StepKind::PhysicalActivity)),
        }
    }

    fn can_advance(&self) -> bool {
        self.selected.is_some()
    }

    fn write_fields(&self, out: &mut Params) {
        out.insert(
            codec::PHYSICAL_ACTIVITY,
            self.selected
                .map(|level| level.label(self.floor).to_string())
                .unwrap_or_default(),
        );
    }

    fn options(&self) -> Vec<String> {
        ActivityLevel::ALL
            .iter()
            .map(|level| {
                let mark = if self.selected == Some(*level) { "*" } else { " " };
                format!("({}) {}", mark, level.label(self.floor))
            })
            .collect()
    }

    fn summary(&self) -> Vec<(String, String)> {
        vec![(
            codec::PHYSICAL_ACTIVITY.to_string(),
            self.selected
                .map(|level| level.label(self.floor).to_string())
                .unwrap_or_else(|| "not selected".into()),
        )]
    }
}

/// Closing screen shown before the record is handed off.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionStep;

impl Step for CompletionStep {
    fn kind(&self) -> StepKind {
        StepKind::Completion
    }

    fn hydrate(&mut self, _params: &Params) {}

    fn apply(&mut self, _action: StepAction) -> Result<(), ValidationError> {
        Err(ValidationError::unsupported(StepKind::Completion))
    }

    fn write_fields(&self, _out: &mut Params) {}

    fn summary(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}
