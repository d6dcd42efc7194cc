use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::codec::{self, Params};

const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Fixed list of labels a multi-select step may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vocabulary {
    name: &'static str,
    labels: &'static [&'static str],
}

pub const DIETARY_RESTRICTIONS: Vocabulary = Vocabulary {
    name: "dietary restriction",
    labels: &["Vegetarian", "Vegan", "Kosher", "Halal", "Other"],
};

pub const HEALTH_CONDITIONS: Vocabulary = Vocabulary {
    name: "health condition",
    labels: &[
        "POTS",
        "Anemia",
        "Diabetes",
        "Underweight",
        "IBS",
        "Depression",
        "ARFID",
        "Gluten Free",
        "PICA",
        "Crohn's",
        "High BP",
        "Cholesterol",
        "GERD",
        "Anxiety",
        "Binge Eating",
        "OCD",
        "Heart disease",
        "HIV/AIDS",
        "Postpartum",
        "Kidney Disease",
        "Nut allergy",
        "Dementia",
        "Anorexia",
        "Alzheimer's",
        "Acne",
        "Bulimia",
    ],
};

impl Vocabulary {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.labels
    }

    /// Case-insensitive lookup returning the canonical label.
    pub fn resolve(&self, input: &str) -> Option<&'static str> {
        let needle = input.trim();
        self.labels
            .iter()
            .copied()
            .find(|label| label.eq_ignore_ascii_case(needle))
    }

    /// Closest label for a misspelled entry, if any is close enough.
    pub fn suggest(&self, input: &str) -> Option<&'static str> {
        let needle = input.trim().to_ascii_lowercase();
        self.labels
            .iter()
            .map(|label| (*label, strsim::jaro_winkler(&needle, &label.to_ascii_lowercase())))
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(label, _)| label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {vocabulary}: `{input}`")]
pub struct UnknownLabel {
    pub vocabulary: &'static str,
    pub input: String,
    pub suggestion: Option<&'static str>,
}

/// Toggle-style multi-select. Keeps first-selection order and never holds
/// the same label twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSet {
    vocabulary: Vocabulary,
    selected: Vec<&'static str>,
}

impl SelectionSet {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary,
            selected: Vec::new(),
        }
    }

    /// Builds a selection from decoded labels, dropping duplicates and labels
    /// outside the vocabulary.
    pub fn from_labels<S: AsRef<str>>(vocabulary: Vocabulary, labels: &[S]) -> Self {
        let mut set = Self::new(vocabulary);
        for raw in labels {
            match vocabulary.resolve(raw.as_ref()) {
                Some(label) if !set.selected.contains(&label) => set.selected.push(label),
                Some(_) => {}
                None => tracing::warn!(
                    vocabulary = vocabulary.name,
                    label = raw.as_ref(),
                    "ignoring unknown label"
                ),
            }
        }
        set
    }

    /// Flips membership of `input`; returns whether it is selected afterwards.
    pub fn toggle(&mut self, input: &str) -> Result<bool, UnknownLabel> {
        let label = self.vocabulary.resolve(input).ok_or_else(|| UnknownLabel {
            vocabulary: self.vocabulary.name,
            input: input.trim().to_string(),
            suggestion: self.vocabulary.suggest(input),
        })?;
        if let Some(pos) = self.selected.iter().position(|l| *l == label) {
            self.selected.remove(pos);
            Ok(false)
        } else {
            self.selected.push(label);
            Ok(true)
        }
    }

    pub fn contains(&self, input: &str) -> bool {
        self.vocabulary
            .resolve(input)
            .map(|label| self.selected.contains(&label))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn vocabulary(&self) -> Vocabulary {
        self.vocabulary
    }

    pub fn labels(&self) -> Vec<String> {
        self.selected.iter().map(|label| label.to_string()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BiologicalSex {
    Male,
    Female,
    Intersex,
}

impl BiologicalSex {
    pub const ALL: [BiologicalSex; 3] = [Self::Male, Self::Female, Self::Intersex];

    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Intersex => "Intersex",
        }
    }
}

impl fmt::Display for BiologicalSex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BiologicalSex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sex| sex.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown biological sex `{}`", s.trim()))
    }
}

/// Wording of the lowest activity bucket. Two variants of the screen
/// disagree on it; the flow renders whichever one is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityFloor {
    #[default]
    Under30,
    Over30,
}

impl FromStr for ActivityFloor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "under30" | "<30" => Ok(Self::Under30),
            "over30" | ">30" => Ok(Self::Over30),
            other => Err(format!("unknown activity floor `{}`", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityLevel {
    Light,
    Moderate,
    Active,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 3] = [Self::Light, Self::Moderate, Self::Active];

    pub fn label(self, floor: ActivityFloor) -> &'static str {
        match (self, floor) {
            (Self::Light, ActivityFloor::Under30) => "<30 mins daily",
            (Self::Light, ActivityFloor::Over30) => ">30 mins daily",
            (Self::Moderate, _) => "30-60 mins daily",
            (Self::Active, _) => ">60 mins daily",
        }
    }

    /// Accepts either wording of the lowest bucket.
    pub fn parse(input: &str) -> Option<Self> {
        let needle = input.trim();
        Self::ALL.into_iter().find(|level| {
            level.label(ActivityFloor::Under30).eq_ignore_ascii_case(needle)
                || level.label(ActivityFloor::Over30).eq_ignore_ascii_case(needle)
        })
    }
}

/// Typed view of the accumulated parameter mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireRecord {
    pub dietary_restrictions: Vec<String>,
    /// Kilograms.
    pub weight: Option<f64>,
    /// Centimeters.
    pub height: Option<f64>,
    pub age: Option<u8>,
    pub biological_sex: Option<BiologicalSex>,
    pub physical_activity: Option<String>,
    pub health_conditions: Vec<String>,
}

impl QuestionnaireRecord {
    pub fn from_params(params: &Params) -> Self {
        Self {
            dietary_restrictions: codec::decode_list(
                codec::DIETARY_RESTRICTIONS,
                params.get(codec::DIETARY_RESTRICTIONS),
            ),
            weight: codec::decode_number(params.get(codec::WEIGHT)),
            height: codec::decode_number(params.get(codec::HEIGHT)),
            age: codec::decode_number(params.get(codec::AGE)),
            biological_sex: params
                .get(codec::BIOLOGICAL_SEX)
                .and_then(|raw| raw.parse().ok()),
            physical_activity: params
                .get(codec::PHYSICAL_ACTIVITY)
                .map(str::trim)
                .filter(|raw| !raw.is_empty())
                .map(str::to_string),
            health_conditions: codec::decode_list(
                codec::HEALTH_CONDITIONS,
                params.get(codec::HEALTH_CONDITIONS),
            ),
        }
    }

    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        params.insert(
            codec::DIETARY_RESTRICTIONS,
            codec::encode_list(&self.dietary_restrictions),
        );
        params.insert(codec::WEIGHT, codec::encode_measurement(self.weight));
        params.insert(codec::HEIGHT, codec::encode_measurement(self.height));
        params.insert(
            codec::AGE,
            self.age.map(|age| age.to_string()).unwrap_or_default(),
        );
        params.insert(
            codec::BIOLOGICAL_SEX,
            self.biological_sex
                .map(|sex| sex.label().to_string())
                .unwrap_or_default(),
        );
        params.insert(
            codec::PHYSICAL_ACTIVITY,
            self.physical_activity.clone().unwrap_or_default(),
        );
        params.insert(
            codec::HEALTH_CONDITIONS,
            codec::encode_list(&self.health_conditions),
        );
        params
    }
}

/// Completed questionnaire as handed to the terminal collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedQuestionnaire {
    pub id: Uuid,
    pub submitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: QuestionnaireRecord,
}

impl SubmittedQuestionnaire {
    pub fn new(record: QuestionnaireRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            submitted_at: Utc::now(),
            record,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_twice_restores_selection() {
        let mut set = SelectionSet::new(DIETARY_RESTRICTIONS);
        assert_eq!(set.toggle("Vegan"), Ok(true));
        assert_eq!(set.labels(), vec!["Vegan"]);
        assert_eq!(set.toggle("vegan"), Ok(false));
        assert!(set.is_empty());
    }

    #[test]
    fn toggle_rejects_unknown_label_with_suggestion() {
        let mut set = SelectionSet::new(HEALTH_CONDITIONS);
        let err = set.toggle("Anemai").unwrap_err();
        assert_eq!(err.suggestion, Some("Anemia"));
        assert!(set.is_empty());
    }

    #[test]
    fn from_labels_dedupes_and_drops_unknown() {
        let set = SelectionSet::from_labels(
            HEALTH_CONDITIONS,
            &["IBS", "ibs", "Scurvy", "Acne"],
        );
        assert_eq!(set.labels(), vec!["IBS", "Acne"]);
    }

    #[test]
    fn health_vocabulary_has_all_conditions() {
        assert_eq!(HEALTH_CONDITIONS.labels().len(), 26);
        assert_eq!(HEALTH_CONDITIONS.resolve("crohn's"), Some("Crohn's"));
    }

    #[test]
    fn activity_parse_accepts_both_floor_wordings() {
        assert_eq!(ActivityLevel::parse(">30 mins daily"), Some(ActivityLevel::Light));
        assert_eq!(ActivityLevel::parse("<30 mins daily"), Some(ActivityLevel::Light));
        assert_eq!(
            ActivityLevel::parse("30-60 mins daily"),
            Some(ActivityLevel::Moderate)
        );
        assert_eq!(ActivityLevel::parse("all day"), None);
    }

    #[test]
    fn record_reads_wire_mapping() {
        let mut params = Params::new();
        params.insert("dietaryRestrictions", r#"["Vegan"]"#);
        params.insert("weight", "68.0");
        params.insert("height", "");
        params.insert("age", "42");
        params.insert("biologicalSex", "Female");
        params.insert("physicalActivity", "30-60 mins daily");
        params.insert("healthConditions", r#"["IBS"]"#);

        let record = QuestionnaireRecord::from_params(&params);
        assert_eq!(record.weight, Some(68.0));
        assert_eq!(record.height, None);
        assert_eq!(record.age, Some(42));
        assert_eq!(record.biological_sex, Some(BiologicalSex::Female));
        assert_eq!(record.to_params(), params);
    }

    #[test]
    fn submitted_record_serializes_flat() {
        let submitted = SubmittedQuestionnaire::new(QuestionnaireRecord {
            age: Some(30),
            ..QuestionnaireRecord::default()
        });
        let json = serde_json::to_value(&submitted).unwrap();
        assert_eq!(json["age"], 30);
        assert!(json.get("submittedAt").is_some());
        assert!(json.get("record").is_none());
    }
}
