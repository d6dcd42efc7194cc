use std::collections::HashMap;

use strsim::levenshtein;

pub mod config;
pub mod onboarding;
pub mod scan;
pub mod system;

use crate::cli::context::{CommandResult, ShellContext};

pub(crate) fn all_definitions() -> Vec<CommandDefinition> {
    let mut commands = Vec::new();
    commands.extend(onboarding::definitions());
    commands.extend(scan::definitions());
    commands.extend(config::definitions());
    commands.extend(system::definitions());
    commands
}

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandDefinition {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }
}

/// Largest edit distance still offered as a "did you mean".
const SUGGESTION_DISTANCE: usize = 3;

/// Commands keyed by name, listed in registration order.
pub struct CommandRegistry {
    by_name: HashMap<&'static str, CommandDefinition>,
    listing: Vec<&'static str>,
}

impl CommandRegistry {
    pub fn new(definitions: Vec<CommandDefinition>) -> Self {
        let listing = definitions.iter().map(|entry| entry.name).collect();
        let by_name = definitions
            .into_iter()
            .map(|entry| (entry.name, entry))
            .collect();
        Self { by_name, listing }
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.by_name.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.listing
            .iter()
            .filter_map(move |name| self.by_name.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.listing.iter().copied()
    }

    /// Closest registered name to a mistyped command.
    pub fn closest(&self, input: &str) -> Option<&'static str> {
        let needle = input.to_lowercase();
        self.names()
            .map(|name| (levenshtein(name, &needle), name))
            .min_by_key(|(distance, _)| *distance)
            .filter(|(distance, _)| *distance <= SUGGESTION_DISTANCE)
            .map(|(_, name)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_keeps_definition_order() {
        let registry = CommandRegistry::new(all_definitions());
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names.first(), Some(&"show"));
        assert_eq!(names.last(), Some(&"exit"));
        assert!(registry.get("scan").is_some());
        assert_eq!(names.len(), registry.iter().count());
    }

    #[test]
    fn closest_name_within_distance() {
        let registry = CommandRegistry::new(all_definitions());
        assert_eq!(registry.closest("nxt"), Some("next"));
        assert_eq!(registry.closest("ROUTE"), Some("route"));
        assert_eq!(registry.closest("questionnaire"), None);
    }
}
