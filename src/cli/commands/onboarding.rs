use crate::cli::commands::CommandDefinition;
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output;
use crate::questionnaire::{
    units::{self, HeightUnit, WeightUnit},
    FlowEvent, OnboardingSession, Params, StepAction, StepKind,
};

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("show", "Show the current onboarding step", "show", cmd_show),
        CommandDefinition::new(
            "toggle",
            "Toggle an option on a multi-select step",
            "toggle <label|number>",
            cmd_toggle,
        ),
        CommandDefinition::new(
            "select",
            "Pick the single option on the current step",
            "select <label|number>",
            cmd_select,
        ),
        CommandDefinition::new(
            "weight",
            "Enter weight in the displayed unit",
            "weight <value>",
            cmd_weight,
        ),
        CommandDefinition::new(
            "height",
            "Enter height in the displayed unit",
            "height <value>",
            cmd_height,
        ),
        CommandDefinition::new(
            "unit",
            "Switch the displayed unit",
            "unit <weight|height>",
            cmd_unit,
        ),
        CommandDefinition::new("age", "Set age (clamped to 1-99)", "age <years>", cmd_age),
        CommandDefinition::new("next", "Continue to the next step", "next", cmd_next),
        CommandDefinition::new("back", "Return to the previous step", "back", cmd_back),
        CommandDefinition::new(
            "params",
            "Print the parameters the next step would receive",
            "params",
            cmd_params,
        ),
        CommandDefinition::new(
            "route",
            "Enter the flow at a step with a parameter mapping",
            "route <step> [json-object]",
            cmd_route,
        ),
        CommandDefinition::new(
            "restart",
            "Start the questionnaire over",
            "restart",
            cmd_restart,
        ),
        CommandDefinition::new(
            "convert",
            "Convert a measurement between units",
            "convert <value> <kg|lbs|cm|in>",
            cmd_convert,
        ),
    ]
}

fn joined(args: &[&str]) -> Option<String> {
    let text = args.join(" ");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn usage(name: &str, usage: &str) -> CommandError {
    CommandError::InvalidArguments(format!("Usage: {} {}", name, usage))
}

pub(crate) fn print_step(context: &ShellContext) {
    let session = &context.session;
    if session.is_finished() {
        output::section("Home");
        match context.sink.home.latest() {
            Some(latest) => io::print_info(format!(
                "Onboarding submitted at {}.",
                latest.submitted_at.format("%Y-%m-%d %H:%M UTC")
            )),
            None => io::print_info("Onboarding submitted."),
        }
        return;
    }

    let (index, total) = session.position();
    let step = session.current();
    output::section(format!("Step {}/{}: {}", index, total, step.kind().title()));
    for (number, option) in step.options().iter().enumerate() {
        io::print_info(format!("  {:>2}. {}", number + 1, option));
    }
    for (field, value) in step.summary() {
        io::print_info(format!("  {}: {}", field, value));
    }
    if !session.can_advance() {
        io::print_warning("Make a selection to continue.");
    }
}

fn print_summary(context: &ShellContext) {
    for (field, value) in context.session.current().summary() {
        io::print_success(format!("{}: {}", field, value));
    }
}

fn apply(context: &mut ShellContext, action: StepAction) -> CommandResult {
    context.session.apply(action)?;
    print_summary(context);
    Ok(())
}

fn cmd_show(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    print_step(context);
    Ok(())
}

fn cmd_toggle(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let label = joined(args).ok_or_else(|| usage("toggle", "<label|number>"))?;
    apply(context, StepAction::Toggle(label))
}

fn cmd_select(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let label = joined(args).ok_or_else(|| usage("select", "<label|number>"))?;
    apply(context, StepAction::Select(label))
}

fn cmd_weight(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let value = args.first().ok_or_else(|| usage("weight", "<value>"))?;
    apply(context, StepAction::SetWeight(value.to_string()))
}

fn cmd_height(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let value = args.first().ok_or_else(|| usage("height", "<value>"))?;
    apply(context, StepAction::SetHeight(value.to_string()))
}

fn cmd_unit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let action = match args.first().map(|arg| arg.to_ascii_lowercase()).as_deref() {
        Some("weight") => StepAction::ToggleWeightUnit,
        Some("height") => StepAction::ToggleHeightUnit,
        _ => return Err(usage("unit", "<weight|height>")),
    };
    apply(context, action)
}

fn cmd_age(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let years = args
        .first()
        .and_then(|arg| arg.trim().parse::<i64>().ok())
        .ok_or_else(|| CommandError::InvalidArguments("Age must be a whole number".into()))?;
    apply(context, StepAction::SetAge(years))
}

fn cmd_next(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    match context.session.next(&mut context.sink)? {
        FlowEvent::Advanced(_) => print_step(context),
        FlowEvent::Blocked(_) => io::print_warning("Make a selection to continue."),
        FlowEvent::Submitted(submission) => {
            io::print_success("Questionnaire submitted.");
            if let Some(export) = context.sink.export.as_ref() {
                io::print_info(format!(
                    "Record saved to {}",
                    export.path_for(&submission).display()
                ));
            }
            output::plain(serde_json::to_string_pretty(&submission.record)?);
        }
        FlowEvent::Finished => {
            io::print_warning("Onboarding already submitted. Use `restart` to begin again.")
        }
        FlowEvent::Returned(_) | FlowEvent::AtStart => {}
    }
    Ok(())
}

fn cmd_back(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    match context.session.back() {
        FlowEvent::Returned(_) => print_step(context),
        FlowEvent::AtStart => io::print_warning("Already at the first step."),
        FlowEvent::Finished => {
            io::print_warning("Onboarding already submitted. Use `restart` to begin again.")
        }
        _ => {}
    }
    Ok(())
}

fn cmd_params(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output::plain(context.session.snapshot().to_json());
    Ok(())
}

fn cmd_route(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let slug = args
        .first()
        .ok_or_else(|| usage("route", "<step> [json-object]"))?;
    let kind = StepKind::from_slug(slug).ok_or_else(|| {
        let known: Vec<_> = StepKind::ALL.iter().map(|kind| kind.slug()).collect();
        CommandError::InvalidArguments(format!(
            "Unknown step `{}`. Steps: {}",
            slug,
            known.join(", ")
        ))
    })?;
    let params = match args.get(1) {
        Some(raw) => Params::from_json(raw)
            .map_err(|err| CommandError::InvalidArguments(err.to_string()))?,
        None => Params::new(),
    };
    context.session = OnboardingSession::enter_at(context.config.sequencer(), kind, params)?;
    print_step(context);
    Ok(())
}

fn cmd_restart(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.restart_session();
    io::print_success("Started a new onboarding session.");
    print_step(context);
    Ok(())
}

fn cmd_convert(_context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [value, unit] = args else {
        return Err(usage("convert", "<value> <kg|lbs|cm|in>"));
    };
    if value.trim().parse::<f64>().map_or(true, |v| !v.is_finite()) {
        return Err(CommandError::InvalidArguments(format!(
            "`{}` is not a number",
            value
        )));
    }
    let line = match unit.to_ascii_lowercase().as_str() {
        "kg" => weight_line(value, WeightUnit::Kg),
        "lbs" | "lb" => weight_line(value, WeightUnit::Lbs),
        "cm" => height_line(value, HeightUnit::Cm),
        "in" => height_line(value, HeightUnit::In),
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "Unknown unit `{}`; expected kg, lbs, cm or in",
                other
            )))
        }
    };
    output::plain(line);
    Ok(())
}

fn weight_line(value: &str, from: WeightUnit) -> String {
    format!(
        "{} {} = {} {}",
        value.trim(),
        from,
        units::toggle_weight_display(value, from),
        from.toggled()
    )
}

fn height_line(value: &str, from: HeightUnit) -> String {
    format!(
        "{} {} = {} {}",
        value.trim(),
        from,
        units::toggle_height_display(value, from),
        from.toggled()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::context::CliMode;
    use crate::config::ConfigManager;
    use crate::questionnaire::flow::HydrationPhase;
    use tempfile::TempDir;

    fn context(temp: &TempDir) -> ShellContext {
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        ShellContext::with_manager(CliMode::Script, manager).unwrap()
    }

    #[test]
    fn toggle_and_next_forward_selection() {
        let temp = TempDir::new().unwrap();
        let mut context = context(&temp);
        cmd_toggle(&mut context, &["Vegan"]).unwrap();
        cmd_next(&mut context, &[]).unwrap();
        assert_eq!(context.session.current_kind(), StepKind::WeightHeight);
        assert_eq!(
            context.session.current_frame().received().get("dietaryRestrictions"),
            Some(r#"["Vegan"]"#)
        );
    }

    #[test]
    fn route_enters_hydrated_step() {
        let temp = TempDir::new().unwrap();
        let mut context = context(&temp);
        cmd_route(&mut context, &["age", r#"{"age":"120"}"#]).unwrap();
        assert_eq!(context.session.current_kind(), StepKind::Age);
        assert_eq!(context.session.current_frame().phase(), HydrationPhase::Hydrated);
        assert_eq!(context.session.snapshot().get("age"), Some("99"));
    }

    #[test]
    fn route_rejects_unknown_step_and_bad_json() {
        let temp = TempDir::new().unwrap();
        let mut context = context(&temp);
        assert!(matches!(
            cmd_route(&mut context, &["home"]),
            Err(CommandError::InvalidArguments(_))
        ));
        assert!(matches!(
            cmd_route(&mut context, &["age", "[1,2]"]),
            Err(CommandError::InvalidArguments(_))
        ));
        assert_eq!(context.session.current_kind(), StepKind::DietaryRestrictions);
    }

    #[test]
    fn age_requires_whole_number() {
        let temp = TempDir::new().unwrap();
        let mut context = context(&temp);
        cmd_route(&mut context, &["age"]).unwrap();
        assert!(cmd_age(&mut context, &["old"]).is_err());
        cmd_age(&mut context, &["-4"]).unwrap();
        assert_eq!(context.session.snapshot().get("age"), Some("1"));
    }

    #[test]
    fn convert_checks_arguments() {
        let temp = TempDir::new().unwrap();
        let mut context = context(&temp);
        assert!(cmd_convert(&mut context, &["150", "lbs"]).is_ok());
        assert!(cmd_convert(&mut context, &["150"]).is_err());
        assert!(cmd_convert(&mut context, &["abc", "kg"]).is_err());
        assert!(cmd_convert(&mut context, &["150", "stone"]).is_err());
        assert_eq!(weight_line("150", WeightUnit::Lbs), "150 lbs = 68 kg");
        assert_eq!(height_line("70", HeightUnit::In), "70 in = 178 cm");
    }
}
