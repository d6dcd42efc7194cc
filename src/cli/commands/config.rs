use crate::cli::commands::CommandDefinition;
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;

const FLOW_KEYS: [&str; 3] = ["terminal", "activity_floor", "default_age"];

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "config",
        "Show or change persisted settings",
        "config <show|set <key> <value>>",
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] | ["show"] => {
            show_config(context);
            Ok(())
        }
        ["set", key, value @ ..] if !value.is_empty() => set_config(context, key, &value.join(" ")),
        _ => {
            context.print_usage("config");
            Err(CommandError::InvalidArguments(
                "Usage: config show | config set <key> <value>".into(),
            ))
        }
    }
}

fn show_config(context: &ShellContext) {
    let config = &context.config;
    output_section("Configuration");
    io::print_info(format!("  nutrition_endpoint   : {}", config.nutrition_endpoint));
    io::print_info(format!("  terminal             : {}", config.terminal));
    io::print_info(format!("  activity_floor       : {:?}", config.activity_floor));
    io::print_info(format!("  default_age          : {}", config.default_age));
    io::print_info(format!("  export_records       : {}", config.export_records));
    io::print_info(format!("  request_timeout_secs : {}", config.request_timeout_secs));
    io::print_info(format!(
        "  file                 : {}",
        context.config_manager.path().display()
    ));
}

fn set_config(context: &mut ShellContext, key: &str, value: &str) -> CommandResult {
    let mut updated = context.config.clone();
    updated.set(key, value)?;
    context.config = updated;
    context.persist_config()?;
    io::print_success(format!("Updated `{}`.", key));
    if FLOW_KEYS.contains(&key) || key == "export_records" {
        io::print_info("Use `restart` to apply this to the onboarding flow.");
    }
    Ok(())
}
