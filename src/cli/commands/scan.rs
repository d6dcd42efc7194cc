use std::fs;
use std::path::Path;

use crate::cli::commands::CommandDefinition;
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output;
use crate::nutrition::{parse_analysis, ScanPayload, ScanResponse, ScanResult};

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "scan",
            "Send a barcode or food photo for analysis",
            "scan <barcode <code>|image <path>>",
            cmd_scan,
        ),
        CommandDefinition::new(
            "analyze",
            "Render a saved analysis text or service response",
            "analyze <file>",
            cmd_analyze,
        ),
    ]
}

pub(crate) fn render_result(result: &ScanResult) {
    output::section(&result.title);
    if let Some(rating) = &result.rating {
        match rating.score {
            Some(score) => io::print_info(format!("Rating: {}/5 {}", score, rating.phrase)),
            None => io::print_info(format!("Rating: {}", rating.phrase)),
        }
    }
    if let Some(info) = &result.nutrition_info {
        for line in info.lines().filter(|line| !line.trim().is_empty()) {
            io::print_info(format!("  {}", line.trim()));
        }
    }
    if result.report.is_empty() {
        io::print_warning("No benefits or risks were listed for this item.");
    }
    for line in result.report.render_lines() {
        output::plain(line);
    }
}

/// Reads either a raw service response (JSON) or the bare analysis text.
fn load_result(path: &Path) -> Result<ScanResult, CommandError> {
    let text = fs::read_to_string(path)?;
    if let Ok(response) = serde_json::from_str::<ScanResponse>(&text) {
        return Ok(ScanResult::from(response));
    }
    Ok(ScanResult {
        title: path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Analysis".into()),
        nutrition_info: None,
        report: parse_analysis(&text),
        rating: None,
    })
}

fn cmd_analyze(_context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let path = args
        .first()
        .ok_or_else(|| CommandError::InvalidArguments("Usage: analyze <file>".into()))?;
    let result = load_result(Path::new(path))?;
    render_result(&result);
    Ok(())
}

fn cmd_scan(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let payload = match args {
        ["barcode", code] => ScanPayload::Barcode(code.to_string()),
        ["image", path] => ScanPayload::Image(fs::read(path)?),
        _ => {
            return Err(CommandError::InvalidArguments(
                "Usage: scan barcode <code> | scan image <path>".into(),
            ))
        }
    };
    io::print_info(format!("Analyzing {}...", payload.kind()));
    let result = context.scan(payload)?;
    render_result(&result);
    Ok(())
}
