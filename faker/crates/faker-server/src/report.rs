use colored::Colorize;

use crate::assembly::ValidationErrors;

/// Where a report ends up, which decides how it is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// Printed to the operator's terminal before the process exits.
    Fatal,
    /// Sent back to the editor that submitted the SDL.
    Recoverable,
}

/// Renders every validation error as a block: the message line, emphasized in
/// fatal mode, followed by its location and source excerpt.
pub fn report(errors: &ValidationErrors, mode: ReportMode) -> String {
    let mut out = match errors.len() {
        1 => String::from("Your schema contains a validation error:"),
        count => format!("Your schema contains {count} validation errors:"),
    };

    if mode == ReportMode::Fatal {
        out = out.red().to_string();
    }

    for error in errors.iter() {
        out.push_str("\n\n");

        match mode {
            ReportMode::Fatal => out.push_str(&error.message().yellow().bold().to_string()),
            ReportMode::Recoverable => out.push_str(error.message()),
        }

        if let Some(detail) = error.detail() {
            out.push('\n');
            out.push_str(&detail);
        }
    }

    out
}
