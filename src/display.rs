//! Terminal rendering for the command-line surface.

use crate::api_client::TestResponse;
use crate::fields::FieldCatalog;
use crate::filter::tokenizer::{Token, TokenKind};
use crate::session::SessionUpdate;
use crate::validate::{Highlight, Indicator, ServerStatus, Severity, ValidationResult};
use colored::{ColoredString, Colorize};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use similar::{ChangeTag, TextDiff};

pub fn create_styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.to_vec());
    table
}

fn kind_label(kind: TokenKind) -> ColoredString {
    let label = kind.to_string();
    match kind {
        TokenKind::Field => label.cyan(),
        TokenKind::Operator => label.yellow(),
        TokenKind::Value => label.green(),
        TokenKind::Logic => label.magenta(),
        TokenKind::Modifier => label.blue(),
        TokenKind::Parenthesis | TokenKind::Whitespace => label.normal(),
        TokenKind::Error => label.red().bold(),
    }
}

/// Token table, whitespace omitted
pub fn format_tokens(tokens: &[Token]) -> String {
    let mut table = create_styled_table(&["Kind", "Span", "Text", "Valid", "Suggestion"]);
    for token in tokens.iter().filter(|t| t.kind != TokenKind::Whitespace) {
        table.add_row(vec![
            Cell::new(kind_label(token.kind)),
            Cell::new(format!("{}..{}", token.start, token.end)),
            Cell::new(&token.text),
            Cell::new(if token.valid { "yes" } else { "no" }),
            Cell::new(token.suggestion.as_deref().unwrap_or("")),
        ]);
    }
    format!("{table}\n")
}

fn indicator_label(indicator: Indicator) -> ColoredString {
    match indicator {
        Indicator::Ok => "ok".green(),
        Indicator::Warning => "warning".yellow(),
        Indicator::Error => "error".red().bold(),
        Indicator::NotChecked => "not checked".dimmed(),
        Indicator::Unavailable => "unavailable".yellow(),
    }
}

/// Marker line placed under the expression: `^` for errors, `~` for warnings.
pub fn marker_line(text: &str, highlights: &[Highlight]) -> String {
    let width = text.chars().count() + 1;
    let mut marks = vec![' '; width];

    for highlight in highlights {
        let column = text.get(..highlight.start).map_or(0, |s| s.chars().count());
        let span = text
            .get(highlight.start..highlight.end)
            .map_or(0, |s| s.chars().count())
            .max(1);
        let mark = match highlight.severity {
            Severity::Error => '^',
            Severity::Warning => '~',
        };
        for slot in marks.iter_mut().skip(column).take(span) {
            // Errors win over warnings on overlap
            if *slot != '^' {
                *slot = mark;
            }
        }
    }

    marks.into_iter().collect::<String>().trim_end().to_string()
}

pub fn format_validation(text: &str, result: &ValidationResult) -> String {
    let mut out = String::new();

    out.push_str(&format!("  {text}\n"));
    if !result.highlights.is_empty() {
        out.push_str(&format!(
            "  {}\n",
            marker_line(text, &result.highlights).red()
        ));
    }
    out.push('\n');

    for (category, indicator) in result.indicators() {
        out.push_str(&format!(
            "{:<10} {}\n",
            format!("{category}:"),
            indicator_label(indicator)
        ));
    }

    if !result.highlights.is_empty() {
        out.push('\n');
    }
    for highlight in &result.highlights {
        let label = match highlight.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow(),
        };
        out.push_str(&format!(
            "{label} [{}..{}]: {}",
            highlight.start, highlight.end, highlight.message
        ));
        if let Some(suggestion) = &highlight.suggestion {
            out.push_str(&format!(" (suggestion: {})", suggestion.green()));
        }
        out.push('\n');
    }

    if let Some(server) = &result.server_validation {
        out.push('\n');
        match &server.status {
            ServerStatus::Confirmed => {
                out.push_str(&format!("Server: {}\n", "confirmed".green()));
            }
            ServerStatus::Rejected { error } => {
                out.push_str(&format!("Server: {} {error}\n", "rejected:".red().bold()));
            }
            ServerStatus::Unavailable { reason } => {
                out.push_str(&format!(
                    "Server: {} ({reason}); showing local validation only\n",
                    "unavailable".yellow()
                ));
            }
        }
        if let (Some(matched), Some(total)) = (server.matched_count, server.total_channels) {
            out.push_str(&format!("Matches: {matched} of {total} channels\n"));
        }
    }

    let verdict = if result.valid {
        "VALID".green().bold()
    } else {
        "INVALID".red().bold()
    };
    out.push_str(&format!("\nResult: {verdict}\n"));
    out
}

/// One line per session update, for the interactive `edit` loop
pub fn format_session_update(update: &SessionUpdate) -> String {
    let result = &update.result;
    let phase = if update.is_authoritative() {
        "server"
    } else {
        "local"
    };
    let state = if result.valid {
        "valid".green()
    } else {
        "invalid".red()
    };
    let mut line = format!("[#{} {phase}] {state}", update.generation);

    if !result.valid {
        line.push_str(&format!(" ({} error(s))", result.error_count()));
    }
    if let Some(server) = &result.server_validation {
        match &server.status {
            ServerStatus::Confirmed => {}
            ServerStatus::Rejected { error } => {
                line.push_str(&format!(": {error}"));
            }
            ServerStatus::Unavailable { reason } => {
                line.push_str(&format!(" (server unavailable: {reason})"));
            }
        }
        if let (Some(matched), Some(total)) = (server.matched_count, server.total_channels) {
            line.push_str(&format!(", {matched}/{total} matched"));
        }
    }
    line
}

/// Canonical text followed by a line diff against the input
pub fn format_normalization(input: &str, canonical: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("{canonical}\n"));

    if input == canonical {
        out.push_str(&format!("{}\n", "(already canonical)".dimmed()));
        return out;
    }

    out.push('\n');
    out.push_str(&compute_text_diff(input, canonical));
    out
}

/// Computes a colored line diff between two strings
pub fn compute_text_diff(before: &str, after: &str) -> String {
    let diff = TextDiff::from_lines(before, after);
    let mut result = String::new();

    for change in diff.iter_all_changes() {
        let line = change.to_string();
        let line = line.trim_end_matches('\n');
        match change.tag() {
            ChangeTag::Delete => {
                result.push_str(&format!("{}\n", format!("- {line}").red()));
            }
            ChangeTag::Insert => {
                result.push_str(&format!("{}\n", format!("+ {line}").green()));
            }
            ChangeTag::Equal => continue,
        }
    }

    result
}

pub fn format_fields(catalog: &FieldCatalog) -> String {
    let mut table = create_styled_table(&["Name", "Display name", "Type", "Nullable"]);
    for field in catalog.fields() {
        table.add_row(vec![
            Cell::new(&field.name),
            Cell::new(&field.display_name),
            Cell::new(&field.field_type),
            Cell::new(if field.nullable { "yes" } else { "no" }),
        ]);
    }
    format!("{table}\n")
}

pub fn format_test_response(response: &TestResponse) -> String {
    let mut out = String::new();

    if !response.is_valid {
        out.push_str(&format!(
            "{} {}\n",
            "Rejected:".red().bold(),
            response.error.as_deref().unwrap_or("no reason given")
        ));
        return out;
    }

    out.push_str(&format!(
        "Matched {} of {} channels\n",
        response.matched_count.to_string().green().bold(),
        response.total_channels
    ));
    for channel in &response.matching_channels {
        let name = channel
            .get("channel_name")
            .or_else(|| channel.get("name"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| channel.to_string());
        out.push_str(&format!("  {name}\n"));
    }
    out
}
