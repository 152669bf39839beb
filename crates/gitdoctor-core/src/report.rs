//! Output conventions for conclusions and evidence.
//!
//! Primary conclusions go to stdout and are colored when stdout is an
//! interactive terminal: red for problems, blue for good news.
//! Supporting material — evidence lines, remedy advice, command echoes —
//! goes to stderr; advice is word-wrapped, and nothing on stderr is ever
//! colored except the dimmed command echo.

use console::style;

use crate::diagnose::Finding;

/// Column width advice text is wrapped to.
pub const WRAP_COLUMNS: usize = 72;

/// Print a headline conclusion on stdout.
pub fn conclude(message: &str, positive: bool) {
    let line = format!("doctor: {message}");
    let styled = if positive {
        style(line).blue()
    } else {
        style(line).red()
    };
    println!("{}", styled.for_stdout());
}

/// Print one evidence line on stderr.
pub fn note(message: &str) {
    eprintln!("{message}");
}

/// Print remedy advice on stderr, wrapped to [`WRAP_COLUMNS`].
pub fn supplement(text: &str) {
    for line in wrap(text, WRAP_COLUMNS) {
        eprintln!("{line}");
    }
}

/// Echo a command about to run, dimmed, on stderr.
pub fn echo_command(line: &str) {
    eprintln!("{}", style(format!("$ {line}")).dim().for_stderr());
}

/// Report one finding: evidence first, then the conclusion and its advice.
pub fn emit(finding: &Finding) {
    for item in &finding.evidence {
        note(item);
    }
    conclude(&finding.message, false);
    supplement(&finding.supplement);
}

/// Greedy word wrap. Words longer than the width stay unbroken on a line
/// of their own.
fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > columns {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Humanize a byte count: `1536` becomes `1.5 KiB`.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
