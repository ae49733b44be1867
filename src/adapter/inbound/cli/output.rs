//! Terminal output for CLI handlers.
//!
//! Every printer honours JSON mode (one `{"type", "payload"}` object per
//! line on stdout) and quiet mode. Errors always go to stderr.

use std::fmt::Display;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use parking_lot::RwLock;
use serde_json::{json, Value};

/// Output mode selected by the global `--json` and `-q` flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    pub json: bool,
    pub quiet: bool,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(json: bool, quiet: bool) -> Self {
        Self { json, quiet }
    }

    /// Human-readable lines are printed unless quiet mode is on.
    const fn prints_text(self) -> bool {
        !self.json && !self.quiet
    }
}

static MODE: RwLock<OutputConfig> = RwLock::new(OutputConfig::new(false, false));

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

fn mode() -> OutputConfig {
    *MODE.read()
}

/// Apply the global flags. Call once, before any handler prints.
pub fn configure(config: OutputConfig) {
    *MODE.write() = config;
}

#[must_use]
pub fn is_json() -> bool {
    mode().json
}

#[must_use]
pub fn is_quiet() -> bool {
    mode().quiet
}

fn json_line(kind: &str, payload: Value) {
    println!("{}", json!({ "type": kind, "payload": payload }));
}

/// JSON line in JSON mode, otherwise `text` unless quiet.
fn emit(kind: &str, payload: Value, text: impl FnOnce()) {
    let mode = mode();
    if mode.json {
        json_line(kind, payload);
    } else if mode.prints_text() {
        text();
    }
}

/// Like [`emit`], but the text is printed in quiet mode too.
fn emit_always(kind: &str, payload: Value, text: impl FnOnce()) {
    if is_json() {
        json_line(kind, payload);
    } else {
        text();
    }
}

pub fn header(version: &str) {
    emit("header", json!({ "app": "oracle", "version": version }), || {
        println!("{} {}", "oracle".bold(), version.dimmed());
        println!();
    });
}

/// Labeled value, aligned with the other fields of a block.
pub fn field(label: &str, value: impl Display) {
    let value = value.to_string();
    emit("field", json!({ "label": label, "value": value }), || {
        println!("  {:<12} {}", label.dimmed(), value);
    });
}

pub fn section(title: &str) {
    emit("section", json!({ "title": title }), || {
        println!();
        println!("{}", title.bold());
    });
}

pub fn success(message: &str) {
    emit("success", json!({ "message": message }), || {
        println!("  {} {}", "✓".green(), message);
    });
}

pub fn warning(message: &str) {
    emit_always("warning", json!({ "message": message }), || {
        println!("  {} {}", "⚠".yellow(), message);
    });
}

/// Error line on stderr, in every mode.
pub fn error(message: &str) {
    if is_json() {
        eprintln!("{}", json!({ "type": "error", "payload": { "message": message } }));
    } else {
        eprintln!("  {} {}", "×".red(), message);
    }
}

pub fn note(message: &str) {
    emit("note", json!({ "message": message }), || {
        println!("  {}", message.dimmed());
    });
}

pub fn hint(message: &str) {
    emit("hint", json!({ "message": message }), || {
        println!("  {}: {}", "hint".cyan().dimmed(), message.dimmed());
    });
}

/// Indented block, e.g. a rendered table.
pub fn lines(content: &str) {
    emit("lines", json!({ "content": content }), || {
        for line in content.lines() {
            println!("  {line}");
        }
    });
}

/// Value in cyan; plain in JSON mode.
pub fn highlight(value: impl Display) -> String {
    let value = value.to_string();
    if is_json() {
        value
    } else {
        value.cyan().to_string()
    }
}

/// Print a command's whole result as one JSON document.
pub fn json_output(value: Value) {
    println!("{value}");
}

/// Steady spinner for a slow call. Hidden in JSON and quiet mode.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = if mode().prints_text() {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_strings(SPINNER_FRAMES)
            .template("  {spinner:.cyan} {msg}")
        {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    } else {
        ProgressBar::hidden()
    };
    pb.set_message(message.to_string());
    pb
}

pub fn spinner_success(pb: &ProgressBar, message: &str) {
    finish(pb, "spinner_success", message, "✓".green().to_string(), false);
}

/// Failure mark. Shown in quiet mode too.
pub fn spinner_fail(pb: &ProgressBar, message: &str) {
    finish(pb, "spinner_fail", message, "×".red().to_string(), true);
}

fn finish(pb: &ProgressBar, kind: &str, message: &str, mark: String, always: bool) {
    let mode = mode();
    if mode.json {
        json_line(kind, json!({ "message": message }));
        pb.finish_and_clear();
    } else if mode.quiet && !always {
        pb.finish_and_clear();
    } else {
        pb.finish_with_message(format!("{mark} {message}"));
    }
}
