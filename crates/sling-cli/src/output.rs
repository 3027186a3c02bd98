//! Console formatting.
//!
//! Formatting helpers are pure: they take a [`Style`] and return a `String`.
//! Only [`ConsoleSink`] writes to the terminal.

use std::io::{IsTerminal, Write};

use sling_remote::{OutputSink, OutputStream, PipelineError, PipelineResult, Stage, StageResult};

/// Lines of captured stderr shown for a failed stage.
const FAILURE_TAIL_LINES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    color: bool,
}

impl Style {
    /// Colour only when stdout is a terminal.
    pub fn detect() -> Self {
        Self {
            color: std::io::stdout().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    fn paint(self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_owned()
        }
    }

    pub fn bold(self, text: &str) -> String {
        self.paint("1", text)
    }

    pub fn green(self, text: &str) -> String {
        self.paint("32", text)
    }

    pub fn red(self, text: &str) -> String {
        self.paint("31", text)
    }

    pub fn dim(self, text: &str) -> String {
        self.paint("2", text)
    }
}

pub fn stage_header(style: Style, index: usize, total: usize, stage: &Stage) -> String {
    format!(
        "{} {}\n    {}",
        style.bold(&format!("[{index}/{total}]")),
        stage.label,
        style.dim(&stage.describe())
    )
}

pub fn stage_footer(style: Style, result: &StageResult) -> String {
    let secs = format!("{:.1}s", result.elapsed.as_secs_f64());
    if result.success {
        format!("    {} ({secs})", style.green("ok"))
    } else {
        format!("    {} ({secs})", style.red("failed"))
    }
}

/// Human-readable account of why a pipeline did not finish.
pub fn failure_report(style: Style, result: &PipelineResult, total: usize) -> String {
    let Some(failure) = &result.failure else {
        return String::new();
    };

    let mut lines = Vec::new();
    match failure {
        PipelineError::Stage { index, label, .. } => {
            lines.push(style.red(&format!("Stage {index}/{total} ({label}) failed")));
        }
        PipelineError::Connect { target, .. } => {
            lines.push(style.red(&format!("Could not open a session to {target}; no stages ran")));
        }
        PipelineError::Plan(_) => {
            lines.push(style.red("Deployment plan is invalid; nothing was run"));
        }
    }

    let mut source: Option<&dyn std::error::Error> = Some(failure);
    while let Some(err) = source {
        lines.push(format!("  caused by: {err}"));
        source = err.source();
    }

    if let Some(stage) = failure
        .stage_index()
        .and_then(|i| result.stages.iter().find(|s| s.index == i))
    {
        let tail = stage.stderr_tail(FAILURE_TAIL_LINES);
        if !tail.is_empty() {
            lines.push("  stderr:".to_owned());
            lines.extend(tail.lines().map(|l| format!("    {l}")));
        }
    }

    lines.join("\n")
}

/// Streams remote output to the terminal as it arrives.
pub struct ConsoleSink {
    style: Style,
}

impl ConsoleSink {
    pub fn new(style: Style) -> Self {
        Self { style }
    }
}

impl OutputSink for ConsoleSink {
    fn output(&mut self, stream: OutputStream, chunk: &[u8]) {
        // Write failures are ignored.
        let _ =match stream {
            OutputStream::Stdout => {
                let mut out = std::io::stdout().lock();
                out.write_all(chunk).and_then(|()| out.flush())
            }
            OutputStream::Stderr => {
                let mut err = std::io::stderr().lock();
                err.write_all(chunk).and_then(|()| err.flush())
            }
        };
    }

    fn stage_started(&mut self, index: usize, total: usize, stage: &Stage) {
        println!("{}", stage_header(self.style, index, total, stage));
    }

    fn stage_finished(&mut self, result: &StageResult) {
        println!("{}", stage_footer(self.style, result));
    }
}
