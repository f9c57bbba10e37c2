use std::fmt;
use std::io::{self, Write};
use std::time::Duration;

use crate::cases::TestCase;
use crate::client::{format_speed, tokens_per_second, RequestResult};

pub const PREVIEW_CHARS: usize = 60;
const SEPARATOR_WIDTH: usize = 50;
const TIMING_LOG: &str = "server_restart.log";

#[derive(Debug, Clone, PartialEq)]
pub struct CaseRecord {
    pub name: String,
    /// Rounded to two decimals, as displayed.
    pub tokens_per_second: f64,
    pub completion_tokens: u64,
    pub prompt_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub name: String,
    pub error: String,
}

/// Running totals over the successful cases of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeedReport {
    pub total_time_ms: u64,
    pub total_completion_tokens: u64,
    pub records: Vec<CaseRecord>,
    pub failures: Vec<FailureRecord>,
}

impl SpeedReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, case: &TestCase, result: &RequestResult) {
        self.total_time_ms += result.total_time_ms;
        self.total_completion_tokens += result.completion_tokens;
        self.records.push(CaseRecord {
            name: case.name.to_string(),
            tokens_per_second: displayed_speed(result.tokens_per_second()),
            completion_tokens: result.completion_tokens,
            prompt_tokens: result.prompt_tokens,
        });
    }

    pub fn record_failure(&mut self, case: &TestCase, error: impl Into<String>) {
        self.failures.push(FailureRecord {
            name: case.name.to_string(),
            error: error.into(),
        });
    }

    pub fn total_duration(&self) -> Duration {
        Duration::from_millis(self.total_time_ms)
    }

    /// Total completion tokens over total elapsed time, not a mean of per-case speeds.
    pub fn average_tokens_per_second(&self) -> f64 {
        tokens_per_second(self.total_completion_tokens, self.total_time_ms)
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_speed(displayed_speed(self.average_tokens_per_second()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Verdict {
    pub fn from_speed(tokens_per_second: f64) -> Self {
        if tokens_per_second > 30.0 {
            Verdict::Excellent
        } else if tokens_per_second > 20.0 {
            Verdict::Good
        } else if tokens_per_second > 15.0 {
            Verdict::Fair
        } else {
            Verdict::Poor
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Verdict::Excellent => "Excellent",
            Verdict::Good => "Good",
            Verdict::Fair => "Fair",
            Verdict::Poor => "Poor",
        }
    }

    pub fn advice(self) -> &'static str {
        match self {
            Verdict::Excellent => "Token generation is very fast (>30 tokens/sec)",
            Verdict::Good => "Token generation is at expected speed (20-30 tokens/sec)",
            Verdict::Fair => "Token generation is slightly slow (15-20 tokens/sec)",
            Verdict::Poor => "Token generation is slow (<15 tokens/sec) - may need optimization",
        }
    }

    fn marker(self) -> &'static str {
        match self {
            Verdict::Excellent | Verdict::Good => "✅",
            Verdict::Fair => "⚠️ ",
            Verdict::Poor => "❌",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.marker(), self.label(), self.advice())
    }
}

/// First [`PREVIEW_CHARS`] characters of `content` followed by an ellipsis.
///
/// The ellipsis is appended even when nothing was cut.
pub fn preview(content: &str) -> String {
    let head: String = content.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", head)
}

/// The two-decimal figure a reader sees, read back as a number.
fn displayed_speed(tokens_per_second: f64) -> f64 {
    format_speed(tokens_per_second)
        .parse()
        .unwrap_or(tokens_per_second)
}

pub fn write_banner<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "BitNet Token Generation Speed Test\n")?;
    writeln!(out, "==================================\n")
}

pub fn write_case_header<W: Write>(out: &mut W, case: &TestCase) -> io::Result<()> {
    writeln!(out, "Test: {}", case.name)?;
    writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))
}

pub fn write_case_result<W: Write>(out: &mut W, result: &RequestResult) -> io::Result<()> {
    writeln!(out, "Prompt tokens: {}", result.prompt_tokens)?;
    writeln!(out, "Completion tokens: {}", result.completion_tokens)?;
    writeln!(out, "Total time: {}ms", result.total_time_ms)?;
    writeln!(
        out,
        "Token generation speed: {} tokens/second",
        result.tokens_per_second_display()
    )?;
    writeln!(out, "Response preview: \"{}\"", preview(&result.content))?;
    writeln!(out, "\n")
}

pub fn write_case_error<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    writeln!(out, "Error in test: {}\n", message)
}

pub fn write_summary<W: Write>(out: &mut W, report: &SpeedReport) -> io::Result<()> {
    writeln!(out, "Overall Performance Summary")?;
    writeln!(out, "===========================\n")?;

    writeln!(
        out,
        "Total completion tokens generated: {}",
        report.total_completion_tokens
    )?;
    writeln!(
        out,
        "Total time: {:.2} seconds",
        report.total_duration().as_secs_f64()
    )?;
    writeln!(
        out,
        "Average token generation speed: {} tokens/second\n",
        format_speed(report.average_tokens_per_second())
    )?;

    writeln!(out, "Per-test breakdown:")?;
    for record in &report.records {
        writeln!(
            out,
            "- {}: {} tokens/sec ({} tokens)",
            record.name, record.tokens_per_second, record.completion_tokens
        )?;
    }

    writeln!(out, "\nPerformance Assessment:")?;
    writeln!(out, "{}", report.verdict())?;

    writeln!(
        out,
        "\nNote: Check {} for detailed per-token timing information",
        TIMING_LOG
    )
}
