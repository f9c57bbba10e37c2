use std::io::Write;

use anyhow::Result;

use crate::cases::{TestCase, SPEED_TESTS};
use crate::client::{CompletionBackend, SpeedClient};
use crate::config::BenchmarkConfig;
use crate::report::{
    write_banner, write_case_error, write_case_header, write_case_result, write_summary,
    SpeedReport,
};

/// Runs the standard battery against `config.endpoint`.
///
/// The report goes to `out`; per-case failures go to `err`.
pub async fn run_speed_test<W: Write, E: Write>(
    config: BenchmarkConfig,
    out: &mut W,
    err: &mut E,
) -> Result<SpeedReport> {
    tracing::info!(
        endpoint = %config.endpoint,
        cases = SPEED_TESTS.len(),
        "starting speed test"
    );
    let client = SpeedClient::new(config)?;
    run_speed_tests(&client, SPEED_TESTS, out, err).await
}

/// Runs `cases` one after another; a failed case is reported and skipped.
///
/// Each request is awaited to completion before the next is sent so that
/// generation for one case never overlaps the timing of another.
pub async fn run_speed_tests<B, W, E>(
    backend: &B,
    cases: &[TestCase],
    out: &mut W,
    err: &mut E,
) -> Result<SpeedReport>
where
    B: CompletionBackend + ?Sized,
    W: Write,
    E: Write,
{
    write_banner(out)?;

    let mut report = SpeedReport::new();
    for case in cases {
        write_case_header(out, case)?;

        match backend.complete(case.prompt, case.max_tokens).await {
            Ok(result) => {
                tracing::debug!(
                    case = case.name,
                    total_time_ms = result.total_time_ms,
                    prompt_tokens = result.prompt_tokens,
                    completion_tokens = result.completion_tokens,
                    "speed test completed"
                );
                write_case_result(out, &result)?;
                report.record_success(case, &result);
            }
            Err(error) => {
                let message = error.to_string();
                tracing::warn!(case = case.name, error = %message, "speed test failed");
                write_case_error(err, &message)?;
                report.record_failure(case, message);
            }
        }
    }

    write_summary(out, &report)?;
    out.flush()?;
    err.flush()?;

    Ok(report)
}
