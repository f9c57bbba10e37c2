mod cases;
mod client;
mod config;
mod report;
mod runner;

pub use cases::{TestCase, SPEED_TESTS};
pub use client::{
    format_speed, tokens_per_second, ChatCompletionRequest, ChatCompletionResponse, ChatMessage,
    Choice, ChoiceMessage, CompletionBackend, RequestError, RequestResult, SpeedClient, Usage,
    DEFAULT_MAX_TOKENS, TEMPERATURE, TOP_P,
};
pub use config::{BenchmarkConfig, DEFAULT_ENDPOINT};
pub use report::{preview, CaseRecord, FailureRecord, SpeedReport, Verdict, PREVIEW_CHARS};
pub use runner::{run_speed_test, run_speed_tests};
