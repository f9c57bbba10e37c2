/// One prompt and token budget exercised once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestCase {
    /// Label shown in progress output and the per-test breakdown.
    pub name: &'static str,
    pub prompt: &'static str,
    /// Upper bound on generated tokens, sent as `max_tokens`.
    pub max_tokens: u32,
}

/// The speed battery, run in this order from shortest to longest budget.
pub const SPEED_TESTS: &[TestCase] = &[
    TestCase {
        name: "Short Generation (20 tokens)",
        prompt: "Write a haiku about technology.",
        max_tokens: 20,
    },
    TestCase {
        name: "Medium Generation (50 tokens)",
        prompt: "Explain what machine learning is in simple terms.",
        max_tokens: 50,
    },
    TestCase {
        name: "Long Generation (100 tokens)",
        prompt: "Tell me a story about a robot who learns to paint.",
        max_tokens: 100,
    },
    TestCase {
        name: "Very Long Generation (200 tokens)",
        prompt: "Write a detailed explanation of how neural networks work, \
                 including the mathematics behind backpropagation.",
        max_tokens: 200,
    },
];
