use std::collections::HashMap;

/// Closed classification of a failure, used to select a retry strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    RateLimit,
    Timeout,
    Network,
    ApiError,
    TokenLimit,
    Unknown,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorType::RateLimit => "rate_limit",
            ErrorType::Timeout => "timeout",
            ErrorType::Network => "network",
            ErrorType::ApiError => "api_error",
            ErrorType::TokenLimit => "token_limit",
            ErrorType::Unknown => "unknown",
        };
        write!(f, "{label}")
    }
}

/// Classify a raw error message by case-insensitive substring match.
/// First match wins, in priority order: rate limit, timeout, network,
/// API error. Anything else is unknown.
pub fn classify_error(raw: &str) -> ErrorType {
    const TABLE: &[(ErrorType, &[&str])] = &[
        (ErrorType::RateLimit, &["rate limit", "429"]),
        (ErrorType::Timeout, &["timeout", "timed out"]),
        (
            ErrorType::Network,
            &["network", "econnreset", "enotfound", "econnrefused"],
        ),
        (ErrorType::ApiError, &["api error", "bad request", "invalid"]),
    ];

    let lower = raw.to_lowercase();
    for (kind, needles) in TABLE {
        if needles.iter().any(|needle| lower.contains(needle)) {
            return *kind;
        }
    }
    ErrorType::Unknown
}

/// Fixed retry parameters for one error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryStrategy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub should_retry: bool,
}

/// Lookup table keyed by error type. Token-limit failures are never
/// retried: a larger input will not fit on retry.
pub fn retry_strategy(kind: ErrorType) -> RetryStrategy {
    match kind {
        ErrorType::RateLimit => RetryStrategy {
            max_attempts: 5,
            base_delay_ms: 5000,
            should_retry: true,
        },
        ErrorType::Timeout | ErrorType::Network => RetryStrategy {
            max_attempts: 3,
            base_delay_ms: 2000,
            should_retry: true,
        },
        ErrorType::TokenLimit => RetryStrategy {
            max_attempts: 0,
            base_delay_ms: 0,
            should_retry: false,
        },
        ErrorType::ApiError | ErrorType::Unknown => RetryStrategy {
            max_attempts: 2,
            base_delay_ms: 1000,
            should_retry: true,
        },
    }
}

/// Backoff ceiling: 5 minutes.
pub const MAX_BACKOFF_MS: u64 = 300_000;

/// Exponential backoff: `base * 2^attempt`, clamped to [`MAX_BACKOFF_MS`].
/// A zero base yields zero for any attempt.
pub fn calculate_backoff_delay(attempt: u32, base_delay_ms: u64) -> u64 {
    if base_delay_ms == 0 {
        return 0;
    }
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    base_delay_ms.saturating_mul(factor).min(MAX_BACKOFF_MS)
}

/// Per-run retry configuration. `per_error_max_attempts` overrides the
/// attempt cap for specific error types; other types fall back to
/// `max_attempts`.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub per_error_max_attempts: HashMap<ErrorType, u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let per_error_max_attempts = [
            ErrorType::RateLimit,
            ErrorType::Timeout,
            ErrorType::Network,
            ErrorType::ApiError,
            ErrorType::TokenLimit,
            ErrorType::Unknown,
        ]
        .into_iter()
        .map(|kind| (kind, retry_strategy(kind).max_attempts))
        .collect();

        RetryConfig {
            max_attempts: 3,
            per_error_max_attempts,
        }
    }
}

/// Whether attempt number `attempt` (0-based) should be retried for the
/// given error type. Non-retryable types short-circuit to `false`.
pub fn should_retry(attempt: u32, kind: ErrorType, config: &RetryConfig) -> bool {
    if !retry_strategy(kind).should_retry {
        return false;
    }
    let cap = config
        .per_error_max_attempts
        .get(&kind)
        .copied()
        .unwrap_or(config.max_attempts);
    attempt < cap
}
