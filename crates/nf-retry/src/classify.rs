use crate::RetryError;

/// Classify an HTTP response as retryable or not.
///
/// 429/500/502/503/504 are retryable; 400/401/403/404/422 are not; any
/// other status defaults to retryable (most unknown failures at the HTTP
/// layer are transient).
pub fn classify_http_error(status_code: u16, message: impl Into<String>) -> RetryError {
    let message = message.into();
    let detail = if message.is_empty() {
        format!("HTTP {status_code}")
    } else {
        format!("HTTP {status_code}: {message}")
    };

    match status_code {
        429 | 500 | 502 | 503 | 504 => RetryError::Retryable(detail),
        400 | 401 | 403 | 404 | 422 => RetryError::NonRetryable(detail),
        _ => RetryError::Retryable(detail),
    }
}

/// Classify an OpenAI error message. Substring matching is case-insensitive.
pub fn classify_openai_error(message: &str) -> RetryError {
    classify_provider_error("OpenAI", message)
}

/// Classify an Anthropic error message. Substring matching is
/// case-insensitive. Anthropic has no `model not found` convention of its
/// own, so that substring is not checked here (unlike OpenAI).
pub fn classify_anthropic_error(message: &str) -> RetryError {
    let lower = message.to_lowercase();
    if lower.contains("rate limit") || lower.contains("rate_limit") {
        return RetryError::Retryable(format!("Anthropic rate limit: {message}"));
    }
    if lower.contains("timeout") || lower.contains("connection") {
        return RetryError::Retryable(format!("Anthropic connection issue: {message}"));
    }
    if lower.contains("invalid api key") || lower.contains("unauthorized") {
        return RetryError::NonRetryable(format!("Anthropic authentication error: {message}"));
    }
    if lower.contains("invalid request") || lower.contains("bad request") {
        return RetryError::NonRetryable(format!("Anthropic request error: {message}"));
    }
    RetryError::Retryable(format!("Anthropic error: {message}"))
}

fn classify_provider_error(provider: &str, message: &str) -> RetryError {
    let lower = message.to_lowercase();
    if lower.contains("rate limit") || lower.contains("rate_limit") {
        return RetryError::Retryable(format!("{provider} rate limit: {message}"));
    }
    if lower.contains("timeout") || lower.contains("connection") {
        return RetryError::Retryable(format!("{provider} connection issue: {message}"));
    }
    if lower.contains("invalid api key") || lower.contains("unauthorized") {
        return RetryError::NonRetryable(format!("{provider} authentication error: {message}"));
    }
    if lower.contains("invalid request") || lower.contains("bad request") {
        return RetryError::NonRetryable(format!("{provider} request error: {message}"));
    }
    if lower.contains("model not found") {
        return RetryError::NonRetryable(format!("{provider} model error: {message}"));
    }
    RetryError::Retryable(format!("{provider} error: {message}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_retryable_codes() {
        for code in [429, 500, 502, 503, 504] {
            assert!(matches!(classify_http_error(code, ""), RetryError::Retryable(_)));
        }
    }

    #[test]
    fn http_non_retryable_codes() {
        for code in [400, 401, 403, 404, 422] {
            assert!(matches!(classify_http_error(code, ""), RetryError::NonRetryable(_)));
        }
    }

    #[test]
    fn http_unknown_defaults_retryable() {
        assert!(matches!(classify_http_error(418, ""), RetryError::Retryable(_)));
    }

    #[test]
    fn openai_rate_limit_is_retryable() {
        assert!(matches!(
            classify_openai_error("Rate limit exceeded"),
            RetryError::Retryable(_)
        ));
    }

    #[test]
    fn openai_invalid_api_key_is_non_retryable() {
        assert!(matches!(
            classify_openai_error("Invalid API key provided"),
            RetryError::NonRetryable(_)
        ));
    }

    #[test]
    fn openai_model_not_found_is_non_retryable() {
        assert!(matches!(
            classify_openai_error("The model 'gpt-9' not found"),
            RetryError::NonRetryable(_)
        ));
    }

    #[test]
    fn anthropic_connection_issue_is_retryable() {
        assert!(matches!(
            classify_anthropic_error("connection reset by peer"),
            RetryError::Retryable(_)
        ));
    }

    #[test]
    fn anthropic_unauthorized_is_non_retryable() {
        assert!(matches!(
            classify_anthropic_error("Unauthorized"),
            RetryError::NonRetryable(_)
        ));
    }

    #[test]
    fn unknown_provider_message_defaults_retryable() {
        assert!(matches!(
            classify_openai_error("something weird happened"),
            RetryError::Retryable(_)
        ));
    }
}
