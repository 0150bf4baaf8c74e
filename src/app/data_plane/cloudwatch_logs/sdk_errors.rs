//! Classification of CloudWatch Logs SDK errors.
//!
//! Backend errors are fatal by default. When retries are enabled, the pager
//! uses this classification to decide whether an error is worth another
//! attempt: throttling, timeouts, dispatch failures and 5xx responses are,
//! permission and validation failures are not.

#![warn(clippy::all, rust_2018_idioms)]

use std::fmt;
use thiserror::Error;

/// A failed request carrying the service error code reported by CloudWatch
/// Logs, such as `ThrottlingException` or `ResourceNotFoundException`.
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct ServiceError {
    pub code: String,
    pub message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl ServiceError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Keep the underlying SDK error as the cause
    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

const THROTTLING_CODES: &[&str] = &[
    "ThrottlingException",
    "Throttling",
    "TooManyRequestsException",
    "LimitExceededException",
    "RequestLimitExceeded",
];

const UNAVAILABLE_CODES: &[&str] = &[
    "ServiceUnavailableException",
    "ServiceUnavailable",
    "InternalServerError",
    "InternalServerException",
    "InternalFailure",
];

const PERMISSION_MARKERS: &[&str] = &[
    "AccessDenied",
    "UnrecognizedClientException",
    "InvalidClientTokenId",
    "ExpiredToken",
    "SignatureDoesNotMatch",
];

fn is_permission_error(text: &str) -> bool {
    PERMISSION_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Categorized backend error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Request was throttled due to rate limiting
    Throttled { operation: String, error_code: String },
    /// Request timed out
    Timeout { operation: String },
    /// Connection could not be established or was dropped
    NetworkError { message: String },
    /// CloudWatch Logs temporarily unavailable
    ServiceUnavailable { operation: String, message: String },
    /// Permissions, validation, missing resources and anything unrecognized
    NonRetryable {
        code: String,
        message: String,
        is_permission_error: bool,
    },
}

impl ErrorCategory {
    /// Returns true if this error category is retryable
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ErrorCategory::NonRetryable { .. })
    }

    /// Short label used in log lines
    pub fn short_label(&self) -> &'static str {
        match self {
            ErrorCategory::Throttled { .. } => "throttled",
            ErrorCategory::Timeout { .. } => "timeout",
            ErrorCategory::NetworkError { .. } => "network",
            ErrorCategory::ServiceUnavailable { .. } => "unavailable",
            ErrorCategory::NonRetryable {
                is_permission_error: true,
                ..
            } => "access-denied",
            ErrorCategory::NonRetryable { .. } => "error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Throttled {
                operation,
                error_code,
            } => write!(f, "{} rate limited ({})", operation, error_code),
            ErrorCategory::Timeout { operation } => write!(f, "{} timed out", operation),
            ErrorCategory::NetworkError { message } => write!(f, "network error: {}", message),
            ErrorCategory::ServiceUnavailable { operation, .. } => {
                write!(f, "CloudWatch Logs unavailable during {}", operation)
            }
            ErrorCategory::NonRetryable { code, .. } => f.write_str(code),
        }
    }
}

/// Categorize an error returned by a backend call.
///
/// A [`ServiceError`] anywhere in the chain decides on its error code alone.
/// Otherwise only the root cause is inspected, so context added on the way
/// up (which may contain a log group name) never affects the outcome.
pub fn categorize_error(error: &anyhow::Error, operation: &str) -> ErrorCategory {
    if let Some(service) = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<ServiceError>())
    {
        return categorize_service_error(&service.code, &service.message, operation);
    }

    // Display leads so a `Code: message` prefix is found first; the Debug
    // form adds the SDK's structured metadata.
    let root = error.root_cause();
    categorize_error_string(&format!("{}\n{:?}", root, root), operation)
}

/// Categorize a service error by its code
pub fn categorize_service_error(code: &str, message: &str, operation: &str) -> ErrorCategory {
    if THROTTLING_CODES.contains(&code) {
        return ErrorCategory::Throttled {
            operation: operation.to_string(),
            error_code: code.to_string(),
        };
    }

    if UNAVAILABLE_CODES.contains(&code) {
        return ErrorCategory::ServiceUnavailable {
            operation: operation.to_string(),
            message: truncate_message(message, 100),
        };
    }

    ErrorCategory::NonRetryable {
        code: code.to_string(),
        message: truncate_message(message, 200),
        is_permission_error: is_permission_error(code),
    }
}

/// Categorize an error based on its string representation
pub fn categorize_error_string(error_str: &str, operation: &str) -> ErrorCategory {
    let code = extract_error_code(error_str);

    // A recognizable service code wins over free-text matching
    if let Some(code) = &code {
        if THROTTLING_CODES.contains(&code.as_str())
            || UNAVAILABLE_CODES.contains(&code.as_str())
            || code.ends_with("Exception")
        {
            return categorize_service_error(code, error_str, operation);
        }
    }

    let is_permission_error = is_permission_error(error_str);

    if !is_permission_error {
        if error_str.contains("Throttling") || error_str.contains("Rate exceeded") {
            return ErrorCategory::Throttled {
                operation: operation.to_string(),
                error_code: code.unwrap_or_else(|| "Throttling".to_string()),
            };
        }

        if error_str.contains("TimeoutError")
            || error_str.contains("timed out")
            || error_str.contains("deadline exceeded")
        {
            return ErrorCategory::Timeout {
                operation: operation.to_string(),
            };
        }

        if error_str.contains("DispatchFailure")
            || error_str.contains("connection")
            || error_str.contains("Connection")
            || error_str.contains("dns error")
        {
            return ErrorCategory::NetworkError {
                message: truncate_message(error_str, 100),
            };
        }

        if UNAVAILABLE_CODES.iter().any(|c| error_str.contains(c)) {
            return ErrorCategory::ServiceUnavailable {
                operation: operation.to_string(),
                message: truncate_message(error_str, 100),
            };
        }
    }

    let code = code.unwrap_or_else(|| {
        if is_permission_error {
            "AccessDenied".to_string()
        } else {
            "Error".to_string()
        }
    });

    ErrorCategory::NonRetryable {
        code,
        message: truncate_message(error_str, 200),
        is_permission_error,
    }
}

/// Extract an AWS error code such as `ResourceNotFoundException`
fn extract_error_code(error_str: &str) -> Option<String> {
    // `code: Some("ThrottlingException")` in SDK debug output
    if let Some(start) = error_str.find("code:") {
        let after_code = &error_str[start + 5..];
        if let Some(quote_start) = after_code.find('"') {
            let after_quote = &after_code[quote_start + 1..];
            if let Some(quote_end) = after_quote.find('"') {
                let code = &after_quote[..quote_end];
                if !code.is_empty() && code.len() < 50 {
                    return Some(code.to_string());
                }
            }
        }
    }

    // `ThrottlingException: Rate exceeded`
    if let Some(pos) = error_str.find(':') {
        let prefix = error_str[..pos].trim();
        if prefix.ends_with("Exception") || prefix.ends_with("Error") {
            let code = prefix.rsplit("::").next().unwrap_or(prefix);
            if !code.is_empty() && code.len() < 50 && !code.contains(char::is_whitespace) {
                return Some(code.to_string());
            }
        }
    }

    None
}

fn truncate_message(msg: &str, max_len: usize) -> String {
    if msg.len() <= max_len {
        return msg.to_string();
    }
    let mut end = max_len.saturating_sub(3);
    while !msg.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &msg[..end])
}
