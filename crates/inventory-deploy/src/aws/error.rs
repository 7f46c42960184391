//! AWS error classification and handling
//!
//! Provides typed errors for AWS SDK operations using the `.code()` method
//! instead of string matching on Debug format. The create-or-adopt and
//! tolerant-delete flows hinge on telling "already exists" and "not found"
//! apart from genuine failures.

use thiserror::Error;

pub use aws_sdk_s3::error::ProvideErrorMetadata;

/// AWS error categories for the provisioning and teardown logic
#[derive(Debug, Error)]
pub enum AwsError {
    /// Resource was not found (success for deletes, adopt-miss for creates)
    #[error("Resource not found: {resource_type} '{resource_id}'")]
    NotFound {
        resource_type: &'static str,
        resource_id: String,
    },

    /// Resource already exists or is mid-change (safe to adopt or retry)
    #[error("Resource already exists")]
    AlreadyExists,

    /// Rate limit exceeded (retryable with backoff)
    #[error("Rate limit exceeded")]
    Throttled,

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Check if this is an "already exists" / conflict error
    pub fn is_already_exists(&self) -> bool {
        matches!(self, AwsError::AlreadyExists)
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        matches!(self, AwsError::Throttled)
    }
}

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    "ResourceNotFoundException",
    "NotFoundException",
    "NotFound",
    "NoSuchBucket",
    "NoSuchKey",
    "NoSuchBucketPolicy",
    "NoSuchWebsiteConfiguration",
    "NoSuchEntity",
];

/// Known AWS error codes for "already exists" and benign-conflict conditions
const ALREADY_EXISTS_CODES: &[&str] = &[
    "ResourceInUseException",
    "ResourceConflictException",
    "ConflictException",
    "EntityAlreadyExists",
    "BucketAlreadyOwnedByYou",
    "BucketAlreadyExists",
];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "TooManyRequestsException",
    "RequestLimitExceeded",
];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound {
            resource_type: "resource",
            resource_id: message.clone(),
        },
        Some(c) if ALREADY_EXISTS_CODES.contains(&c) => AwsError::AlreadyExists,
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled,
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify any SDK error that exposes error metadata.
///
/// `SdkError<E, R>` implements `ProvideErrorMetadata` whenever the operation
/// error does, so this accepts operation results from every service client.
pub fn classify_sdk_error<E: ProvideErrorMetadata>(err: &E) -> AwsError {
    classify_aws_error(err.code(), err.message())
}

/// True when the error means the resource already exists or is mid-change.
pub fn is_already_exists<E: ProvideErrorMetadata>(err: &E) -> bool {
    classify_sdk_error(err).is_already_exists()
}

/// True when the error means the resource is not there.
pub fn is_not_found<E: ProvideErrorMetadata>(err: &E) -> bool {
    classify_sdk_error(err).is_not_found()
}

/// Classify an `anyhow::Error` that may wrap an AWS SDK error.
///
/// Used on teardown paths where errors have already been wrapped with
/// context; falls back to extracting a code from the Debug representation.
pub fn classify_anyhow_error(error: &anyhow::Error) -> AwsError {
    let debug_str = format!("{error:?}");
    if let Some(code) = extract_error_code(&debug_str) {
        return classify_aws_error(Some(&code), Some(&error.to_string()));
    }

    AwsError::Sdk {
        code: None,
        message: error.to_string(),
    }
}

/// All known AWS error codes for extraction from debug strings (flat list)
const ALL_KNOWN_CODES: &[&str] = &[
    // Not found
    "ResourceNotFoundException",
    "NotFoundException",
    "NoSuchBucket",
    "NoSuchKey",
    "NoSuchBucketPolicy",
    "NoSuchWebsiteConfiguration",
    "NoSuchEntity",
    // Already exists / conflict
    "ResourceInUseException",
    "ResourceConflictException",
    "ConflictException",
    "EntityAlreadyExists",
    "BucketAlreadyOwnedByYou",
    "BucketAlreadyExists",
    // Throttling
    "Throttling",
    "ThrottlingException",
    "TooManyRequestsException",
    "RequestLimitExceeded",
];

/// Extract an AWS error code from a debug string representation
fn extract_error_code(debug_str: &str) -> Option<String> {
    for code in ALL_KNOWN_CODES {
        if debug_str.contains(code) {
            return Some((*code).to_string());
        }
    }

    // Try to extract any code from `code: Some("...")` pattern
    if let Some(start) = debug_str.find("code: Some(\"") {
        let rest = &debug_str[start + 12..];
        if let Some(end) = rest.find('"') {
            return Some(rest[..end].to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_codes() {
        for code in NOT_FOUND_CODES {
            let err = classify_aws_error(Some(code), Some("some message"));
            assert!(err.is_not_found(), "Expected NotFound for code: {code}");
        }
    }

    #[test]
    fn already_exists_codes() {
        for code in ALREADY_EXISTS_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(
                err.is_already_exists(),
                "Expected AlreadyExists for code: {code}"
            );
        }
    }

    #[test]
    fn throttling_codes() {
        for code in THROTTLING_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(err.is_retryable(), "Expected retryable for code: {code}");
            assert!(matches!(err, AwsError::Throttled));
        }
    }

    #[test]
    fn unknown_and_missing_codes() {
        let err = classify_aws_error(Some("SomeNewError"), Some("details"));
        assert!(matches!(err, AwsError::Sdk { .. }));

        let err2 = classify_aws_error(None, Some("something failed"));
        assert!(matches!(err2, AwsError::Sdk { code: None, .. }));
    }

    #[test]
    fn extract_known_codes_from_debug_string() {
        for code in ALL_KNOWN_CODES {
            let debug_str = format!("SdkError {{ code: Some(\"{code}\"), message: \"fail\" }}");
            assert!(
                extract_error_code(&debug_str).is_some(),
                "Failed to extract any code from string containing: {code}"
            );
        }
    }

    #[test]
    fn extract_code_from_code_field() {
        let debug_str = r#"SdkError { code: Some("SomeRandomCode"), message: "fail" }"#;
        assert_eq!(
            extract_error_code(debug_str).as_deref(),
            Some("SomeRandomCode")
        );
    }

    #[test]
    fn extract_none_from_unrelated_string() {
        assert!(extract_error_code("connection refused").is_none());
    }

    #[test]
    fn classify_anyhow_falls_back_to_message() {
        let err = anyhow::anyhow!("plain failure");
        let classified = classify_anyhow_error(&err);
        assert!(matches!(classified, AwsError::Sdk { code: None, .. }));

        let wrapped = anyhow::anyhow!(r#"service said code: Some("NoSuchBucket")"#);
        assert!(classify_anyhow_error(&wrapped).is_not_found());
    }

    #[test]
    fn aws_error_variant_checks() {
        assert!(AwsError::NotFound {
            resource_type: "bucket",
            resource_id: "inventory-uploads".to_string()
        }
        .is_not_found());
        assert!(!AwsError::Throttled.is_not_found());
        assert!(AwsError::AlreadyExists.is_already_exists());
        assert!(!AwsError::AlreadyExists.is_retryable());
    }
}
