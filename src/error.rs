//! Error types for Ready4Uni
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::llm::LlmError;

/// All error types that can occur in Ready4Uni
#[derive(Debug, Error)]
pub enum Ready4UniError {
    /// Major lookup failed
    #[error("Major not found: {0}")]
    MajorNotFound(String),

    /// Caller supplied data that cannot be used
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Majors dataset could not be loaded or is malformed
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Transcript text could not be turned into grades
    #[error("Transcript error: {0}")]
    Transcript(String),

    /// PDF could not be opened or read
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Uploaded file rejected
    #[error("Upload rejected: {0}")]
    Upload(String),

    /// Prompt template failed to render
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// LLM API error
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Ready4Uni operations
pub type Result<T> = std::result::Result<T, Ready4UniError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_not_found_error() {
        let err = Ready4UniError::MajorNotFound("Astrology".to_string());
        assert_eq!(err.to_string(), "Major not found: Astrology");
    }

    #[test]
    fn test_invalid_input_error() {
        let err = Ready4UniError::InvalidInput("grade 25 out of range".to_string());
        assert_eq!(err.to_string(), "Invalid input: grade 25 out of range");
    }

    #[test]
    fn test_catalog_error() {
        let err = Ready4UniError::Catalog("empty dataset".to_string());
        assert_eq!(err.to_string(), "Catalog error: empty dataset");
    }

    #[test]
    fn test_transcript_error() {
        let err = Ready4UniError::Transcript("No grades found in the transcript".to_string());
        assert_eq!(err.to_string(), "Transcript error: No grades found in the transcript");
    }

    #[test]
    fn test_llm_error_conversion() {
        let llm_err = LlmError::InvalidResponse("no content".to_string());
        let err: Ready4UniError = llm_err.into();
        assert!(matches!(err, Ready4UniError::Llm(_)));
        assert_eq!(err.to_string(), "LLM error: Invalid response: no content");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Ready4UniError = io_err.into();
        assert!(matches!(err, Ready4UniError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: Ready4UniError = json_err.into();
        assert!(matches!(err, Ready4UniError::Json(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(Ready4UniError::Upload("not a pdf".to_string()))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
