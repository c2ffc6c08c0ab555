//! Tool execution context - scoped to one chat session

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::catalog::MajorCatalog;
use crate::error::Ready4UniError;
use crate::llm::LlmGateway;
use crate::prompt::PromptRenderer;
use crate::services::{GradingScale, ParsedTranscript};
use crate::session::UploadedFile;

/// Parsed transcripts keyed by the SHA-256 of the uploaded file
pub type TranscriptCache = Arc<Mutex<HashMap<String, ParsedTranscript>>>;

/// Everything a tool may touch while answering one message
#[derive(Clone)]
pub struct ToolContext {
    pub llm: LlmGateway,
    pub catalog: Arc<MajorCatalog>,
    pub prompts: Arc<PromptRenderer>,
    pub grading: GradingScale,

    /// Session the tools run for (for logging)
    pub session_id: String,

    /// Files the user uploaded; the only files tools may open
    uploads: Vec<UploadedFile>,

    /// Shared across sessions so re-uploading the same PDF skips the LLM
    transcripts: TranscriptCache,
}

impl ToolContext {
    pub fn new(llm: LlmGateway, catalog: Arc<MajorCatalog>, prompts: Arc<PromptRenderer>, grading: GradingScale) -> Self {
        Self {
            llm,
            catalog,
            prompts,
            grading,
            session_id: String::new(),
            uploads: Vec::new(),
            transcripts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// A copy for one session, sharing the transcript cache
    pub fn for_session(&self, session_id: &str, uploads: &[UploadedFile]) -> Self {
        Self {
            session_id: session_id.to_string(),
            uploads: uploads.to_vec(),
            ..self.clone()
        }
    }

    pub fn with_uploads(mut self, uploads: Vec<UploadedFile>) -> Self {
        self.uploads = uploads;
        self
    }

    pub fn uploads(&self) -> &[UploadedFile] {
        &self.uploads
    }

    /// Map a path named by the LLM to one of the session's uploads.
    ///
    /// Accepts the upload's full path (any spelling that canonicalizes to it)
    /// or its bare file name. Anything else is rejected, existing or not.
    pub fn resolve_upload(&self, requested: &str) -> Result<&UploadedFile, ToolError> {
        let requested = requested.trim();
        if requested.is_empty() {
            return Err(ToolError::InvalidInput {
                message: "file_path is empty".to_string(),
            });
        }

        if let Ok(canonical) = Path::new(requested).canonicalize()
            && let Some(file) = self.uploads.iter().find(|f| f.path == canonical)
        {
            return Ok(file);
        }

        self.uploads
            .iter()
            .find(|f| f.name == requested)
            .ok_or_else(|| ToolError::NotUploaded {
                path: requested.to_string(),
            })
    }

    pub async fn cached_transcript(&self, sha256: &str) -> Option<ParsedTranscript> {
        let transcripts = self.transcripts.lock().await;
        transcripts.get(sha256).cloned()
    }

    pub async fn cache_transcript(&self, sha256: &str, parsed: ParsedTranscript) {
        let mut transcripts = self.transcripts.lock().await;
        transcripts.insert(sha256.to_string(), parsed);
    }

    pub async fn cached_transcript_count(&self) -> usize {
        self.transcripts.lock().await.len()
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("session_id", &self.session_id)
            .field("majors", &self.catalog.len())
            .field("uploads", &self.uploads.len())
            .finish()
    }
}

/// Errors that can occur during tool execution
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("File '{path}' has not been uploaded in this session")]
    NotUploaded { path: String },

    #[error("Tool '{name}' not found in registry")]
    UnknownTool { name: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error(transparent)]
    Service(#[from] Ready4UniError),
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::UploadConfig;
    use crate::llm::{MockLlmClient, RetryPolicy};
    use tempfile::tempdir;

    /// Context over the bundled catalog with a scripted LLM
    pub(crate) fn test_context() -> (Arc<MockLlmClient>, ToolContext) {
        let mock = Arc::new(MockLlmClient::new());
        let llm = LlmGateway::new(mock.clone()).with_retry_policy(RetryPolicy::none());
        let ctx = ToolContext::new(
            llm,
            Arc::new(MajorCatalog::bundled().unwrap()),
            Arc::new(PromptRenderer::builtin().unwrap()),
            GradingScale::default(),
        );
        (mock, ctx)
    }

    fn upload(dir: &Path, name: &str) -> UploadedFile {
        let path = dir.join(name);
        std::fs::write(&path, format!("%PDF-1.4 {}", name)).unwrap();
        UploadedFile::from_path(&path, &UploadConfig::default()).unwrap()
    }

    #[test]
    fn test_resolve_upload_by_path_and_name() {
        let dir = tempdir().unwrap();
        let file = upload(dir.path(), "boletim.pdf");
        let (_, ctx) = test_context();
        let ctx = ctx.with_uploads(vec![file.clone()]);

        let by_path = ctx.resolve_upload(&file.path.to_string_lossy()).unwrap();
        assert_eq!(by_path.sha256, file.sha256);

        let by_name = ctx.resolve_upload("boletim.pdf").unwrap();
        assert_eq!(by_name.path, file.path);
    }

    #[test]
    fn test_resolve_upload_rejects_other_files() {
        let dir = tempdir().unwrap();
        let file = upload(dir.path(), "boletim.pdf");
        let stranger = dir.path().join("other.pdf");
        std::fs::write(&stranger, "%PDF-1.4 other").unwrap();

        let (_, ctx) = test_context();
        let ctx = ctx.with_uploads(vec![file]);

        let result = ctx.resolve_upload(&stranger.to_string_lossy());
        assert!(matches!(result, Err(ToolError::NotUploaded { .. })));

        let result = ctx.resolve_upload("sample_transcript.pdf");
        assert!(matches!(result, Err(ToolError::NotUploaded { .. })));

        let result = ctx.resolve_upload("  ");
        assert!(matches!(result, Err(ToolError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_for_session_shares_cache() {
        let (_, ctx) = test_context();
        let session = ctx.for_session("1738300800123-a1b2", &[]);
        assert_eq!(session.session_id, "1738300800123-a1b2");

        session
            .cache_transcript(
                "abc",
                ParsedTranscript {
                    grades: [("Math".to_string(), 15.0)].into_iter().collect(),
                    student_info: Default::default(),
                    gpa: None,
                    confidence: "high".to_string(),
                    raw_text: String::new(),
                    dropped: Vec::new(),
                },
            )
            .await;

        assert_eq!(ctx.cached_transcript_count().await, 1);
        assert!(ctx.cached_transcript("abc").await.is_some());
        assert!(ctx.cached_transcript("def").await.is_none());
    }

    #[test]
    fn test_tool_error_messages() {
        let err = ToolError::UnknownTool {
            name: "fly".to_string(),
        };
        assert_eq!(err.to_string(), "Tool 'fly' not found in registry");

        let err: ToolError = Ready4UniError::MajorNotFound("Astrology".to_string()).into();
        assert_eq!(err.to_string(), "Major not found: Astrology");
    }
}
