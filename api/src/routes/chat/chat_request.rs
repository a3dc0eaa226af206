use serde::{Deserialize, Serialize};

use answer_engine::{AnswerRequest, Citation};

use crate::error_handler::AppError;

fn default_top_k() -> usize {
    8
}

fn default_max_tokens() -> u32 {
    512
}

/// Request payload for /chat and /chat/stream.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Natural language question.
    pub question: String,
    /// Restrict the search to these documents; omit to search all.
    #[serde(default)]
    pub file_ids: Option<Vec<String>>,
    /// Number of passages to retrieve (1..=30).
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Generation budget in tokens (64..=2048).
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl ChatRequest {
    /// Checks the numeric bounds.
    ///
    /// # Errors
    /// Returns [`AppError::BadRequest`] for out-of-range values.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(1..=30).contains(&self.top_k) {
            return Err(AppError::BadRequest(
                "top_k must be between 1 and 30".to_string(),
            ));
        }
        if !(64..=2048).contains(&self.max_tokens) {
            return Err(AppError::BadRequest(
                "max_tokens must be between 64 and 2048".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_answer_request(self, tenant_id: String) -> AnswerRequest {
        AnswerRequest {
            question: self.question,
            file_ids: self.file_ids,
            top_k: self.top_k,
            max_tokens: self.max_tokens,
            tenant_id,
        }
    }
}

/// Response payload for /chat.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Final model answer (plain text).
    pub answer: String,
    /// Whether the pipeline refused to answer.
    pub refused: bool,
    /// Sources backing the answer, in retrieval order.
    pub citations: Vec<Citation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(top_k: usize, max_tokens: u32) -> ChatRequest {
        ChatRequest {
            question: "q".to_string(),
            file_ids: None,
            top_k,
            max_tokens,
        }
    }

    #[test]
    fn defaults_apply_when_fields_are_omitted() {
        let req: ChatRequest = serde_json::from_str(r#"{"question":"hi"}"#).unwrap();
        assert_eq!(req.top_k, 8);
        assert_eq!(req.max_tokens, 512);
        assert!(req.file_ids.is_none());
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(request(1, 64).validate().is_ok());
        assert!(request(30, 2048).validate().is_ok());
        assert!(request(0, 512).validate().is_err());
        assert!(request(31, 512).validate().is_err());
        assert!(request(8, 63).validate().is_err());
        assert!(request(8, 2049).validate().is_err());
    }
}
