use std::env;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use quiz_core::model::{Question, QuestionRecord};

use crate::error::GeneratorError;

//
// ─── PARAMETERS ────────────────────────────────────────────────────────────────
//

/// Difficulty knob forwarded to the generation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// Validated parameters for one generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationParams {
    count: u8,
    difficulty: Difficulty,
}

impl GenerationParams {
    pub const MIN_COUNT: u8 = 3;
    pub const MAX_COUNT: u8 = 15;

    /// Builds parameters, enforcing the question-count bounds.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError::CountOutOfRange` when `count` falls outside
    /// `[3, 15]`.
    pub fn new(count: u8, difficulty: Difficulty) -> Result<Self, GeneratorError> {
        if !(Self::MIN_COUNT..=Self::MAX_COUNT).contains(&count) {
            return Err(GeneratorError::CountOutOfRange(count));
        }
        Ok(Self { count, difficulty })
    }

    #[must_use]
    pub fn count(&self) -> u8 {
        self.count
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct GenConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl GenConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("QUIZ_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("QUIZ_AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model = env::var("QUIZ_AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// Client for the document-to-question generation collaborator.
///
/// Given source material and parameters, asks the configured model for a
/// candidate question list in the interchange shape and validates every
/// candidate through the same structural boundary the repository uses. The
/// caller feeds the result to the repository like any other candidate list;
/// nothing downstream special-cases the source.
#[derive(Clone)]
pub struct QuestionGenService {
    client: Client,
    config: Option<GenConfig>,
}

impl QuestionGenService {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GenConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<GenConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Generate candidate questions from the given document text.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError` when the service is disabled, the request
    /// fails, or the reply cannot be turned into valid questions.
    pub async fn generate(
        &self,
        document: &str,
        params: GenerationParams,
    ) -> Result<Vec<Question>, GeneratorError> {
        let config = self.config.as_ref().ok_or(GeneratorError::Disabled)?;

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: build_prompt(document, params),
            }],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeneratorError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GeneratorError::EmptyResponse)?;

        parse_candidates(&content)
    }
}

fn build_prompt(document: &str, params: GenerationParams) -> String {
    format!(
        "Analyze the following document and generate {count} multiple-choice quiz questions \
         to test comprehension of the material.\n\
         \n\
         Difficulty level: {difficulty}\n\
         \n\
         For each question:\n\
         - Create a clear, specific question about key concepts from the document\n\
         - Provide 4 answer options (one correct, three plausible distractors)\n\
         - Ensure the correct answer is definitively supported by the document content\n\
         - Make distractors believable but clearly incorrect\n\
         \n\
         Respond ONLY with a JSON array in this exact format, with no preamble or markdown:\n\
         [\n\
           {{\n\
             \"question\": \"Question text here?\",\n\
             \"answers\": [\"Option A\", \"Option B\", \"Option C\", \"Option D\"],\n\
             \"correctAnswerIndex\": 0\n\
           }}\n\
         ]\n\
         \n\
         Document:\n\
         {document}",
        count = params.count(),
        difficulty = params.difficulty().as_str(),
    )
}

/// Extract the first JSON array from a model reply and validate every
/// candidate into a domain question.
fn parse_candidates(reply: &str) -> Result<Vec<Question>, GeneratorError> {
    let start = reply.find('[').ok_or(GeneratorError::MissingJsonArray)?;
    let end = reply.rfind(']').ok_or(GeneratorError::MissingJsonArray)?;
    if end < start {
        return Err(GeneratorError::MissingJsonArray);
    }

    let records: Vec<QuestionRecord> =
        serde_json::from_str(&reply[start..=end]).map_err(GeneratorError::UnparseableContent)?;

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            record
                .into_question()
                .map_err(|source| GeneratorError::InvalidCandidate { index, source })
        })
        .collect()
}

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_enforce_count_bounds() {
        assert!(matches!(
            GenerationParams::new(2, Difficulty::Easy),
            Err(GeneratorError::CountOutOfRange(2))
        ));
        assert!(matches!(
            GenerationParams::new(16, Difficulty::Hard),
            Err(GeneratorError::CountOutOfRange(16))
        ));

        let params = GenerationParams::new(5, Difficulty::Medium).unwrap();
        assert_eq!(params.count(), 5);
        assert_eq!(params.difficulty(), Difficulty::Medium);
    }

    #[test]
    fn parse_candidates_tolerates_surrounding_noise() {
        let reply = r#"Here you go:
            [{"question":"2+2?","answers":["3","4"],"correctAnswerIndex":1}]
            Hope that helps!"#;

        let questions = parse_candidates(reply).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].text(), "2+2?");
        assert_eq!(questions[0].correct_index(), 1);
    }

    #[test]
    fn parse_candidates_requires_an_array() {
        assert!(matches!(
            parse_candidates("no json here"),
            Err(GeneratorError::MissingJsonArray)
        ));
        assert!(matches!(
            parse_candidates("] backwards ["),
            Err(GeneratorError::MissingJsonArray)
        ));
    }

    #[test]
    fn parse_candidates_rejects_unparseable_arrays() {
        assert!(matches!(
            parse_candidates("[{\"question\": }]"),
            Err(GeneratorError::UnparseableContent(_))
        ));
    }

    #[test]
    fn parse_candidates_rejects_invalid_questions() {
        let reply = r#"[
            {"question":"fine","answers":["a","b"],"correctAnswerIndex":0},
            {"question":"bad","answers":["a","b"],"correctAnswerIndex":5}
        ]"#;

        assert!(matches!(
            parse_candidates(reply),
            Err(GeneratorError::InvalidCandidate { index: 1, .. })
        ));
    }

    #[tokio::test]
    async fn generate_without_config_is_disabled() {
        let service = QuestionGenService::new(None);
        assert!(!service.enabled());

        let params = GenerationParams::new(3, Difficulty::Easy).unwrap();
        assert!(matches!(
            service.generate("doc", params).await,
            Err(GeneratorError::Disabled)
        ));
    }
}
