//! Request and response plumbing for the remote text oracle.
//!
//! The oracle itself is an opaque service behind the [`Oracle`] trait; this
//! module only shapes what is sent and interprets what comes back.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{DayOfMonth, MonthIndex};

/// Shown when the oracle answers with no text.
pub const FALLBACK_SILENT: &str = "The oracle has fallen into deep thought...";

/// Shown when the oracle cannot be reached or rejects the request.
pub const FALLBACK_ERROR: &str = "The connection to the ancestors was broken. Check the API key.";

const TEMPERATURE: f32 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 400;

/// Voice the oracle answers in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Persona {
    /// Answers free-form questions.
    Oracle,
    /// Interprets a single calendar day.
    Priest,
}

impl Persona {
    pub const fn preamble(self) -> &'static str {
        match self {
            Self::Oracle => "You are the Oracle of the Star Temple. Answer mystically.",
            Self::Priest => "You are a priest. Describe the energy of this day in 2-3 sentences.",
        }
    }
}

/// A query plus the persona it is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OraclePrompt {
    persona: Persona,
    query: String,
}

impl OraclePrompt {
    pub fn new(persona: Persona, query: impl Into<String>) -> Self {
        Self {
            persona,
            query: query.into(),
        }
    }

    /// A free-form question for the oracle persona.
    pub fn question(query: impl Into<String>) -> Self {
        Self::new(Persona::Oracle, query)
    }

    /// Asks the priest persona to interpret one day, naming its patron.
    pub fn for_day(month: MonthIndex, day: DayOfMonth) -> Self {
        let definition = month.definition();
        Self::new(
            Persona::Priest,
            format!(
                "Day {day} of month {}. Patron: {}.",
                definition.name, definition.deity
            ),
        )
    }

    pub const fn persona(&self) -> Persona {
        self.persona
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Preamble and query joined into the single text part sent upstream.
    pub fn text(&self) -> String {
        format!("{}\n\nQuery: {}", self.persona.preamble(), self.query)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Wire body of a generate-content call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl From<&OraclePrompt> for OracleRequest {
    fn from(prompt: &OraclePrompt) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_owned()),
                parts: vec![Part {
                    text: prompt.text(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub message: Option<String>,
}

/// Wire body of a generate-content reply. Every field is optional upstream.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OracleResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

impl OracleResponse {
    /// Decodes a raw reply, turning an error payload into `OracleError::Api`.
    ///
    /// # Errors
    /// Returns `OracleError::Decode` for invalid JSON and `OracleError::Api`
    /// when the reply carries an `error` object.
    pub fn from_json(body: &str) -> Result<Self, OracleError> {
        let response: Self = serde_json::from_str(body)?;
        if let Some(error) = &response.error {
            let message = error.message.clone().unwrap_or_else(|| "API error".to_owned());
            return Err(OracleError::Api(message));
        }
        Ok(response)
    }

    /// Text of the first part of the first candidate, if any.
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()
            .map(|p| p.text.as_str())
    }
}

/// Error type for oracle calls.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// The service answered with an error payload.
    #[error("oracle API error: {0}")]
    Api(String),

    /// The reply could not be decoded.
    #[error("malformed oracle response")]
    Decode(#[from] serde_json::Error),

    /// The service could not be reached.
    #[error("oracle unreachable: {0}")]
    Transport(String),
}

/// A remote text-generation service.
pub trait Oracle {
    /// # Errors
    /// Returns `OracleError` when the call fails or cannot be decoded.
    fn ask(&self, request: &OracleRequest) -> Result<OracleResponse, OracleError>;
}

/// Asks `oracle` and always comes back with something to show.
///
/// An empty answer yields [`FALLBACK_SILENT`], any failure [`FALLBACK_ERROR`].
pub fn consult<O: Oracle + ?Sized>(oracle: &O, prompt: &OraclePrompt) -> String {
    let request = OracleRequest::from(prompt);
    debug!(persona = ?prompt.persona(), "consulting oracle");
    match oracle.ask(&request) {
        Ok(response) => match response.text() {
            Some(text) if !text.trim().is_empty() => text.to_owned(),
            _ => FALLBACK_SILENT.to_owned(),
        },
        Err(e) => {
            warn!(error = %e, "oracle call failed");
            FALLBACK_ERROR.to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Replays a canned reply and records what was asked.
    struct CannedOracle {
        reply: String,
        asked: RefCell<Vec<String>>,
    }

    impl CannedOracle {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_owned(),
                asked: RefCell::new(Vec::new()),
            }
        }
    }

    impl Oracle for CannedOracle {
        fn ask(&self, request: &OracleRequest) -> Result<OracleResponse, OracleError> {
            self.asked
                .borrow_mut()
                .push(request.contents[0].parts[0].text.clone());
            OracleResponse::from_json(&self.reply)
        }
    }

    struct OfflineOracle;

    impl Oracle for OfflineOracle {
        fn ask(&self, _request: &OracleRequest) -> Result<OracleResponse, OracleError> {
            Err(OracleError::Transport("connection refused".to_owned()))
        }
    }

    #[test]
    fn test_prompt_for_day_names_patron() {
        let month = MonthIndex::new(3).unwrap();
        let day = DayOfMonth::new(17, month).unwrap();
        let prompt = OraclePrompt::for_day(month, day);
        assert_eq!(prompt.persona(), Persona::Priest);
        assert_eq!(prompt.query(), "Day 17 of month Gejlet. Patron: Marzanna.");
    }

    #[test]
    fn test_request_wire_format() {
        let prompt = OraclePrompt::question("Will it snow?");
        let request = OracleRequest::from(&prompt);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(
            json["contents"][0]["parts"][0]["text"],
            "You are the Oracle of the Star Temple. Answer mystically.\n\nQuery: Will it snow?"
        );
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 400);
        let temperature = json["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_response_text_extraction() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"The frost listens."}]}}]}"#;
        let response = OracleResponse::from_json(body).unwrap();
        assert_eq!(response.text(), Some("The frost listens."));

        let empty = OracleResponse::from_json("{}").unwrap();
        assert_eq!(empty.text(), None);
    }

    #[test]
    fn test_response_error_payload() {
        let body = r#"{"error":{"message":"API key not valid"}}"#;
        let err = OracleResponse::from_json(body).unwrap_err();
        assert!(matches!(err, OracleError::Api(ref m) if m == "API key not valid"));

        let err = OracleResponse::from_json(r#"{"error":{}}"#).unwrap_err();
        assert_eq!(err.to_string(), "oracle API error: API error");
    }

    #[test]
    fn test_consult_returns_text() {
        let oracle =
            CannedOracle::new(r#"{"candidates":[{"content":{"parts":[{"text":"Rest now."}]}}]}"#);
        let answer = consult(&oracle, &OraclePrompt::question("What now?"));
        assert_eq!(answer, "Rest now.");
        assert_eq!(oracle.asked.borrow().len(), 1);
        assert!(oracle.asked.borrow()[0].ends_with("Query: What now?"));
    }

    #[test]
    fn test_consult_falls_back_when_silent() {
        let oracle = CannedOracle::new(r#"{"candidates":[]}"#);
        assert_eq!(consult(&oracle, &OraclePrompt::question("?")), FALLBACK_SILENT);
    }

    #[test]
    fn test_consult_falls_back_on_errors() {
        assert_eq!(consult(&OfflineOracle, &OraclePrompt::question("?")), FALLBACK_ERROR);

        let broken = CannedOracle::new("not json");
        assert_eq!(consult(&broken, &OraclePrompt::question("?")), FALLBACK_ERROR);

        let rejected = CannedOracle::new(r#"{"error":{"message":"quota"}}"#);
        assert_eq!(consult(&rejected, &OraclePrompt::question("?")), FALLBACK_ERROR);
    }
}
