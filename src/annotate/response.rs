//! Annotate response envelope and label extraction.
//!
//! A response is either an error envelope (`{"error": {...}}` with a non-empty
//! object) or a result envelope (`{"responses": [...]}`). Only the first
//! per-image result is read.
//!
//! Fields below the envelope are read leniently: `null`, a missing key or a
//! value of the wrong type falls back to the field's default, so an odd entry
//! in one feature never hides the labels of another.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{VisionError, VisionResult};

/// Deserialize `T`, falling back to `T::default()` for `null` or a mismatched type.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Deserialize a list entry by entry, dropping entries that do not fit `T`.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let entries: Vec<Value> = lenient(deserializer)?;
    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}

/// One label: what the service thinks is in the picture and how sure it is.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelAnnotation {
    #[serde(default, deserialize_with = "lenient")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient")]
    pub score: f64,
}

impl LabelAnnotation {
    pub fn new(description: impl Into<String>, score: f64) -> Self {
        Self {
            description: description.into(),
            score,
        }
    }
}

/// Logo, text and landmark hits share this shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EntityAnnotation {
    #[serde(default, deserialize_with = "lenient")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub locale: Option<String>,
}

/// `error` member of a failed call.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct ErrorEnvelope {
    #[serde(default, deserialize_with = "lenient")]
    pub code: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
}

impl ErrorEnvelope {
    /// `{}` carries nothing and counts as no error.
    pub fn is_empty(&self) -> bool {
        self.code.is_none() && self.message.is_none() && self.status.is_none()
    }

    fn into_error(self) -> VisionError {
        let message = self
            .message
            .unwrap_or_else(|| "service returned an error".to_string());
        let error = VisionError::remote(self.code, message);
        match self.status {
            Some(status) => error.with_status(status),
            None => error,
        }
    }
}

/// Annotations for one submitted image.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImageResult {
    #[serde(default, deserialize_with = "lenient_list")]
    pub label_annotations: Vec<LabelAnnotation>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub logo_annotations: Vec<EntityAnnotation>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub text_annotations: Vec<EntityAnnotation>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub landmark_annotations: Vec<EntityAnnotation>,
    /// Per-image failure reported inside an otherwise successful batch.
    #[serde(default, deserialize_with = "lenient")]
    pub error: Option<ErrorEnvelope>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct ResultEnvelope {
    #[serde(default, deserialize_with = "lenient_list")]
    pub responses: Vec<ImageResult>,
}

impl ResultEnvelope {
    /// First per-image result, if the service returned any.
    pub fn first(&self) -> Option<&ImageResult> {
        self.responses.first()
    }
}

/// Parsed annotate response.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationResponse {
    Error(ErrorEnvelope),
    Results(ResultEnvelope),
}

impl AnnotationResponse {
    /// Parse raw response bytes. Only malformed JSON is an error here; an
    /// error envelope comes back as [`AnnotationResponse::Error`].
    pub fn from_slice(bytes: &[u8]) -> VisionResult<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        if !value.is_object() {
            return Err(VisionError::parse(format!(
                "expected a JSON object, got {}",
                json_kind(&value)
            )));
        }
        if has_error_object(&value) {
            let envelope = serde_json::from_value(value["error"].clone())?;
            return Ok(Self::Error(envelope));
        }
        let envelope = serde_json::from_value(value)?;
        Ok(Self::Results(envelope))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Label annotations of the first result, or the remote error.
    ///
    /// A non-empty `error` inside the first result is a remote error too.
    pub fn into_labels(self) -> VisionResult<Vec<LabelAnnotation>> {
        match self {
            Self::Error(envelope) => Err(envelope.into_error()),
            Self::Results(envelope) => match envelope.responses.into_iter().next() {
                Some(ImageResult {
                    error: Some(error), ..
                }) if !error.is_empty() => Err(error.into_error()),
                Some(first) => Ok(first.label_annotations),
                None => Ok(Vec::new()),
            },
        }
    }
}

/// Pull the label annotations of the first result out of raw response bytes.
///
/// A non-empty top-level `error` object yields a remote error. A response
/// without `responses` or without `labelAnnotations` yields no labels.
pub fn extract(bytes: &[u8]) -> VisionResult<Vec<LabelAnnotation>> {
    AnnotationResponse::from_slice(bytes)?.into_labels()
}

/// Render labels the way the result view shows them: one
/// `"\n<description> = <score>"` line per label.
pub fn format_labels(labels: &[LabelAnnotation]) -> String {
    labels
        .iter()
        .map(|label| format!("\n{} = {}", label.description, label.score))
        .collect()
}

fn has_error_object(value: &Value) -> bool {
    value
        .get("error")
        .and_then(Value::as_object)
        .is_some_and(|error| !error.is_empty())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
