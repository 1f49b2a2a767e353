//! Search results returned by the retrieval layer.

use crate::error::{CoursemateError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form metadata attached to a matched document.
pub type Metadata = Map<String, Value>;

/// Ranked matches for a content search.
///
/// `documents`, `metadata` and `distances` are parallel by index, but their
/// lengths are not enforced to agree. A set `error` marks a failed search
/// regardless of what the arrays contain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub documents: Vec<String>,
    pub metadata: Vec<Metadata>,
    pub distances: Vec<f32>,
    pub error: Option<String>,
}

impl SearchResults {
    pub fn new(documents: Vec<String>, metadata: Vec<Metadata>, distances: Vec<f32>) -> Self {
        Self {
            documents,
            metadata,
            distances,
            error: None,
        }
    }

    /// An empty result carrying an error message.
    pub fn empty(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// True when there are no documents or the search failed.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty() || self.error.is_some()
    }

    /// Build results from a raw vector-database payload.
    ///
    /// The payload nests one list per query:
    /// `{"documents": [[..]], "metadatas": [[..]], "distances": [[..]]}`.
    /// Null or missing inner lists become empty sequences; a payload without
    /// a `documents` key is rejected.
    pub fn from_raw(payload: &Value) -> Result<Self> {
        let object = payload
            .as_object()
            .ok_or_else(|| CoursemateError::InvalidInput("search payload is not an object".to_string()))?;

        let documents = object
            .get("documents")
            .ok_or_else(|| CoursemateError::InvalidInput("search payload has no 'documents'".to_string()))?;

        let documents = first_row(Some(documents))
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();

        let metadata = first_row(object.get("metadatas"))
            .iter()
            .map(|v| v.as_object().cloned().unwrap_or_default())
            .collect();

        let distances = first_row(object.get("distances"))
            .iter()
            .filter_map(|v| v.as_f64().map(|d| d as f32))
            .collect();

        Ok(Self::new(documents, metadata, distances))
    }
}

/// First inner list of a nested per-query array, or nothing.
fn first_row(value: Option<&Value>) -> &[Value] {
    value
        .and_then(Value::as_array)
        .and_then(|outer| outer.first())
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Course title recorded in a match's metadata.
pub fn metadata_course_title(metadata: &Metadata) -> Option<&str> {
    metadata.get("course_title").and_then(Value::as_str)
}

/// Lesson number recorded in a match's metadata.
pub fn metadata_lesson_number(metadata: &Metadata) -> Option<u32> {
    metadata
        .get("lesson_number")
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}
