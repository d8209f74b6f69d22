//! Snapshot keys and wire encoding.

use quiz_core::model::{ChapterId, SessionSnapshot};

use crate::repository::StorageError;

/// Storage key for a chapter's snapshot: `"<namespace>_<chapterId>"`.
#[must_use]
pub fn progress_key(namespace: &str, chapter: &ChapterId) -> String {
    format!("{namespace}_{chapter}")
}

/// # Errors
///
/// Returns `StorageError::Serialization` if the snapshot cannot be encoded.
pub fn encode_snapshot(snapshot: &SessionSnapshot) -> Result<String, StorageError> {
    serde_json::to_string(snapshot).map_err(|err| StorageError::Serialization(err.to_string()))
}

/// # Errors
///
/// Returns `StorageError::Serialization` for malformed JSON or questions that
/// fail validation.
pub fn decode_snapshot(raw: &str) -> Result<SessionSnapshot, StorageError> {
    serde_json::from_str(raw).map_err(|err| StorageError::Serialization(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::Question;

    #[test]
    fn key_is_namespaced_by_chapter() {
        let chapter = ChapterId::new("ch-12").unwrap();
        assert_eq!(progress_key("quiz_progress", &chapter), "quiz_progress_ch-12");
    }

    #[test]
    fn encode_then_decode_is_exact() {
        let snapshot = SessionSnapshot {
            answer_map: [(0, 2), (1, 0)].into_iter().collect(),
            batch_index: 1,
            question_set: vec![
                Question::new("q", vec!["a".into(), "b".into(), "c".into()], 2, None).unwrap(),
                Question::new("r", vec!["x".into()], 0, Some("why".into())).unwrap(),
            ]
            .into(),
        };
        let raw = encode_snapshot(&snapshot).unwrap();
        assert_eq!(decode_snapshot(&raw).unwrap(), snapshot);
    }

    #[test]
    fn malformed_payload_is_a_serialization_error() {
        let err = decode_snapshot("{\"answerMap\":").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));

        let bad_question =
            r#"{"answerMap":{},"batchIndex":0,"questionSet":[{"question":"q","options":[],"correctAnswer":0}]}"#;
        assert!(decode_snapshot(bad_question).is_err());
    }
}
