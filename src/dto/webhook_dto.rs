use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};
use crate::models::candidate::NewCandidate;

/// Body the intake bot posts for every completed application form.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestCandidatePayload {
    pub uuid: Option<String>,
    pub message_body: Option<String>,
    pub sender: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestCandidateResponse {
    pub status: String,
    pub message: String,
    pub candidate_id: i32,
}

impl IngestCandidateResponse {
    pub fn saved(candidate_id: i32) -> Self {
        Self {
            status: "success".to_string(),
            message: "Candidate data saved successfully".to_string(),
            candidate_id,
        }
    }
}

impl IngestCandidatePayload {
    /// Checks required fields and decodes the answers. Returns the candidate to
    /// insert and the tag names to attach.
    pub fn into_new_candidate(self) -> Result<(NewCandidate, Vec<String>)> {
        let (Some(uuid), Some(message_body), Some(sender)) = (
            non_blank(self.uuid),
            non_blank(self.message_body),
            non_blank(self.sender),
        ) else {
            return Err(Error::Validation(
                "uuid, message_body, and sender are required.".to_string(),
            ));
        };

        let answers = decode_message_body(&message_body)?;
        let tags = self
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        Ok((NewCandidate::from_answers(uuid, sender, answers), tags))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Decodes the double-encoded webhook body: an outer JSON object whose
/// `payload` field is a JSON string holding the answers object.
pub fn decode_message_body(message_body: &str) -> Result<Map<String, JsonValue>> {
    let outer: JsonValue = serde_json::from_str(message_body)
        .map_err(|e| Error::Validation(format!("message_body is not valid JSON: {}", e)))?;

    let payload = outer
        .get("payload")
        .ok_or_else(|| Error::Validation("message_body has no payload field".to_string()))?
        .as_str()
        .ok_or_else(|| {
            Error::Validation("message_body.payload must be a JSON-encoded string".to_string())
        })?;

    let inner: JsonValue = serde_json::from_str(payload)
        .map_err(|e| Error::Validation(format!("payload is not valid JSON: {}", e)))?;

    match inner {
        JsonValue::Object(answers) => Ok(answers),
        _ => Err(Error::Validation("payload must decode to a JSON object".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(answers: &JsonValue) -> String {
        json!({ "payload": answers.to_string(), "flow_token": "unused" }).to_string()
    }

    #[test]
    fn decodes_both_layers() {
        let answers = json!({ "fullName": "Ada Lovelace", "email": "ada@example.com" });
        let decoded = decode_message_body(&envelope(&answers)).unwrap();
        assert_eq!(JsonValue::Object(decoded), answers);
    }

    #[test]
    fn rejects_malformed_layers() {
        let cases = [
            "{not json".to_string(),
            json!({ "other": "x" }).to_string(),
            json!({ "payload": { "fullName": "Ada" } }).to_string(),
            json!({ "payload": "{broken" }).to_string(),
            json!({ "payload": "[1,2,3]" }).to_string(),
            json!({ "payload": "\"just a string\"" }).to_string(),
        ];
        for body in cases {
            assert!(
                matches!(decode_message_body(&body), Err(Error::Validation(_))),
                "expected validation error for {}",
                body
            );
        }
    }

    #[test]
    fn requires_uuid_sender_and_body() {
        let payload = IngestCandidatePayload {
            uuid: Some("abc-1".into()),
            message_body: Some(envelope(&json!({}))),
            sender: Some("  ".into()),
            tags: vec![],
        };
        assert!(matches!(payload.into_new_candidate(), Err(Error::Validation(_))));

        let payload = IngestCandidatePayload {
            uuid: None,
            message_body: Some(envelope(&json!({}))),
            sender: Some("+391234567".into()),
            tags: vec![],
        };
        assert!(payload.into_new_candidate().is_err());
    }

    #[test]
    fn builds_candidate_and_trims_tags() {
        let payload = IngestCandidatePayload {
            uuid: Some("abc-1".into()),
            message_body: Some(envelope(&json!({ "fullName": "Ada Lovelace" }))),
            sender: Some("+391234567".into()),
            tags: vec![" Rust ".into(), "".into(), "Go".into()],
        };
        let (candidate, tags) = payload.into_new_candidate().unwrap();
        assert_eq!(candidate.uuid, "abc-1");
        assert_eq!(candidate.full_name, "Ada Lovelace");
        assert_eq!(tags, vec!["Rust".to_string(), "Go".to_string()]);
    }
}
