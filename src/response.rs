//! Controller response classification.
//!
//! Every controller envelope carries `RETURN_CODE`, `MESSAGE`, optionally
//! `DATA`, and optionally `ERROR`. [`ResponseHandler::classify`] is a pure
//! function from envelope + verb to a [`RequestResult`]: GETs are judged on
//! found-ness (404 is "absent", not an error), mutating verbs on whether the
//! controller accepted the change.

use crate::error::{Error, Result};
use crate::sender::Verb;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Classified outcome of one controller request.
///
/// `found` is populated only for GET, `changed` only for mutating verbs;
/// both are derived from the envelope and never independently settable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestResult {
    /// Whether the controller handled the request successfully
    pub success: bool,
    /// Whether the request mutated controller state (mutating verbs only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed: Option<bool>,
    /// Whether the requested resource exists (GET only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found: Option<bool>,
}

impl RequestResult {
    /// Serializes the result for accumulation in a task history.
    pub fn to_value(self) -> Value {
        // Safe for a struct of plain booleans.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Stateless classifier for controller response envelopes.
pub struct ResponseHandler;

impl ResponseHandler {
    /// Classifies a raw envelope for the given verb.
    ///
    /// # Errors
    ///
    /// `MissingField` when `RETURN_CODE` or `MESSAGE` is absent; the
    /// envelope contract is controller-owned, so absence is a fatal
    /// violation rather than a recoverable condition.
    pub fn classify(response: &Value, verb: Verb) -> Result<RequestResult> {
        let return_code = response
            .get("RETURN_CODE")
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::MissingField {
                field: "RETURN_CODE",
                response: response.to_string(),
            })?;
        let message = response
            .get("MESSAGE")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::MissingField {
                field: "MESSAGE",
                response: response.to_string(),
            })?;

        match verb {
            Verb::Get => Ok(Self::classify_get(return_code, message)),
            Verb::Post | Verb::Put | Verb::Delete => {
                Ok(Self::classify_mutating(response, message))
            }
        }
    }

    fn classify_get(return_code: i64, message: &str) -> RequestResult {
        // 404 "Not Found" is a clean negative: the resource is absent and
        // the controller said so successfully.
        let (success, found) = if return_code == 404 && message == "Not Found" {
            (true, false)
        } else if !(return_code == 200 || return_code == 404) || message != "OK" {
            (false, false)
        } else {
            (true, true)
        };
        RequestResult {
            success,
            changed: None,
            found: Some(found),
        }
    }

    fn classify_mutating(response: &Value, message: &str) -> RequestResult {
        let failed = response.get("ERROR").is_some() || message != "OK";
        RequestResult {
            success: !failed,
            changed: Some(!failed),
            found: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_ok_is_found_and_successful() {
        let response = json!({"RETURN_CODE": 200, "MESSAGE": "OK", "DATA": {}});
        let result = ResponseHandler::classify(&response, Verb::Get).unwrap();
        assert!(result.success);
        assert_eq!(result.found, Some(true));
        assert_eq!(result.changed, None);
    }

    #[test]
    fn get_404_not_found_is_absent_not_an_error() {
        let response = json!({"RETURN_CODE": 404, "MESSAGE": "Not Found"});
        let result = ResponseHandler::classify(&response, Verb::Get).unwrap();
        assert!(result.success);
        assert_eq!(result.found, Some(false));
    }

    #[test]
    fn get_404_with_other_message_fails() {
        let response = json!({"RETURN_CODE": 404, "MESSAGE": "Resource gone"});
        let result = ResponseHandler::classify(&response, Verb::Get).unwrap();
        assert!(!result.success);
        assert_eq!(result.found, Some(false));
    }

    #[test]
    fn get_500_fails() {
        let response = json!({"RETURN_CODE": 500, "MESSAGE": "OK"});
        let result = ResponseHandler::classify(&response, Verb::Get).unwrap();
        assert!(!result.success);
        assert_eq!(result.found, Some(false));
    }

    #[test]
    fn post_ok_is_changed() {
        let response = json!({"RETURN_CODE": 200, "MESSAGE": "OK"});
        let result = ResponseHandler::classify(&response, Verb::Post).unwrap();
        assert!(result.success);
        assert_eq!(result.changed, Some(true));
        assert_eq!(result.found, None);
    }

    #[test]
    fn mutating_error_key_fails_regardless_of_return_code() {
        for verb in [Verb::Post, Verb::Put, Verb::Delete] {
            let response = json!({
                "RETURN_CODE": 200,
                "MESSAGE": "OK",
                "ERROR": "Internal failure"
            });
            let result = ResponseHandler::classify(&response, verb).unwrap();
            assert!(!result.success, "{verb} should fail on ERROR key");
            assert_eq!(result.changed, Some(false));
        }
    }

    #[test]
    fn mutating_non_ok_message_fails() {
        let response = json!({"RETURN_CODE": 200, "MESSAGE": "Invalid payload"});
        let result = ResponseHandler::classify(&response, Verb::Put).unwrap();
        assert!(!result.success);
        assert_eq!(result.changed, Some(false));
    }

    #[test]
    fn missing_return_code_is_contract_violation() {
        let response = json!({"MESSAGE": "OK"});
        let err = ResponseHandler::classify(&response, Verb::Get).unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "RETURN_CODE", .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn missing_message_is_contract_violation() {
        let response = json!({"RETURN_CODE": 200});
        let err = ResponseHandler::classify(&response, Verb::Delete).unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "MESSAGE", .. }));
    }

    #[test]
    fn result_serialization_omits_absent_fields() {
        let result = RequestResult {
            success: true,
            changed: None,
            found: Some(true),
        };
        let value = result.to_value();
        assert_eq!(value, json!({"success": true, "found": true}));
    }
}
