//! Map message protocol
//!
//! JSON messages exchanged between the host and the generated map document,
//! tagged by an `action` field.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A message to or from the map document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum MapMessage {
    /// Document → host: a marker was tapped
    #[serde(rename = "stopSelected")]
    StopSelected { index: usize },

    /// Host → document: pan to a stop
    #[serde(rename = "centerStop")]
    CenterStop { index: usize },

    /// Host → document: refresh a stop's popup with new ETAs
    #[serde(rename = "updateETA")]
    UpdateEta { index: usize, eta: Vec<String> },

    /// Document → host: the map failed to initialize
    #[serde(rename = "error")]
    Error { message: String },
}

impl MapMessage {
    /// Parse a message received from the document
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize for posting to the document
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stop_selected_wire_format() {
        let msg = MapMessage::parse(r#"{"action":"stopSelected","index":4}"#).unwrap();
        assert_eq!(msg, MapMessage::StopSelected { index: 4 });
    }

    #[test]
    fn test_update_eta_wire_format() {
        let msg = MapMessage::UpdateEta {
            index: 2,
            eta: vec!["3 mins".to_string(), "Arriving soon".to_string()],
        };
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"action": "updateETA", "index": 2, "eta": ["3 mins", "Arriving soon"]})
        );
    }

    #[test]
    fn test_center_stop_wire_format() {
        let value: serde_json::Value =
            serde_json::from_str(&MapMessage::CenterStop { index: 0 }.to_json().unwrap()).unwrap();
        assert_eq!(value, json!({"action": "centerStop", "index": 0}));
    }

    #[test]
    fn test_error_message() {
        let msg = MapMessage::parse(r#"{"action":"error","message":"L is not defined"}"#).unwrap();
        assert_eq!(
            msg,
            MapMessage::Error {
                message: "L is not defined".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_action_rejected() {
        assert!(MapMessage::parse(r#"{"action":"zoom","level":3}"#).is_err());
        assert!(MapMessage::parse("not json").is_err());
    }

    #[test]
    fn test_negative_index_rejected() {
        assert!(MapMessage::parse(r#"{"action":"stopSelected","index":-1}"#).is_err());
    }
}
