//! Relay wire contract.
//!
//! The relay forwards JSON text between the viewer and the statistical
//! backend. Inbound `tree` and `groups` messages carry their payloads as
//! JSON-encoded strings inside the outer object; both the nested string form
//! and a plain JSON value are accepted here. Outbound traffic is the client
//! handshake and method calls that ask the backend to edit the tree.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ProtocolError;
use crate::graph::Node;
use crate::groups::Groups;

/// Liveness probe sent by the relay as bare text.
pub const PROBE: &str = "test_message";
/// Bare-text reply to [`PROBE`].
pub const PROBE_RECEIPT: &str = "test_receipt";
/// Client id announced in the handshake.
pub const CLIENT_ID: &str = "frontend";

/// Decoded contents of a `tree` message.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TreeMessage {
    pub nodes: Vec<Node>,
    pub globals: HashSet<String>,
    pub global_limit: Option<f32>,
    pub groups: Groups,
    /// Session id of the backend run, when it sends one.
    pub sid: Option<String>,
}

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayMessage {
    Probe,
    Tree(TreeMessage),
    Groups(Groups),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl RelayMessage {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        if text == PROBE {
            return Ok(Self::Probe);
        }
        let envelope: Envelope = serde_json::from_str(text)?;
        let fields = &envelope.fields;
        match envelope.kind.as_str() {
            "tree" => Ok(Self::Tree(TreeMessage {
                nodes: nested(fields, "tree")?.ok_or(ProtocolError::MissingField("tree"))?,
                globals: nested(fields, "globals")?.unwrap_or_default(),
                global_limit: nested(fields, "global_limit")?,
                groups: nested(fields, "groups")?.unwrap_or_default(),
                sid: nested(fields, "sid")?,
            })),
            "groups" => Ok(Self::Groups(
                nested(fields, "groups")?.ok_or(ProtocolError::MissingField("groups"))?,
            )),
            other => Err(ProtocolError::UnknownType(other.to_owned())),
        }
    }
}

/// Read `key`, decoding a string-encoded payload when needed.
///
/// A missing key and an explicit `null` both yield `None`.
fn nested<T: DeserializeOwned>(
    fields: &Map<String, Value>,
    key: &str,
) -> Result<Option<T>, ProtocolError> {
    let Some(value) = fields.get(key) else {
        return Ok(None);
    };
    let decoded = match value {
        Value::String(text) => match serde_json::from_str::<Option<T>>(text) {
            Ok(decoded) => decoded,
            // Plain strings (a bare `sid`) are not JSON documents.
            Err(_) => serde_json::from_value(value.clone())?,
        },
        other => serde_json::from_value(other.clone())?,
    };
    Ok(decoded)
}

/// Edit requests understood by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "args", rename_all = "snake_case")]
pub enum MethodCall {
    GetTree {},
    DivideBranch {
        node_name: String,
        params_kept: Vec<String>,
    },
    AutoDivide {
        node_name: String,
    },
    ExtrudeBranch {
        node_name: String,
        params_kept: Vec<String>,
    },
    MergeNodes {
        node_name: String,
        alt_node_name: String,
    },
    AutoMerge {},
    ResetTree {},
    DefineGroup {
        group_name: String,
        node_names: Vec<String>,
    },
    DeleteGroup {
        group_name: String,
    },
}

/// A message sent from the viewer to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    Id { id: String },
    Method(MethodCall),
}

impl Outbound {
    /// Identifies this connection to the relay.
    pub fn handshake() -> Self {
        Outbound::Id {
            id: CLIENT_ID.to_owned(),
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<MethodCall> for Outbound {
    fn from(call: MethodCall) -> Self {
        Outbound::Method(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_tree_message_with_nested_strings() {
        let tree = json!([
            {"name": "1", "parent": "", "ered": 0.0, "params": ["a[1]", "a[2]"]},
            {"name": "2", "parent": "1", "ered": 0.5, "params": ["a[1]"]},
        ]);
        let text = json!({
            "type": "tree",
            "tree": tree.to_string(),
            "globals": json!(["sigma"]).to_string(),
            "global_limit": "0.25",
            "groups": json!({"g": ["2"]}).to_string(),
            "sid": "run-7",
        })
        .to_string();

        let RelayMessage::Tree(message) = RelayMessage::decode(&text).unwrap() else {
            panic!("expected a tree message");
        };
        assert_eq!(message.nodes.len(), 2);
        assert_eq!(message.nodes[1].parent, "1");
        assert!(message.globals.contains("sigma"));
        assert_eq!(message.global_limit, Some(0.25));
        assert!(message.groups.contains("g"));
        assert_eq!(message.sid.as_deref(), Some("run-7"));
    }

    #[test]
    fn test_null_limit_and_missing_optionals() {
        let text = json!({
            "type": "tree",
            "tree": "[{\"name\":\"r\",\"ered\":0}]",
            "global_limit": "null",
        })
        .to_string();
        let RelayMessage::Tree(message) = RelayMessage::decode(&text).unwrap() else {
            panic!("expected a tree message");
        };
        assert_eq!(message.global_limit, None);
        assert!(message.globals.is_empty());
        assert!(message.groups.is_empty());
    }

    #[test]
    fn test_decode_groups_message() {
        let text = json!({"type": "groups", "groups": "{\"focus\":[\"3\",\"4\"]}"}).to_string();
        let RelayMessage::Groups(groups) = RelayMessage::decode(&text).unwrap() else {
            panic!("expected a groups message");
        };
        assert_eq!(groups.get("focus").map(|g| g.len()), Some(2));
    }

    #[test]
    fn test_probe_and_errors() {
        assert_eq!(RelayMessage::decode(PROBE).unwrap(), RelayMessage::Probe);
        assert!(matches!(
            RelayMessage::decode(r#"{"type":"weather"}"#),
            Err(ProtocolError::UnknownType(t)) if t == "weather"
        ));
        assert!(matches!(
            RelayMessage::decode("{not json"),
            Err(ProtocolError::Json(_))
        ));
        assert!(matches!(
            RelayMessage::decode(r#"{"type":"tree"}"#),
            Err(ProtocolError::MissingField("tree"))
        ));
    }

    #[test]
    fn test_outbound_shapes() {
        let handshake: Value =
            serde_json::from_str(&Outbound::handshake().to_json().unwrap()).unwrap();
        assert_eq!(handshake, json!({"type": "id", "id": "frontend"}));

        let call: Outbound = MethodCall::MergeNodes {
            node_name: "3".into(),
            alt_node_name: "4".into(),
        }
        .into();
        let value: Value = serde_json::from_str(&call.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "method",
                "method": "merge_nodes",
                "args": {"node_name": "3", "alt_node_name": "4"},
            })
        );

        let json = Outbound::from(MethodCall::GetTree {}).to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, json!({"type": "method", "method": "get_tree", "args": {}}));
    }
}
