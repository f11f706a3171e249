//! Wire messages of the announcement websocket.
//!
//! Example frames:
//! ```json
//! {"type":"COMMAND","subType":"SUBSCRIBE","data":"SUCCESS","code":"00000000"}
//! {"type":"DATA","topic":"com_announcement_en","data":"{\"catalogId\":161,...}"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::port::FeedMessage;

/// Subscribe command sent after the transport opens.
#[derive(Debug, Serialize)]
pub struct SubscribeCommand<'a> {
    pub command: &'static str,
    pub value: &'a str,
}

impl<'a> SubscribeCommand<'a> {
    #[must_use]
    pub const fn new(topic: &'a str) -> Self {
        Self {
            command: "SUBSCRIBE",
            value: topic,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum WireMessage {
    #[serde(rename = "COMMAND")]
    Command {
        #[serde(rename = "subType", default)]
        sub_type: String,
        #[serde(default)]
        data: Value,
    },
    #[serde(rename = "DATA")]
    Data {
        #[serde(default)]
        topic: String,
        #[serde(default)]
        data: Value,
    },
    #[serde(other)]
    Other,
}

/// Decode one text frame.
///
/// # Errors
///
/// Returns an error only when the frame is not JSON. JSON of an unexpected
/// shape decodes to [`FeedMessage::Unrecognized`].
pub fn decode(text: &str) -> serde_json::Result<FeedMessage> {
    let value: Value = serde_json::from_str(text)?;
    let Ok(wire) = serde_json::from_value::<WireMessage>(value) else {
        return Ok(FeedMessage::Unrecognized);
    };

    Ok(match wire {
        WireMessage::Command { sub_type, data } if sub_type == "SUBSCRIBE" => {
            let detail = match data {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            FeedMessage::SubscribeAck {
                ok: detail == "SUCCESS",
                detail,
            }
        }
        WireMessage::Data { topic, data } if !topic.is_empty() => match data {
            Value::String(payload) => FeedMessage::Data { topic, payload },
            Value::Null => FeedMessage::Unrecognized,
            other => FeedMessage::Data {
                topic,
                payload: other.to_string(),
            },
        },
        _ => FeedMessage::Unrecognized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_command_shape() {
        let json = serde_json::to_string(&SubscribeCommand::new("com_announcement_en")).unwrap();
        assert_eq!(json, r#"{"command":"SUBSCRIBE","value":"com_announcement_en"}"#);
    }

    #[test]
    fn decodes_subscribe_success() {
        let msg = decode(r#"{"type":"COMMAND","subType":"SUBSCRIBE","data":"SUCCESS","code":"00000000"}"#)
            .unwrap();
        assert_eq!(
            msg,
            FeedMessage::SubscribeAck {
                ok: true,
                detail: "SUCCESS".into()
            }
        );
    }

    #[test]
    fn decodes_subscribe_failure() {
        let msg = decode(r#"{"type":"COMMAND","subType":"SUBSCRIBE","data":"Invalid topic"}"#).unwrap();
        assert_eq!(
            msg,
            FeedMessage::SubscribeAck {
                ok: false,
                detail: "Invalid topic".into()
            }
        );
    }

    #[test]
    fn decodes_data_with_string_payload() {
        let msg = decode(
            r#"{"type":"DATA","topic":"com_announcement_en","data":"{\"catalogId\":161,\"title\":\"New Listing\"}"}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            FeedMessage::Data {
                topic: "com_announcement_en".into(),
                payload: r#"{"catalogId":161,"title":"New Listing"}"#.into()
            }
        );
    }

    #[test]
    fn other_shapes_are_unrecognized() {
        for text in [
            r#"{"type":"COMMAND","subType":"UNSUBSCRIBE","data":"SUCCESS"}"#,
            r#"{"type":"HEARTBEAT"}"#,
            r#"{"type":"DATA","data":"{}"}"#,
            r#"{"hello":"world"}"#,
            r#"[1,2,3]"#,
        ] {
            assert_eq!(decode(text).unwrap(), FeedMessage::Unrecognized, "{text}");
        }
    }

    #[test]
    fn non_json_is_an_error() {
        assert!(decode("not json").is_err());
    }
}
