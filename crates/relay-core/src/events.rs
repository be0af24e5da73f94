//! Progress event protocol: the wire format of a workflow run.
//!
//! A run is observed as an ordered, push-only stream of messages. Each
//! message is framed as one server-sent-events unit:
//!
//! ```text
//! data: {"status":"started","current_agent":"A","step_index":1,...}\n\n
//! data: {"status":"completed","current_agent":"A",...}\n\n
//! data: {"final":{"workflow":"A -> B","steps":[...],"final_output":"y"}}\n\n
//! ```
//!
//! The stream ends after exactly one `failed` progress event or one final
//! result. A stream that closes without a final result is an incomplete run.

use serde::{Deserialize, Serialize};

/// Maximum number of characters of a step output carried in its preview.
pub const OUTPUT_PREVIEW_CHARS: usize = 400;

const FRAME_PREFIX: &str = "data: ";
const FRAME_SUFFIX: &str = "\n\n";

/// Status of a single step transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Started,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// One observable state transition of a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub status: StepStatus,
    pub current_agent: String,
    /// 1-based position of the step in the chain
    pub step_index: usize,
    pub total_steps: usize,
    pub message: String,
    /// Optional payload, e.g. `{"output_preview": "..."}`. A JSON `null`
    /// payload is stored as `None`; both encode as `"data": null`.
    #[serde(default)]
    data: Option<serde_json::Value>,
}

impl ProgressEvent {
    pub fn started(agent: &str, step_index: usize, total_steps: usize) -> Self {
        Self {
            status: StepStatus::Started,
            current_agent: agent.to_string(),
            step_index,
            total_steps,
            message: format!("{} started", agent),
            data: None,
        }
    }

    pub fn completed(agent: &str, step_index: usize, total_steps: usize, output: &str) -> Self {
        Self {
            status: StepStatus::Completed,
            current_agent: agent.to_string(),
            step_index,
            total_steps,
            message: format!("{} completed", agent),
            data: Some(serde_json::json!({ "output_preview": output_preview(output) })),
        }
    }

    pub fn failed(
        agent: &str,
        step_index: usize,
        total_steps: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status: StepStatus::Failed,
            current_agent: agent.to_string(),
            step_index,
            total_steps,
            message: message.into(),
            data: None,
        }
    }

    /// Attach a payload. `null` clears it.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = (!data.is_null()).then_some(data);
        self
    }

    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }

    /// The preview attached to a `completed` event, if any.
    pub fn output_preview(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.get("output_preview"))
            .and_then(|p| p.as_str())
    }
}

/// Summary of a fully successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResult {
    /// Agent names joined as `"A -> B -> C"`
    pub workflow: String,
    /// The `completed` events of the run, one per agent, in order
    pub steps: Vec<ProgressEvent>,
    pub final_output: Option<String>,
}

/// One unit of the event stream.
///
/// A final result is wrapped under a top-level `final` key to distinguish it
/// from a progress event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkflowMessage {
    Final {
        #[serde(rename = "final")]
        result: FinalResult,
    },
    Progress(ProgressEvent),
}

impl WorkflowMessage {
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final { .. })
    }

    /// Whether the stream must end after this message.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Final { .. } => true,
            Self::Progress(event) => event.status == StepStatus::Failed,
        }
    }

    pub fn as_progress(&self) -> Option<&ProgressEvent> {
        match self {
            Self::Progress(event) => Some(event),
            Self::Final { .. } => None,
        }
    }

    pub fn as_final(&self) -> Option<&FinalResult> {
        match self {
            Self::Final { result } => Some(result),
            Self::Progress(_) => None,
        }
    }

    /// JSON body of the message, as carried in the `data:` field.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(json).map_err(|e| ProtocolError::Decode(e.to_string()))
    }

    /// Full wire frame: `data: <json>\n\n`.
    pub fn encode_frame(&self) -> Result<String, ProtocolError> {
        Ok(format!("{}{}{}", FRAME_PREFIX, self.to_json()?, FRAME_SUFFIX))
    }

    /// Decode a single frame produced by [`WorkflowMessage::encode_frame`].
    pub fn decode_frame(frame: &str) -> Result<Self, ProtocolError> {
        let body = frame
            .trim_end_matches('\n')
            .strip_prefix(FRAME_PREFIX)
            .ok_or_else(|| ProtocolError::Frame(format!("missing '{}' prefix", FRAME_PREFIX.trim())))?;
        Self::from_json(body)
    }
}

impl From<ProgressEvent> for WorkflowMessage {
    fn from(event: ProgressEvent) -> Self {
        Self::Progress(event)
    }
}

impl From<FinalResult> for WorkflowMessage {
    fn from(result: FinalResult) -> Self {
        Self::Final { result }
    }
}

/// Split a raw event-stream body into its messages, in order.
pub fn decode_stream(body: &str) -> Result<Vec<WorkflowMessage>, ProtocolError> {
    body.split(FRAME_SUFFIX)
        .filter(|chunk| !chunk.trim().is_empty())
        .map(WorkflowMessage::decode_frame)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Failed to encode event: {0}")]
    Encode(String),

    #[error("Failed to decode event: {0}")]
    Decode(String),

    #[error("Malformed frame: {0}")]
    Frame(String),
}

/// First [`OUTPUT_PREVIEW_CHARS`] characters of a step output.
pub fn output_preview(output: &str) -> String {
    output.chars().take(OUTPUT_PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_final() -> FinalResult {
        FinalResult {
            workflow: "A -> B".to_string(),
            steps: vec![
                ProgressEvent::completed("A", 1, 2, "x"),
                ProgressEvent::completed("B", 2, 2, "y"),
            ],
            final_output: Some("y".to_string()),
        }
    }

    #[test]
    fn test_progress_event_json_shape() {
        let json = serde_json::to_value(WorkflowMessage::from(ProgressEvent::started("A", 1, 2)))
            .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "started",
                "current_agent": "A",
                "step_index": 1,
                "total_steps": 2,
                "message": "A started",
                "data": null
            })
        );
    }

    #[test]
    fn test_final_result_is_wrapped() {
        let json = serde_json::to_value(WorkflowMessage::from(sample_final())).unwrap();
        assert_eq!(json["final"]["workflow"], "A -> B");
        assert_eq!(json["final"]["final_output"], "y");
        assert_eq!(json["final"]["steps"][1]["data"]["output_preview"], "y");
        assert!(json.get("status").is_none());
    }

    #[test]
    fn test_frame_round_trip() {
        let messages = vec![
            WorkflowMessage::from(ProgressEvent::completed("A", 1, 2, "x")),
            WorkflowMessage::from(ProgressEvent::failed("B", 2, 2, "B timed out after 30s")),
            WorkflowMessage::from(sample_final()),
        ];
        for msg in messages {
            let frame = msg.encode_frame().unwrap();
            assert!(frame.starts_with("data: {"));
            assert!(frame.ends_with("}\n\n"));
            assert_eq!(WorkflowMessage::decode_frame(&frame).unwrap(), msg);
        }
    }

    #[test]
    fn test_null_payload_round_trips_as_absent() {
        let event = ProgressEvent::started("A", 1, 2).with_data(serde_json::Value::Null);
        assert_eq!(event.data(), None);

        let msg = WorkflowMessage::from(event);
        let frame = msg.encode_frame().unwrap();
        assert!(frame.contains("\"data\":null"));
        assert_eq!(WorkflowMessage::decode_frame(&frame).unwrap(), msg);

        let event = ProgressEvent::started("A", 1, 2).with_data(serde_json::json!({ "attempt": 2 }));
        let msg = WorkflowMessage::from(event);
        let decoded = WorkflowMessage::decode_frame(&msg.encode_frame().unwrap()).unwrap();
        assert_eq!(decoded.as_progress().unwrap().data().unwrap()["attempt"], 2);
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_decode_stream_preserves_order() {
        let body = [
            WorkflowMessage::from(ProgressEvent::started("A", 1, 2)),
            WorkflowMessage::from(ProgressEvent::completed("A", 1, 2, "x")),
            WorkflowMessage::from(sample_final()),
        ]
        .iter()
        .map(|m| m.encode_frame().unwrap())
        .collect::<String>();

        let decoded = decode_stream(&body).unwrap();
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0].as_progress().unwrap().status, StepStatus::Started);
        assert_eq!(decoded[1].as_progress().unwrap().output_preview(), Some("x"));
        assert!(decoded[2].is_final());
    }

    #[test]
    fn test_decode_frame_rejects_garbage() {
        assert!(matches!(
            WorkflowMessage::decode_frame("event: ping\n\n"),
            Err(ProtocolError::Frame(_))
        ));
        assert!(matches!(
            WorkflowMessage::decode_frame("data: {\"nope\":1}\n\n"),
            Err(ProtocolError::Decode(_))
        ));
    }

    #[test]
    fn test_output_preview_counts_chars() {
        let long = "é".repeat(OUTPUT_PREVIEW_CHARS + 50);
        let preview = output_preview(&long);
        assert_eq!(preview.chars().count(), OUTPUT_PREVIEW_CHARS);

        let event = ProgressEvent::completed("A", 1, 2, &long);
        assert_eq!(
            event.output_preview().unwrap().chars().count(),
            OUTPUT_PREVIEW_CHARS
        );
        assert_eq!(output_preview("short"), "short");
    }

    #[test]
    fn test_terminal_messages() {
        assert!(!WorkflowMessage::from(ProgressEvent::started("A", 1, 2)).is_terminal());
        assert!(!WorkflowMessage::from(ProgressEvent::completed("A", 1, 2, "x")).is_terminal());
        assert!(WorkflowMessage::from(ProgressEvent::failed("A", 1, 2, "boom")).is_terminal());
        assert!(WorkflowMessage::from(sample_final()).is_terminal());
    }
}
