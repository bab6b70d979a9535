//! Processing Loop Tests
//!
//! Drive a session end to end with raw JSON lines, the way the stdin and
//! WebSocket transports do, and check the JSON that comes back.

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use posture_guard::pipeline::source::{parse_message, VecSink};
use posture_guard::pipeline::{MessageEvent, MessageSource, PostureSession, ProcessingLoop};
use posture_guard::synthetic::{SyntheticFrameBuilder, SyntheticPose};
use posture_guard::{ClientMessage, ServerMessage};

/// Source over in-memory JSON lines.
struct LineSource {
    lines: std::vec::IntoIter<String>,
}

impl LineSource {
    fn new(lines: Vec<String>) -> Self {
        Self {
            lines: lines.into_iter(),
        }
    }
}

#[async_trait]
impl MessageSource for LineSource {
    async fn next_message(&mut self) -> Result<MessageEvent> {
        Ok(match self.lines.next() {
            Some(line) => parse_message(&line),
            None => MessageEvent::Eof,
        })
    }

    fn source_name(&self) -> &str {
        "lines"
    }
}

fn frame_line(pose: &SyntheticPose, second: i64) -> String {
    let frame = SyntheticFrameBuilder::new(640, 480).build_at(pose, 1_700_000_000_000 + second * 1000);
    serde_json::to_string(&ClientMessage::Frame { frame }).unwrap()
}

async fn run(lines: Vec<String>) -> (posture_guard::pipeline::SessionSummary, Vec<serde_json::Value>) {
    let mut source = LineSource::new(lines);
    let mut sink = VecSink::default();
    let summary = ProcessingLoop::new(PostureSession::default(), CancellationToken::new())
        .run(&mut source, &mut sink)
        .await;
    let replies = sink
        .messages
        .iter()
        .map(|m| serde_json::from_str(&m.to_json().unwrap()).unwrap())
        .collect();
    (summary, replies)
}

#[tokio::test]
async fn slouching_session_warns_over_the_wire() {
    let upright = SyntheticPose::upright(60.0);
    let slouch = SyntheticPose {
        pitch: -18.0,
        ..upright
    };

    let mut lines = vec![frame_line(&upright, 0), r#"{"type":"calibrate"}"#.to_string()];
    lines.extend((1..=6).map(|s| frame_line(&slouch, s)));
    lines.push(r#"{"type":"get_statistics"}"#.to_string());

    let (summary, replies) = run(lines).await;
    assert_eq!(summary.frames_processed, 7);
    assert_eq!(summary.invalid_messages, 0);
    assert_eq!(replies.len(), 9);

    assert_eq!(replies[0]["type"], "result");
    assert_eq!(replies[0]["status"], "unknown");
    assert_eq!(replies[1]["type"], "calibrated");
    assert_eq!(replies[1]["success"], true);

    let warning = &replies[7];
    assert_eq!(warning["type"], "result");
    assert_eq!(warning["status"], "bad");
    assert_eq!(warning["bad_duration"], 5);
    assert_eq!(warning["should_warn"], true);
    assert_eq!(warning["issues"], serde_json::json!(["head_pitch_down"]));
    assert!(warning["message"]
        .as_str()
        .unwrap()
        .contains("head tilted down"));

    let stats = &replies[8];
    assert_eq!(stats["type"], "statistics");
    assert_eq!(stats["current_bad_duration"], 5);
}

#[tokio::test]
async fn malformed_lines_get_error_replies_and_the_session_continues() {
    let lines = vec![
        "{not json".to_string(),
        r#"{"type":"launch_rockets"}"#.to_string(),
        r#"{"type":"reset"}"#.to_string(),
    ];
    let (summary, replies) = run(lines).await;

    assert_eq!(summary.invalid_messages, 2);
    assert_eq!(summary.messages_handled, 1);
    assert_eq!(replies[0]["type"], "error");
    assert_eq!(replies[1]["type"], "error");
    assert_eq!(replies[2]["type"], "reset_done");
}

#[tokio::test]
async fn sensitivity_and_threshold_updates_reply_with_new_values() {
    let lines = vec![
        r#"{"type":"set_sensitivity","levels":{"pitch":1}}"#.to_string(),
        r#"{"type":"set_thresholds","thresholds":{"pitch":-8,"distance":12,"roll":20,"shoulder_tilt":9}}"#
            .to_string(),
    ];
    let (_, replies) = run(lines).await;

    assert_eq!(replies[0]["type"], "thresholds_updated");
    assert_eq!(replies[0]["thresholds"]["pitch"], -20.0);
    assert_eq!(replies[0]["thresholds"]["roll"], 15.0);
    assert_eq!(replies[1]["thresholds"]["distance"], 12.0);
}

#[tokio::test]
async fn calibration_without_any_frame_fails_cleanly() {
    let (_, replies) = run(vec![r#"{"type":"calibrate"}"#.to_string()]).await;
    assert_eq!(replies[0]["type"], "calibrated");
    assert_eq!(replies[0]["success"], false);
    assert!(replies[0]["error"].is_string());
}

#[tokio::test]
async fn server_messages_parse_back() {
    let (_, replies) = run(vec![
        frame_line(&SyntheticPose::upright(55.0), 0),
        r#"{"type":"get_statistics"}"#.to_string(),
    ])
    .await;
    for reply in replies {
        let parsed: ServerMessage = serde_json::from_value(reply).unwrap();
        assert!(!matches!(parsed, ServerMessage::Error { .. }));
    }
}
