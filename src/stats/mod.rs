//! Wire types for the backend's `GET /stats` response.
//!
//! ```json
//! {
//!   "tags_detected": 2,
//!   "processing_fps": 14.7,
//!   "last_detection_time": "12:03:04",
//!   "pose_data": [
//!     { "tag_id": 5, "distance": 0.842,
//!       "position": { "x": 0.1, "y": -0.2, "z": 1.5 },
//!       "angles": { "roll": 1.0, "pitch": -2.0, "yaw": 90.0 },
//!       "direction": [0, 0, 1] }
//!   ]
//! }
//! ```
//!
//! Pose entries are validated one by one: an entry with a missing or
//! mistyped field is dropped and reported in [`ParsedStats::skipped`], the
//! rest of the payload is kept.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One poll result, as rendered by the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsPayload {
    #[serde(default)]
    pub tags_detected: Option<u64>,
    #[serde(default)]
    pub processing_fps: Option<f64>,
    #[serde(default)]
    pub last_detection_time: Option<String>,
    /// Absent on backends that only report aggregate counters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose_data: Option<Vec<PoseEntry>>,
}

/// Estimated 6-DoF pose of a single tag relative to the camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseEntry {
    pub tag_id: i64,
    /// Distance to the tag in meters.
    pub distance: f64,
    pub position: Position,
    pub angles: Angles,
    /// Unit vector from the camera towards the tag.
    pub direction: [f64; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Orientation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Angles {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

/// A pose entry that failed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntry {
    /// Position of the entry in the original `pose_data` array.
    pub index: usize,
    pub reason: String,
}

/// Result of decoding a `/stats` body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedStats {
    pub payload: StatsPayload,
    pub skipped: Vec<SkippedEntry>,
}

/// Top-level shape with pose entries left undecoded.
#[derive(Deserialize)]
struct RawStats {
    #[serde(default)]
    tags_detected: Option<u64>,
    #[serde(default)]
    processing_fps: Option<f64>,
    #[serde(default)]
    last_detection_time: Option<String>,
    #[serde(default)]
    pose_data: Option<Vec<serde_json::Value>>,
}

impl StatsPayload {
    /// Decode a `/stats` response body.
    ///
    /// Fails only if the body is not a JSON object of the expected top-level
    /// shape; malformed pose entries are skipped.
    pub fn parse(body: &str) -> Result<ParsedStats> {
        let raw: RawStats = serde_json::from_str(body).context("invalid /stats JSON body")?;
        Ok(Self::from_raw(raw))
    }

    /// Same as [`parse`](Self::parse) for an already decoded JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<ParsedStats> {
        let raw: RawStats = serde_json::from_value(value).context("invalid /stats JSON body")?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawStats) -> ParsedStats {
        let mut skipped = Vec::new();
        let pose_data = raw.pose_data.map(|entries| {
            entries
                .into_iter()
                .enumerate()
                .filter_map(
                    |(index, value)| match serde_json::from_value::<PoseEntry>(value) {
                        Ok(entry) => Some(entry),
                        Err(e) => {
                            skipped.push(SkippedEntry {
                                index,
                                reason: e.to_string(),
                            });
                            None
                        }
                    },
                )
                .collect()
        });

        ParsedStats {
            payload: StatsPayload {
                tags_detected: raw.tags_detected,
                processing_fps: raw.processing_fps,
                last_detection_time: raw.last_detection_time,
                pose_data,
            },
            skipped,
        }
    }

    /// Pose entries in backend order; empty when the field was absent.
    pub fn poses(&self) -> &[PoseEntry] {
        self.pose_data.as_deref().unwrap_or(&[])
    }

    /// The entry shown in the summary panel.
    ///
    /// This is simply the first array element. The backend does not promise
    /// that it is the nearest or most recent tag.
    pub fn first_entry(&self) -> Option<&PoseEntry> {
        self.poses().first()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"{
        "tags_detected": 2,
        "processing_fps": 14.7,
        "last_detection_time": "12:03:04",
        "pose_data": [
            {"tag_id": 5, "distance": 0.842,
             "position": {"x": 0.1, "y": -0.2, "z": 1.5},
             "angles": {"roll": 1.0, "pitch": -2.0, "yaw": 90.0},
             "direction": [0, 0, 1]}
        ]
    }"#;

    #[test]
    fn parses_full_payload() {
        let parsed = StatsPayload::parse(SCENARIO).unwrap();
        assert!(parsed.skipped.is_empty());

        let payload = parsed.payload;
        assert_eq!(payload.tags_detected, Some(2));
        assert_eq!(payload.processing_fps, Some(14.7));
        assert_eq!(payload.last_detection_time.as_deref(), Some("12:03:04"));

        let first = payload.first_entry().unwrap();
        assert_eq!(first.tag_id, 5);
        assert_eq!(first.position.z, 1.5);
        assert_eq!(first.angles.yaw, 90.0);
        assert_eq!(first.direction, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn simple_backend_without_pose_data() {
        let parsed =
            StatsPayload::parse(r#"{"tags_detected":0,"processing_fps":0,"last_detection_time":null}"#)
                .unwrap();
        assert_eq!(parsed.payload.pose_data, None);
        assert!(parsed.payload.poses().is_empty());
        assert_eq!(parsed.payload.last_detection_time, None);
    }

    #[test]
    fn malformed_entries_are_skipped_with_index() {
        let body = r#"{
            "tags_detected": 3,
            "processing_fps": 9.5,
            "last_detection_time": "08:00:00",
            "pose_data": [
                {"tag_id": 1, "distance": 1.0,
                 "position": {"x": 0, "y": 0, "z": 1},
                 "angles": {"roll": 0, "pitch": 0, "yaw": 0},
                 "direction": [0, 0, 1]},
                {"tag_id": 2, "distance": 2.0,
                 "position": {"x": 0, "y": 0, "z": 2},
                 "direction": [0, 0, 1]},
                {"tag_id": 3, "distance": 3.0,
                 "position": {"x": 0, "y": 0, "z": 3},
                 "angles": {"roll": 0, "pitch": 0, "yaw": 0},
                 "direction": [0, 1]}
            ]
        }"#;

        let parsed = StatsPayload::parse(body).unwrap();
        let ids: Vec<i64> = parsed.payload.poses().iter().map(|p| p.tag_id).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(parsed.skipped.len(), 2);
        assert_eq!(parsed.skipped[0].index, 1);
        assert!(parsed.skipped[0].reason.contains("angles"));
        assert_eq!(parsed.skipped[1].index, 2);
    }

    #[test]
    fn non_json_body_is_an_error() {
        assert!(StatsPayload::parse("<html>502 Bad Gateway</html>").is_err());
        assert!(StatsPayload::parse("[1, 2, 3]").is_err());
    }

    #[test]
    fn missing_counters_stay_absent() {
        let parsed = StatsPayload::parse("{}").unwrap();
        assert_eq!(parsed.payload, StatsPayload::default());
    }

    #[test]
    fn serializes_without_absent_pose_data() {
        let payload = StatsPayload {
            tags_detected: Some(0),
            processing_fps: Some(12.0),
            last_detection_time: None,
            pose_data: None,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("pose_data"));
        assert!(json.contains("\"last_detection_time\":null"));
    }
}
