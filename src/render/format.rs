//! Text formatting for counters and pose values.
//!
//! All numbers use fixed-point notation with a fixed number of decimals
//! and no locale-specific separators.

use crate::stats::{Angles, Position};

/// Shown in place of a value the backend did not send.
pub const PLACEHOLDER: &str = "-";

/// Shown when the backend has never seen a tag.
pub const NEVER: &str = "Never";

pub fn fixed(value: f64, decimals: usize) -> String {
    // Negative zero prints unsigned.
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{value:.decimals$}")
}

/// Tag count as a plain integer.
pub fn tag_count(value: Option<u64>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |n| n.to_string())
}

/// Processing rate in its shortest decimal form (`14.7`, `15`, `0`).
pub fn processing_rate(value: Option<f64>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |n| n.to_string())
}

/// Last-detection timestamp, or `Never` when missing or empty.
pub fn last_detection(value: Option<&str>) -> String {
    match value {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => NEVER.to_string(),
    }
}

// -- Summary panel --

pub fn summary_distance(meters: f64) -> String {
    format!("{} m", fixed(meters, 3))
}

pub fn summary_position(p: &Position) -> String {
    format!(
        "X:{}, Y:{}, Z:{}",
        fixed(p.x, 2),
        fixed(p.y, 2),
        fixed(p.z, 2)
    )
}

pub fn degrees(value: f64) -> String {
    format!("{}°", fixed(value, 1))
}

// -- Per-tag panels --

pub fn detail_distance(meters: f64) -> String {
    format!("{} meters", fixed(meters, 3))
}

pub fn detail_angles(a: &Angles) -> String {
    format!(
        "Roll: {}, Pitch: {}, Yaw: {}",
        degrees(a.roll),
        degrees(a.pitch),
        degrees(a.yaw)
    )
}

pub fn detail_position(p: &Position) -> String {
    format!(
        "X: {}, Y: {}, Z: {}",
        fixed(p.x, 3),
        fixed(p.y, 3),
        fixed(p.z, 3)
    )
}

pub fn detail_direction(d: &[f64; 3]) -> String {
    format!("[{}, {}, {}]", fixed(d[0], 2), fixed(d[1], 2), fixed(d[2], 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_zero_prints_unsigned() {
        assert_eq!(degrees(-0.0), "0.0°");
        assert_eq!(fixed(-0.0, 3), "0.000");
        assert_eq!(degrees(-0.04), "-0.0°");
    }

    #[test]
    fn fixed_point_rounding() {
        assert_eq!(summary_distance(1.23456), "1.235 m");
        assert_eq!(degrees(45.06), "45.1°");
        assert_eq!(degrees(-2.0), "-2.0°");
        assert_eq!(fixed(0.842, 3), "0.842");
    }

    #[test]
    fn summary_position_uses_two_decimals() {
        let p = Position {
            x: 1.0,
            y: 2.5,
            z: -3.0,
        };
        assert_eq!(summary_position(&p), "X:1.00, Y:2.50, Z:-3.00");
    }

    #[test]
    fn detail_lines() {
        let p = Position {
            x: 0.1,
            y: -0.2,
            z: 1.5,
        };
        let a = Angles {
            roll: 1.0,
            pitch: -2.0,
            yaw: 90.0,
        };
        assert_eq!(detail_distance(0.842), "0.842 meters");
        assert_eq!(detail_position(&p), "X: 0.100, Y: -0.200, Z: 1.500");
        assert_eq!(detail_angles(&a), "Roll: 1.0°, Pitch: -2.0°, Yaw: 90.0°");
        assert_eq!(detail_direction(&[0.0, 0.0, 1.0]), "[0.00, 0.00, 1.00]");
    }

    #[test]
    fn counters_use_direct_string_form() {
        assert_eq!(tag_count(Some(2)), "2");
        assert_eq!(processing_rate(Some(14.7)), "14.7");
        assert_eq!(processing_rate(Some(15.0)), "15");
        assert_eq!(processing_rate(Some(0.0)), "0");
        assert_eq!(tag_count(None), PLACEHOLDER);
        assert_eq!(processing_rate(None), PLACEHOLDER);
    }

    #[test]
    fn last_detection_falls_back_to_never() {
        assert_eq!(last_detection(Some("12:03:04")), "12:03:04");
        assert_eq!(last_detection(Some("")), NEVER);
        assert_eq!(last_detection(None), NEVER);
    }
}
