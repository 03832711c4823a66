//! Segment plans for splitting a recording into fixed-length pieces.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default segment length in seconds (10 minutes).
pub const DEFAULT_SEGMENT_SECONDS: u32 = 600;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SegmentPlanError {
    #[error("source duration must be a positive number, got {0}")]
    InvalidDuration(f64),

    #[error("segment length must be a positive number, got {0}")]
    InvalidSegmentLength(f64),
}

/// One contiguous slice of the source timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentSpan {
    /// 0-based position in the plan
    pub index: usize,
    /// Start offset in seconds
    pub start: f64,
    /// Length in seconds
    pub length: f64,
}

impl SegmentSpan {
    pub fn end(&self) -> f64 {
        self.start + self.length
    }

    /// 1-based number used in artifact names.
    pub fn number(&self) -> u32 {
        self.index as u32 + 1
    }
}

/// Contiguous, non-overlapping segments covering the whole source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentPlan {
    pub duration: f64,
    pub segment_length: f64,
    pub segments: Vec<SegmentSpan>,
}

impl SegmentPlan {
    /// Build the plan for `duration` seconds cut every `segment_length` seconds.
    ///
    /// Segment count is `ceil(duration / segment_length)`; every segment but
    /// the last is exactly `segment_length` long.
    pub fn new(duration: f64, segment_length: f64) -> Result<Self, SegmentPlanError> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(SegmentPlanError::InvalidDuration(duration));
        }
        if !segment_length.is_finite() || segment_length <= 0.0 {
            return Err(SegmentPlanError::InvalidSegmentLength(segment_length));
        }

        let count = (duration / segment_length).ceil() as usize;
        let mut segments = Vec::with_capacity(count);
        for index in 0..count {
            let start = index as f64 * segment_length;
            let length = segment_length.min(duration - start);
            // float rounding can produce a trailing sliver of nothing
            if length <= 0.0 {
                break;
            }
            segments.push(SegmentSpan {
                index,
                start,
                length,
            });
        }

        Ok(Self {
            duration,
            segment_length,
            segments,
        })
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SegmentSpan> {
        self.segments.iter()
    }

    /// Sum of all segment lengths.
    pub fn covered(&self) -> f64 {
        self.segments.iter().map(|s| s.length).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lengths(plan: &SegmentPlan) -> Vec<f64> {
        plan.iter().map(|s| s.length).collect()
    }

    #[test]
    fn test_uneven_duration() {
        let plan = SegmentPlan::new(1500.0, 600.0).unwrap();
        assert_eq!(lengths(&plan), vec![600.0, 600.0, 300.0]);
        assert_eq!(plan.segments[2].start, 1200.0);
        assert_eq!(plan.segments[2].number(), 3);
    }

    #[test]
    fn test_even_duration_ends_with_full_segment() {
        let plan = SegmentPlan::new(1800.0, 600.0).unwrap();
        assert_eq!(lengths(&plan), vec![600.0, 600.0, 600.0]);
    }

    #[test]
    fn test_short_source_is_single_segment() {
        let plan = SegmentPlan::new(42.5, 600.0).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.segments[0].start, 0.0);
        assert_eq!(plan.segments[0].length, 42.5);

        let exact = SegmentPlan::new(600.0, 600.0).unwrap();
        assert_eq!(exact.len(), 1);
    }

    #[test]
    fn test_rejects_non_positive_input() {
        assert_eq!(
            SegmentPlan::new(0.0, 600.0),
            Err(SegmentPlanError::InvalidDuration(0.0))
        );
        assert!(SegmentPlan::new(-3.0, 600.0).is_err());
        assert!(SegmentPlan::new(f64::NAN, 600.0).is_err());
        assert!(SegmentPlan::new(f64::INFINITY, 600.0).is_err());
        assert_eq!(
            SegmentPlan::new(100.0, 0.0),
            Err(SegmentPlanError::InvalidSegmentLength(0.0))
        );
    }

    #[test]
    fn test_plan_properties_hold_over_range() {
        for d in 1..=2_500u32 {
            for l in [1u32, 7, 60, 599, 600, 601, 1_000] {
                let duration = d as f64;
                let seg = l as f64;
                let plan = SegmentPlan::new(duration, seg).unwrap();

                let expected = (d + l - 1) / l;
                assert_eq!(plan.len(), expected as usize, "d={d} l={l}");
                assert_eq!(plan.covered(), duration, "d={d} l={l}");

                for (i, span) in plan.iter().enumerate() {
                    assert_eq!(span.index, i);
                    assert_eq!(span.start, i as f64 * seg);
                    assert!(span.length > 0.0 && span.length <= seg);
                }
                for pair in plan.segments.windows(2) {
                    assert_eq!(pair[0].end(), pair[1].start);
                }
            }
        }
    }

    #[test]
    fn test_fractional_duration_is_fully_covered() {
        let plan = SegmentPlan::new(1234.56, 600.0).unwrap();
        assert_eq!(plan.len(), 3);
        assert!((plan.covered() - 1234.56).abs() < 1e-9);
        assert!((plan.segments[2].length - 34.56).abs() < 1e-9);
    }
}
