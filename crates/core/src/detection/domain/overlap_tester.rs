use serde::{Deserialize, Serialize};

use crate::shared::constants::{DEFAULT_IOU_THRESHOLD, DEFAULT_PERCENT_COVERED_THRESHOLD};
use crate::shared::rectangle::Rectangle;

use super::object_scanner::Detection;

/// Decides whether two detections cover the same object.
///
/// Two boxes overlap when they intersect and either their IoU exceeds
/// `iou_thresh` or the intersection covers more than
/// `percent_covered_thresh` of either box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlapTester {
    pub iou_thresh: f64,
    pub percent_covered_thresh: f64,
}

impl Default for OverlapTester {
    fn default() -> Self {
        Self {
            iou_thresh: DEFAULT_IOU_THRESHOLD,
            percent_covered_thresh: DEFAULT_PERCENT_COVERED_THRESHOLD,
        }
    }
}

impl OverlapTester {
    pub fn new(iou_thresh: f64, percent_covered_thresh: f64) -> Self {
        Self {
            iou_thresh,
            percent_covered_thresh,
        }
    }

    pub fn overlaps(&self, a: &Rectangle, b: &Rectangle) -> bool {
        let inner = a.intersection(b).area() as f64;
        if inner == 0.0 {
            return false;
        }
        let area_a = a.area() as f64;
        let area_b = b.area() as f64;
        let outer = area_a + area_b - inner;
        inner / outer > self.iou_thresh
            || inner / area_a > self.percent_covered_thresh
            || inner / area_b > self.percent_covered_thresh
    }

    /// Greedy non-max suppression: walks detections by descending score
    /// (ties keep discovery order) and keeps one only if it overlaps none
    /// of those already kept.
    pub fn suppress(&self, mut detections: Vec<Detection>) -> Vec<Detection> {
        if detections.len() <= 1 {
            return detections;
        }
        detections.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
        for d in detections {
            if !kept.iter().any(|k| self.overlaps(&k.rect, &d.rect)) {
                kept.push(d);
            }
        }
        kept
    }
}
