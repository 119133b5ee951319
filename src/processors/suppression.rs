//! Duplicate detection suppression.
//!
//! Greedy non-maximum suppression over the postprocessor's boxes. The
//! result is deterministic (confidence order with original scan order as
//! the tie break) and idempotent: suppressing an already-suppressed set
//! returns it unchanged.

use crate::processors::types::DetectionBox;

/// Removes overlapping duplicate boxes.
///
/// Boxes are taken in confidence-descending order; each kept box discards
/// every remaining box whose IoU with it exceeds `iou_threshold`. The
/// survivors are returned in confidence order, capped at `max_detections`.
/// The cap is applied after suppression so a true positive is never
/// discarded in favor of near-duplicates of a stronger box.
///
/// # Arguments
///
/// * `boxes` - Candidate boxes in any order.
/// * `iou_threshold` - Overlap above this discards the weaker box.
/// * `max_detections` - Maximum number of survivors to return.
pub fn non_max_suppression(
    boxes: &[DetectionBox],
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<DetectionBox> {
    if boxes.is_empty() {
        return Vec::new();
    }

    // Sort indices by confidence descending; equal confidences keep their
    // original scan order, which keeps the result deterministic.
    let mut indices: Vec<usize> = (0..boxes.len()).collect();
    indices.sort_by(|&a, &b| {
        boxes[b]
            .confidence
            .partial_cmp(&boxes[a].confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut suppressed = vec![false; boxes.len()];
    let mut keep = Vec::new();

    for (rank, &i) in indices.iter().enumerate() {
        if suppressed[i] {
            continue;
        }
        keep.push(i);

        for &j in &indices[rank + 1..] {
            if !suppressed[j] && boxes[i].iou(&boxes[j]) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep.truncate(max_detections);
    keep.into_iter().map(|i| boxes[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f32, y: f32, side: f32, confidence: f32) -> DetectionBox {
        DetectionBox::new(x, y, side, side, confidence, 0)
    }

    #[test]
    fn test_overlapping_duplicate_removed() {
        // A 120px square and a 118px square at 90% overlap: only the
        // higher-confidence box survives.
        let boxes = vec![
            square(100.0, 100.0, 120.0, 0.9),
            square(101.0, 101.0, 118.0, 0.6),
        ];
        let kept = non_max_suppression(&boxes, 0.45, 5);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_disjoint_boxes_all_kept() {
        let boxes = vec![
            square(0.0, 0.0, 100.0, 0.7),
            square(500.0, 500.0, 100.0, 0.9),
        ];
        let kept = non_max_suppression(&boxes, 0.45, 5);
        assert_eq!(kept.len(), 2);
        // Survivors come out in confidence order.
        assert_eq!(kept[0].confidence, 0.9);
        assert_eq!(kept[1].confidence, 0.7);
    }

    #[test]
    fn test_kept_pairs_below_threshold() {
        let boxes = vec![
            square(0.0, 0.0, 100.0, 0.9),
            square(50.0, 0.0, 100.0, 0.8),
            square(100.0, 0.0, 100.0, 0.7),
            square(400.0, 400.0, 100.0, 0.6),
        ];
        let threshold = 0.3;
        let kept = non_max_suppression(&boxes, threshold, 10);
        for (i, a) in kept.iter().enumerate() {
            for b in kept.iter().skip(i + 1) {
                assert!(a.iou(b) <= threshold);
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let boxes = vec![
            square(0.0, 0.0, 100.0, 0.9),
            square(10.0, 10.0, 100.0, 0.8),
            square(300.0, 300.0, 100.0, 0.7),
            square(305.0, 305.0, 100.0, 0.65),
        ];
        let once = non_max_suppression(&boxes, 0.45, 5);
        let twice = non_max_suppression(&once, 0.45, 5);
        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_eq!(a.x, b.x);
            assert_eq!(a.y, b.y);
            assert_eq!(a.confidence, b.confidence);
        }
    }

    #[test]
    fn test_cap_applied_after_suppression() {
        // Three near-duplicates of the strongest box plus one distinct
        // weaker box. With a cap of 2 the distinct box must survive; a
        // pre-suppression cap would have discarded it.
        let boxes = vec![
            square(0.0, 0.0, 100.0, 0.9),
            square(1.0, 1.0, 100.0, 0.85),
            square(2.0, 2.0, 100.0, 0.8),
            square(500.0, 500.0, 100.0, 0.4),
        ];
        let kept = non_max_suppression(&boxes, 0.45, 2);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].confidence, 0.9);
        assert_eq!(kept[1].confidence, 0.4);
    }

    #[test]
    fn test_equal_confidence_tie_break_is_scan_order() {
        let boxes = vec![
            square(0.0, 0.0, 100.0, 0.8),
            square(500.0, 0.0, 100.0, 0.8),
        ];
        let kept = non_max_suppression(&boxes, 0.45, 5);
        assert_eq!(kept[0].x, 0.0);
        assert_eq!(kept[1].x, 500.0);
    }
}
