use fog_proto::Detection;
use serde::Serialize;

/// Fixed histogram edges; bins are half-open except the last, which is closed
/// at 1.0.
pub const BIN_EDGES: [f64; 6] = [0.0, 0.2, 0.4, 0.6, 0.8, 1.0];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfidenceBin {
    /// Two edges formatted to one decimal, e.g. `"0.8-1.0"`.
    pub range_label: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceSummary {
    pub average: f64,
    pub bins: Vec<ConfidenceBin>,
}

/// Average confidence plus a fixed-bin histogram over real detection
/// confidences. An empty detection set yields `None` ("no data"), not a zero
/// average.
pub fn summarize_confidence(detections: &[Detection]) -> Option<ConfidenceSummary> {
    if detections.is_empty() {
        return None;
    }

    let total: f64 = detections.iter().map(|d| d.confidence).sum();
    let average = total / detections.len() as f64;

    let mut counts = [0u32; BIN_EDGES.len() - 1];
    for det in detections {
        let c = det.confidence;
        for i in 0..counts.len() {
            if c >= BIN_EDGES[i] && c < BIN_EDGES[i + 1] {
                counts[i] += 1;
                break;
            }
        }
        // Exactly 1.0 misses every half-open interval above; count it into the
        // top bin so the closed upper edge is represented.
        if c == 1.0 {
            counts[counts.len() - 1] += 1;
        }
    }

    let bins = counts
        .iter()
        .enumerate()
        .map(|(i, &count)| ConfidenceBin {
            range_label: format!("{:.1}-{:.1}", BIN_EDGES[i], BIN_EDGES[i + 1]),
            count,
        })
        .collect();

    Some(ConfidenceSummary { average, bins })
}
