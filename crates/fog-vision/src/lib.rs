pub mod metrics;
pub mod overlay;
pub mod simulated;

pub use metrics::{summarize_confidence, ConfidenceBin, ConfidenceSummary};
pub use overlay::{normalize_box, ImageDimensions, NormalizedBox};
pub use simulated::{PerformanceMetrics, PerformanceSource, SimulatedPerformance};
