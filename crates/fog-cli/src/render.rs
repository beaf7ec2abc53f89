use anyhow::{Context, Result};
use fog_proto::DataUri;
use fog_session::AnalysisOutcome;
use fog_vision::{normalize_box, ConfidenceSummary, ImageDimensions, PerformanceMetrics};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;

const HISTOGRAM_BAR_MAX: u32 = 40;

/// Renders the analysis report as plain text. Overlay boxes are recomputed
/// from the stored detections on every render.
pub fn render_report(
    outcome: &AnalysisOutcome,
    dims: ImageDimensions,
    confidence: Option<&ConfidenceSummary>,
    performance: Option<PerformanceMetrics>,
) -> String {
    let mut out = String::new();
    let now = time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown time".into());

    let _ = writeln!(out, "FoggyVision analysis — {now}");
    let _ = writeln!(out, "image: {}x{} px", dims.width, dims.height);

    let _ = writeln!(out, "\nFog analysis");
    let _ = writeln!(
        out,
        "  density score: {:.2} (0 = clear, 1 = dense)",
        outcome.fog.fog_density_score
    );
    let _ = writeln!(out, "  description:   {}", outcome.fog.fog_density_description);

    if outcome.detections.is_empty() {
        let _ = writeln!(out, "\nNo objects detected.");
    } else {
        let _ = writeln!(out, "\nDetected objects ({})", outcome.detections.len());
        for det in &outcome.detections {
            let nb = normalize_box(&det.bounding_box, dims);
            let _ = writeln!(
                out,
                "  {} ({:.2})  box: left {:.1}%  top {:.1}%  width {:.1}%  height {:.1}%",
                det.label, det.confidence, nb.left, nb.top, nb.width, nb.height
            );
        }
    }

    let _ = writeln!(out, "\nConfidence metrics");
    match confidence {
        Some(summary) => {
            let _ = writeln!(out, "  average confidence: {:.3}", summary.average);
            for bin in &summary.bins {
                let bar = "#".repeat(bin.count.min(HISTOGRAM_BAR_MAX) as usize);
                let _ = writeln!(out, "  {}  {:<40} ({})", bin.range_label, bar, bin.count);
            }
        }
        None => {
            let _ = writeln!(out, "  no data");
        }
    }

    let _ = writeln!(out, "\nPerformance metrics (simulated)");
    match performance {
        Some(m) => {
            let _ = writeln!(out, "  accuracy:  {}", percent(m.accuracy));
            let _ = writeln!(out, "  precision: {}", percent(m.precision));
            let _ = writeln!(out, "  recall:    {}", percent(m.recall));
            let _ = writeln!(out, "  f1-score:  {}", percent(m.f1_score));
            let _ = writeln!(out, "  avg. iou:  {}", percent(m.iou));
        }
        None => {
            let _ = writeln!(out, "  N/A");
        }
    }

    out
}

fn percent(v: f64) -> String {
    format!("{:.1}%", v * 100.0)
}

/// Writes the enhanced image next to the input (or to the explicit override),
/// passing the payload bytes through verbatim.
pub fn write_enhanced_image(
    outcome: &AnalysisOutcome,
    input: &Path,
    out: Option<&Path>,
) -> Result<PathBuf> {
    let uri = DataUri::parse(&outcome.enhanced_photo_data_uri)
        .context("gateway returned an invalid enhanced-image data URI")?;

    let path = match out {
        Some(p) => p.to_path_buf(),
        None => {
            let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("image");
            input.with_file_name(format!("{stem}.enhanced.{}", extension_for(&uri.mime)))
        }
    };

    std::fs::write(&path, &uri.data)
        .with_context(|| format!("write enhanced image to {}", path.display()))?;
    Ok(path)
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fog_proto::{BoundingBox, Detection, FogDensityResponse};
    use fog_vision::{summarize_confidence, SimulatedPerformance};
    use fog_vision::PerformanceSource as _;

    fn outcome(detections: Vec<Detection>) -> AnalysisOutcome {
        AnalysisOutcome {
            fog: FogDensityResponse {
                fog_density_score: 0.62,
                fog_density_description: "moderate fog over the valley".into(),
            },
            enhanced_photo_data_uri: DataUri::new("image/png", vec![9, 9, 9]).to_string(),
            detections,
        }
    }

    fn det(label: &str, confidence: f64) -> Detection {
        Detection {
            label: label.into(),
            confidence,
            bounding_box: BoundingBox { x: 80.0, y: 60.0, width: 400.0, height: 300.0 },
        }
    }

    const DIMS: ImageDimensions = ImageDimensions { width: 800, height: 600 };

    #[test]
    fn report_lists_detections_with_normalized_boxes() {
        let o = outcome(vec![det("car", 0.91)]);
        let summary = summarize_confidence(&o.detections);
        let report = render_report(&o, DIMS, summary.as_ref(), None);

        assert!(report.contains("density score: 0.62"));
        assert!(report.contains("Detected objects (1)"));
        assert!(report.contains("car (0.91)"));
        assert!(report.contains("left 10.0%"));
        assert!(report.contains("width 50.0%"));
    }

    #[test]
    fn report_shows_no_data_without_detections() {
        let o = outcome(vec![]);
        let report = render_report(&o, DIMS, None, None);
        assert!(report.contains("No objects detected."));
        assert!(report.contains("no data"));
        assert!(report.contains("N/A"));
    }

    #[test]
    fn report_shows_simulated_metrics_as_percentages() {
        let o = outcome(vec![det("car", 0.91)]);
        let m = SimulatedPerformance::seeded(5).sample();
        let report = render_report(&o, DIMS, None, Some(m));
        assert!(report.contains("Performance metrics (simulated)"));
        assert!(report.contains(&format!("accuracy:  {:.1}%", m.accuracy * 100.0)));
    }

    #[test]
    fn enhanced_image_is_written_verbatim() {
        let o = outcome(vec![]);
        let input = std::env::temp_dir()
            .join(format!("fogvision-render-{}-scene.png", std::process::id()));
        let written = write_enhanced_image(&o, &input, None).unwrap();
        let bytes = std::fs::read(&written).unwrap();
        std::fs::remove_file(&written).ok();
        assert!(written.to_str().unwrap().ends_with("scene.enhanced.png"));
        assert_eq!(bytes, vec![9, 9, 9]);
    }

    #[test]
    fn bad_enhanced_uri_is_an_error() {
        let mut o = outcome(vec![]);
        o.enhanced_photo_data_uri = "http://not-a-data-uri".into();
        assert!(write_enhanced_image(&o, Path::new("x.png"), None).is_err());
    }
}
