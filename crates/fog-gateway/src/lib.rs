pub mod genai;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use fog_proto::{
    DataUri, DetectRequest, DetectResponse, Detection, EnhanceRequest, EnhanceResponse,
    FogDensityRequest, FogDensityResponse,
};
use genai::{strip_code_fences, GenerateContentRequest, GenerateContentResponse};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// API base, e.g. `https://generativelanguage.googleapis.com`.
    pub endpoint: String,
    pub api_key: String,
    /// Model answering the scoring and detection flows.
    pub text_model: String,
    /// Image-capable model answering the enhancement flow.
    pub image_model: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("gateway returned HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("malformed gateway response: {0}")]
    MalformedResponse(String),
    #[error("invalid photo data URI: {0}")]
    InvalidInput(String),
}

/// The three inference operations the hosted model answers.
///
/// Each call is an opaque request/response pair with unknown latency and
/// failure modes. No retries and no timeout here; a failure is surfaced once
/// and scoped to the upload that triggered it.
pub trait InferenceGateway {
    fn score_fog(
        &self,
        req: FogDensityRequest,
    ) -> impl std::future::Future<Output = Result<FogDensityResponse, GatewayError>> + Send;

    fn enhance(
        &self,
        req: EnhanceRequest,
    ) -> impl std::future::Future<Output = Result<EnhanceResponse, GatewayError>> + Send;

    fn detect(
        &self,
        req: DetectRequest,
    ) -> impl std::future::Future<Output = Result<DetectResponse, GatewayError>> + Send;
}

const FOG_DENSITY_PROMPT: &str = "\
You are an expert in image analysis, specializing in assessing fog density.

You will analyze the provided image and determine the fog density.

Provide a fogDensityScore, which is a number from 0 to 1, where 0 means no \
fog and 1 means extremely dense fog. Also provide a fogDensityDescription, \
which is a short textual description of the fog density.

Reply with a single JSON object: \
{\"fogDensityScore\": <number>, \"fogDensityDescription\": <string>}";

const DETECT_PROMPT: &str = "\
You are an expert object detection AI, specialized in detecting objects in \
foggy images. Analyze the image and identify the objects present in it. For \
each object, provide a label, a confidence score between 0 and 1, and the \
bounding box coordinates (x, y, width, height) in image pixels.

Reply with a single JSON object: {\"detections\": [{\"label\": <string>, \
\"confidence\": <number>, \"boundingBox\": {\"x\": <number>, \"y\": <number>, \
\"width\": <number>, \"height\": <number>}}]}";

const ENHANCE_PROMPT: &str =
    "Enhance this image by reducing the fog and improving visibility.";

pub struct GeminiGateway {
    cfg: GatewayConfig,
    http: reqwest::Client,
}

impl GeminiGateway {
    pub fn new(cfg: GatewayConfig) -> Self {
        Self { cfg, http: reqwest::Client::new() }
    }

    async fn generate(
        &self,
        model: &str,
        req: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GatewayError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.cfg.endpoint.trim_end_matches('/'),
            model,
            self.cfg.api_key,
        );

        let started = std::time::Instant::now();
        let resp = self.http.post(&url).json(req).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Api { status: status.as_u16(), message });
        }
        let parsed: GenerateContentResponse = resp.json().await?;
        debug!("gateway: {} answered in {}ms", model, started.elapsed().as_millis());
        Ok(parsed)
    }
}

impl InferenceGateway for GeminiGateway {
    async fn score_fog(&self, req: FogDensityRequest) -> Result<FogDensityResponse, GatewayError> {
        let image = parse_photo(&req.photo_data_uri)?;
        let wire = GenerateContentRequest::prompt_with_image(
            FOG_DENSITY_PROMPT,
            &image.mime,
            &STANDARD.encode(&image.data),
        );
        let resp = self.generate(&self.cfg.text_model, &wire).await?;
        let text = resp
            .first_text()
            .ok_or_else(|| GatewayError::MalformedResponse("no text part in answer".into()))?;
        let mut out: FogDensityResponse = serde_json::from_str(strip_code_fences(text))
            .map_err(|e| GatewayError::MalformedResponse(format!("fog analysis JSON: {e}")))?;
        // The model occasionally wanders out of the documented range.
        out.fog_density_score = out.fog_density_score.clamp(0.0, 1.0);
        Ok(out)
    }

    async fn enhance(&self, req: EnhanceRequest) -> Result<EnhanceResponse, GatewayError> {
        let image = parse_photo(&req.foggy_photo_data_uri)?;
        let wire = GenerateContentRequest::prompt_with_image(
            ENHANCE_PROMPT,
            &image.mime,
            &STANDARD.encode(&image.data),
        )
        .with_image_response();
        let resp = self.generate(&self.cfg.image_model, &wire).await?;
        let inline = resp
            .first_inline_image()
            .ok_or_else(|| GatewayError::MalformedResponse("no image part in answer".into()))?;
        let data = STANDARD
            .decode(&inline.data)
            .map_err(|e| GatewayError::MalformedResponse(format!("image payload: {e}")))?;
        let uri = DataUri::new(inline.mime_type.clone(), data);
        Ok(EnhanceResponse { enhanced_photo_data_uri: uri.to_string() })
    }

    async fn detect(&self, req: DetectRequest) -> Result<DetectResponse, GatewayError> {
        let image = parse_photo(&req.photo_data_uri)?;
        let wire = GenerateContentRequest::prompt_with_image(
            DETECT_PROMPT,
            &image.mime,
            &STANDARD.encode(&image.data),
        );
        let resp = self.generate(&self.cfg.text_model, &wire).await?;
        let text = resp
            .first_text()
            .ok_or_else(|| GatewayError::MalformedResponse("no text part in answer".into()))?;
        parse_detections(text)
    }
}

fn parse_photo(uri: &str) -> Result<DataUri, GatewayError> {
    DataUri::parse(uri).map_err(|e| GatewayError::InvalidInput(e.to_string()))
}

/// The detector is asked for `{"detections": [...]}` but sometimes answers
/// with the bare array; accept both.
fn parse_detections(text: &str) -> Result<DetectResponse, GatewayError> {
    let body = strip_code_fences(text);
    if let Ok(resp) = serde_json::from_str::<DetectResponse>(body) {
        return Ok(resp);
    }
    serde_json::from_str::<Vec<Detection>>(body)
        .map(|detections| DetectResponse { detections })
        .map_err(|e| GatewayError::MalformedResponse(format!("detections JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detections_object_form_parses() {
        let resp = parse_detections(
            r#"{"detections":[{"label":"tree","confidence":0.8,"boundingBox":{"x":1,"y":2,"width":3,"height":4}}]}"#,
        )
        .unwrap();
        assert_eq!(resp.detections.len(), 1);
        assert_eq!(resp.detections[0].label, "tree");
    }

    #[test]
    fn detections_bare_array_parses() {
        let resp = parse_detections(
            "```json\n[{\"label\":\"car\",\"confidence\":0.6,\"boundingBox\":{\"x\":0,\"y\":0,\"width\":10,\"height\":10}}]\n```",
        )
        .unwrap();
        assert_eq!(resp.detections[0].label, "car");
    }

    #[test]
    fn detections_garbage_is_malformed() {
        let err = parse_detections("not json at all").unwrap_err();
        assert!(matches!(err, GatewayError::MalformedResponse(_)));
    }

    #[test]
    fn bad_input_uri_is_rejected_before_any_request() {
        let err = parse_photo("http://example.com/a.png").unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(_)));
    }
}
