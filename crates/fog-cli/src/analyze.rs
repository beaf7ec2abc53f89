use fog_gateway::{GatewayError, InferenceGateway};
use fog_proto::{DetectRequest, EnhanceRequest, FogDensityRequest};
use fog_session::{AnalysisOutcome, Session, SessionError};
use fog_vision::{ImageDimensions, PerformanceSource};
use std::io::Cursor;
use std::path::Path;
use tracing::info;

use crate::upload;

/// Decodes just enough of the uploaded bytes to learn the natural pixel size.
pub fn probe_dimensions(image_bytes: &[u8]) -> Result<ImageDimensions, SessionError> {
    let reader = image::ImageReader::new(Cursor::new(image_bytes))
        .with_guessed_format()
        .map_err(|_| SessionError::ImageDecodeFailed)?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|_| SessionError::ImageDecodeFailed)?;
    Ok(ImageDimensions { width, height })
}

/// Issues the three gateway calls concurrently and waits for all of them.
/// Fail-fast join: the first rejection short-circuits the combined wait and
/// partial results are dropped.
pub async fn run_inference<G>(
    gateway: &G,
    photo_data_uri: &str,
) -> Result<AnalysisOutcome, SessionError>
where
    G: InferenceGateway + Sync,
{
    let (fog, enhanced, detected) = tokio::try_join!(
        async {
            gateway
                .score_fog(FogDensityRequest { photo_data_uri: photo_data_uri.to_string() })
                .await
                .map_err(inference_error)
        },
        async {
            gateway
                .enhance(EnhanceRequest { foggy_photo_data_uri: photo_data_uri.to_string() })
                .await
                .map_err(inference_error)
        },
        async {
            gateway
                .detect(DetectRequest { photo_data_uri: photo_data_uri.to_string() })
                .await
                .map_err(inference_error)
        },
    )?;

    Ok(AnalysisOutcome {
        fog,
        enhanced_photo_data_uri: enhanced.enhanced_photo_data_uri,
        detections: detected.detections,
    })
}

fn inference_error(e: GatewayError) -> SessionError {
    SessionError::InferenceFailed(e.to_string())
}

/// Full pipeline for one upload: validate, probe, infer, settle.
pub async fn run_upload<G, P>(
    gateway: &G,
    session: &mut Session<P>,
    path: &Path,
    max_upload_bytes: u64,
) -> Result<(), SessionError>
where
    G: InferenceGateway + Sync,
    P: PerformanceSource,
{
    let generation = session.on_upload_start();

    let uri = match upload::read_upload(path, max_upload_bytes) {
        Ok(uri) => uri,
        Err(e) => {
            session.on_upload_failed(generation, e.clone());
            return Err(e);
        }
    };

    let dims = match probe_dimensions(&uri.data) {
        Ok(dims) => dims,
        Err(e) => {
            session.on_upload_failed(generation, e.clone());
            return Err(e);
        }
    };
    session.on_dimensions_ready(generation, dims)?;
    info!("analyze: {}x{} image, issuing 3 inference calls", dims.width, dims.height);

    let result = run_inference(gateway, &uri.to_string()).await;
    let failure = result.as_ref().err().cloned();
    session.on_inference_settled(generation, result);

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
