pub mod datauri;
pub mod flows;

pub use datauri::DataUri;
pub use flows::{
    BoundingBox, DetectRequest, DetectResponse, Detection, EnhanceRequest, EnhanceResponse,
    FogDensityRequest, FogDensityResponse,
};
