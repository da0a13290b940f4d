use image::RgbImage;
use crate::utils::api_error::ApiError;

//Normalizes every accepted upload to 3-channel RGB. Resizing to the model
//input size happens at inference time, not here.
pub fn decode_image(data: &[u8], content_type: &str) -> Result<RgbImage, ApiError> {
    let primary_type = content_type.split('/').next().unwrap_or_default();
    if primary_type != "image" {
        return Err(ApiError::UnsupportedMediaType);
    }
    let decoded = image::load_from_memory(data)
        .map_err(|err| ApiError::DecodeError(err.to_string()))?;
    Ok(decoded.to_rgb8())
}
