/// Camera capability
///
/// The rest of the application only knows about `SnapshotSource`: a thing
/// that can synchronously yield one still frame as a data URL, or nothing
/// when no frame is available. `Webcam` is the real nokhwa-backed device;
/// tests script their own sources.

use image::{DynamicImage, RgbImage};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use std::io::Cursor;
use thiserror::Error;

use super::codec::encode_snapshot;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("failed to open camera: {0}")]
    Open(#[from] nokhwa::NokhwaError),
}

/// A capability that can yield one still-image snapshot on demand.
///
/// Returns `None` when no frame is available right now (device warming
/// up, stream hiccup); callers abort the capture attempt silently in
/// that case.
pub trait SnapshotSource {
    fn try_snapshot(&mut self) -> Option<String>;
}

/// The default webcam, streaming RGB frames which get JPEG-encoded into
/// data URLs on each snapshot.
pub struct Webcam {
    camera: Camera,
}

impl Webcam {
    /// Open the first available camera device and start its stream.
    pub fn open() -> Result<Self, CameraError> {
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);
        let mut camera = Camera::new(CameraIndex::Index(0), requested)?;
        camera.open_stream()?;
        println!("📹 Camera ready: {}", camera.info().human_name());
        Ok(Self { camera })
    }
}

impl SnapshotSource for Webcam {
    fn try_snapshot(&mut self) -> Option<String> {
        let buffer = self.camera.frame().ok()?;
        let decoded = buffer.decode_image::<RgbFormat>().ok()?;
        let (width, height) = decoded.dimensions();

        // Rebuild the frame with our own image crate version, then
        // JPEG-encode it for upload.
        let rgb = RgbImage::from_raw(width, height, decoded.into_raw())?;
        let mut jpeg = Vec::new();
        DynamicImage::ImageRgb8(rgb)
            .write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .ok()?;

        Some(encode_snapshot(&jpeg, "image/jpeg"))
    }
}

impl std::fmt::Debug for Webcam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Webcam")
            .field("device", &self.camera.info().human_name())
            .finish()
    }
}
