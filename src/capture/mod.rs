/// Image acquisition module
///
/// This module handles everything between the camera and the session:
/// - Snapshot data-URL decoding (codec.rs)
/// - The camera capability and its webcam implementation (camera.rs)

pub mod camera;
pub mod codec;
