//! # Image Encoder
//!
//! Serializes an RGBA8 pixel buffer to PNG in memory, applies the upload size
//! guard, and base64-encodes the result.
//!
//! ## Size Guard
//!
//! 1. Serialize the image losslessly
//! 2. If the byte length exceeds the ceiling (2 MiB by default), resize once to
//!    the configured width with a proportional height and serialize again
//! 3. Base64-encode whichever bytes came out last
//!
//! There is exactly one resize pass. A resized image that still exceeds the
//! ceiling is uploaded as-is.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose};
use detect_scale::cpu::scale_rgba_to_vec;
use detect_scale::plan::{Size, plan_fixed_width};
use fast_image_resize::Resizer;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder as _};
use tracing::debug;

use crate::config::VisionConfig;
use crate::error::{VisionError, VisionResult};

/// Raw picked image: tightly packed RGBA8 pixels plus dimensions.
#[derive(Clone, Debug)]
pub struct ImagePayload {
    pub width: u32,
    pub height: u32,
    pub rgba: Arc<Vec<u8>>,
}

impl ImagePayload {
    /// Wrap an RGBA8 buffer. The length is checked when the image is encoded.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba: Arc::new(rgba),
        }
    }

    /// Convert any decoded image to RGBA8.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        let rgba = image.into_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(width, height, rgba.into_raw())
    }

    /// Decode an encoded image file (PNG or JPEG).
    pub fn decode(bytes: &[u8]) -> VisionResult<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| VisionError::encode_with_source("decode", e))?;
        Ok(Self::from_dynamic(image))
    }

    pub fn size(&self) -> Size {
        Size {
            w: self.width,
            h: self.height,
        }
    }

    /// Reject empty images and buffers whose length does not match the dimensions.
    pub fn check(&self) -> VisionResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(VisionError::encode(
                "validate",
                format!("image has no pixels ({}x{})", self.width, self.height),
            ));
        }
        let expected = self.size().rgba_len();
        if self.rgba.len() != expected {
            return Err(VisionError::encode(
                "validate",
                format!(
                    "pixel buffer holds {} bytes, expected {} for {}x{} RGBA8",
                    self.rgba.len(),
                    expected,
                    self.width,
                    self.height
                ),
            ));
        }
        Ok(())
    }
}

/// Base64 upload payload produced by [`ImageEncoder::encode`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    /// Standard base64, padded, no line breaks.
    pub base64: String,
    /// Width of the image that was serialized.
    pub width: u32,
    /// Height of the image that was serialized.
    pub height: u32,
    /// Length of the serialized bytes before base64.
    pub serialized_len: usize,
    /// Whether the resize pass ran.
    pub resized: bool,
}

/// Lossless in-memory serialization of an RGBA8 image.
pub trait RasterSerializer: Send + Sync {
    fn serialize(&self, image: &ImagePayload) -> VisionResult<Vec<u8>>;
}

/// PNG serialization through the `image` crate, straight from the borrowed pixels.
#[derive(Clone, Copy, Debug, Default)]
pub struct PngSerializer;

impl RasterSerializer for PngSerializer {
    fn serialize(&self, image: &ImagePayload) -> VisionResult<Vec<u8>> {
        image.check()?;
        let mut out = Vec::new();
        PngEncoder::new(&mut out).write_image(
            &image.rgba,
            image.width,
            image.height,
            ExtendedColorType::Rgba8,
        )?;
        Ok(out)
    }
}

/// Encoder applying the single-pass size guard.
pub struct ImageEncoder {
    size_ceiling_bytes: usize,
    resize_width: u32,
    serializer: Box<dyn RasterSerializer>,
}

impl ImageEncoder {
    pub fn new(config: &VisionConfig) -> Self {
        Self::with_serializer(config, PngSerializer)
    }

    pub fn with_serializer<S: RasterSerializer + 'static>(config: &VisionConfig, serializer: S) -> Self {
        Self {
            size_ceiling_bytes: config.size_ceiling_bytes,
            resize_width: config.resize_width,
            serializer: Box::new(serializer),
        }
    }

    pub fn size_ceiling(&self) -> usize {
        self.size_ceiling_bytes
    }

    /// Encode `image` into an upload payload.
    pub fn encode(&self, image: &ImagePayload) -> VisionResult<EncodedImage> {
        image.check()?;

        let bytes = self.serialize_checked(image)?;
        if bytes.len() <= self.size_ceiling_bytes {
            debug!(
                width = image.width,
                height = image.height,
                bytes = bytes.len(),
                "encoded without resize"
            );
            return Ok(EncodedImage {
                base64: general_purpose::STANDARD.encode(&bytes),
                width: image.width,
                height: image.height,
                serialized_len: bytes.len(),
                resized: false,
            });
        }

        let resized = self.resize(image)?;
        let resized_bytes = self.serialize_checked(&resized)?;
        debug!(
            from_width = image.width,
            from_height = image.height,
            to_width = resized.width,
            to_height = resized.height,
            original_bytes = bytes.len(),
            bytes = resized_bytes.len(),
            "encoded after resize"
        );
        if resized_bytes.len() > self.size_ceiling_bytes {
            debug!(
                bytes = resized_bytes.len(),
                ceiling = self.size_ceiling_bytes,
                "resized image still exceeds ceiling, uploading anyway"
            );
        }

        Ok(EncodedImage {
            base64: general_purpose::STANDARD.encode(&resized_bytes),
            width: resized.width,
            height: resized.height,
            serialized_len: resized_bytes.len(),
            resized: true,
        })
    }

    /// Render `image` at the fixed upload width.
    pub fn resize(&self, image: &ImagePayload) -> VisionResult<ImagePayload> {
        let plan = plan_fixed_width(image.size(), self.resize_width);
        let mut resizer = Resizer::new();
        let rgba = scale_rgba_to_vec(&mut resizer, &image.rgba, &plan)?;
        Ok(ImagePayload::from_rgba(plan.out.w, plan.out.h, rgba))
    }

    fn serialize_checked(&self, image: &ImagePayload) -> VisionResult<Vec<u8>> {
        let bytes = self.serializer.serialize(image)?;
        if bytes.is_empty() {
            return Err(VisionError::encode(
                "serialize",
                format!("serializer produced no data for {}x{} image", image.width, image.height),
            ));
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> ImagePayload {
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                rgba.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 128, 255]);
            }
        }
        ImagePayload::from_rgba(width, height, rgba)
    }

    struct EmptySerializer;

    impl RasterSerializer for EmptySerializer {
        fn serialize(&self, _image: &ImagePayload) -> VisionResult<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_small_image_round_trips() {
        let encoder = ImageEncoder::new(&VisionConfig::new("k"));
        let image = gradient(32, 16);
        let encoded = encoder.encode(&image).unwrap();

        assert!(!encoded.resized);
        assert_eq!((encoded.width, encoded.height), (32, 16));

        let png = PngSerializer.serialize(&image).unwrap();
        let decoded = general_purpose::STANDARD.decode(&encoded.base64).unwrap();
        assert_eq!(decoded, png);
        assert_eq!(encoded.serialized_len, png.len());
        assert!(!encoded.base64.contains('\n'));
    }

    #[test]
    fn test_oversized_image_is_resized_once() {
        // Tiny ceiling forces the resize path with a real PNG serializer.
        let config = VisionConfig::new("k").with_size_ceiling(64);
        let encoder = ImageEncoder::new(&config);
        let encoded = encoder.encode(&gradient(100, 50)).unwrap();

        assert!(encoded.resized);
        assert_eq!((encoded.width, encoded.height), (800, 400));
        // Single pass: still over the ceiling, uploaded anyway.
        assert!(encoded.serialized_len > 64);

        let png = general_purpose::STANDARD.decode(&encoded.base64).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (800, 400));
    }

    #[test]
    fn test_ceiling_is_inclusive() {
        let image = gradient(8, 8);
        let len = PngSerializer.serialize(&image).unwrap().len();
        let encoder = ImageEncoder::new(&VisionConfig::new("k").with_size_ceiling(len));
        assert!(!encoder.encode(&image).unwrap().resized);
    }

    #[test]
    fn test_empty_serialization_is_an_encode_error() {
        let encoder = ImageEncoder::with_serializer(&VisionConfig::new("k"), EmptySerializer);
        let err = encoder.encode(&gradient(4, 4)).unwrap_err();
        assert_eq!(err.category(), "encode");
    }

    #[test]
    fn test_zero_sized_image_is_rejected() {
        let encoder = ImageEncoder::new(&VisionConfig::new("k"));
        let err = encoder.encode(&ImagePayload::from_rgba(0, 10, Vec::new())).unwrap_err();
        assert_eq!(err.category(), "encode");
    }

    #[test]
    fn test_buffer_length_mismatch_is_rejected() {
        let encoder = ImageEncoder::new(&VisionConfig::new("k"));
        let err = encoder.encode(&ImagePayload::from_rgba(4, 4, vec![0; 10])).unwrap_err();
        assert!(err.to_string().contains("expected 64"));
    }

    #[test]
    fn test_tall_narrow_image_fails_instead_of_aborting() {
        // Any PNG of 1x100000 is over 64 bytes; the 800-wide plan is 64 gigapixels.
        let config = VisionConfig::new("k").with_size_ceiling(64);
        let encoder = ImageEncoder::new(&config);
        let err = encoder.encode(&gradient(1, 100_000)).unwrap_err();
        assert_eq!(err.category(), "encode");
        assert_eq!(err.kind(), crate::error::FailureKind::Encode);
        assert!(err.to_string().contains("resize"));
    }

    #[test]
    fn test_png_serializer_rejects_mismatched_buffer() {
        let err = PngSerializer
            .serialize(&ImagePayload::from_rgba(2, 2, vec![0; 3]))
            .unwrap_err();
        assert_eq!(err.category(), "encode");
    }

    #[test]
    fn test_decode_png_file_bytes() {
        let png = PngSerializer.serialize(&gradient(3, 2)).unwrap();
        let payload = ImagePayload::decode(&png).unwrap();
        assert_eq!((payload.width, payload.height), (3, 2));
        assert_eq!(payload.rgba.len(), 24);
    }
}
