//! # Encoding Module
//!
//! Turns a picked image into the size-bounded base64 payload the annotate
//! request carries.

pub mod encoder;

pub use encoder::{EncodedImage, ImageEncoder, ImagePayload, PngSerializer, RasterSerializer};
