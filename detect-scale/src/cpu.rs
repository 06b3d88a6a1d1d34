// SPDX-License-Identifier: MIT
// CPU scaler built on fast_image_resize (SIMD-accelerated).
// RGBA8 in → RGBA8 out, direct write into caller-provided dst buffer.

use fast_image_resize as fir;
use fir::images::{TypedImage, TypedImageRef};
use fir::pixels::U8x4;
use fir::{ResizeOptions, Resizer};

use crate::plan::ResizePlan;

/// Largest output, in pixels, [`scale_rgba_to_vec`] will allocate for (1 GiB of RGBA8).
pub const MAX_OUTPUT_PIXELS: u64 = 1 << 28;

#[derive(Debug)]
pub enum ScaleError {
    EmptyInput,
    SourceLengthMismatch { expected: usize, actual: usize },
    BufferTooSmall,
    OutputTooLarge { pixels: u64, limit: u64 },
    OutOfMemory { bytes: usize },
    Fir(fir::ResizeError),
    ImageBuf(fir::ImageBufferError),
}

impl From<fir::ResizeError> for ScaleError { fn from(e: fir::ResizeError) -> Self { Self::Fir(e) } }
impl From<fir::ImageBufferError> for ScaleError { fn from(e: fir::ImageBufferError) -> Self { Self::ImageBuf(e) } }

impl std::fmt::Display for ScaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleError::EmptyInput => write!(f, "Source image has a zero dimension"),
            ScaleError::SourceLengthMismatch { expected, actual } => write!(
                f,
                "Source buffer holds {} bytes, expected {} for RGBA8",
                actual, expected
            ),
            ScaleError::BufferTooSmall => write!(f, "Output buffer too small"),
            ScaleError::OutputTooLarge { pixels, limit } => write!(
                f,
                "Output of {} pixels exceeds the {} pixel limit",
                pixels, limit
            ),
            ScaleError::OutOfMemory { bytes } => {
                write!(f, "Could not allocate {} bytes for the output image", bytes)
            }
            ScaleError::Fir(e) => write!(f, "Fast image resize error: {}", e),
            ScaleError::ImageBuf(e) => write!(f, "Image buffer error: {}", e),
        }
    }
}

impl std::error::Error for ScaleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScaleError::Fir(e) => Some(e),
            ScaleError::ImageBuf(e) => Some(e),
            _ => None,
        }
    }
}

/// Main scaling entry point.
/// `src_rgba` must be tightly packed (`plan.input.w * 4` bytes per row).
/// `dst` must be at least `plan.out_len()` bytes.
pub fn scale_rgba_cpu(
    resizer: &mut Resizer,
    src_rgba: &[u8],
    plan: &ResizePlan,
    dst: &mut [u8],
) -> Result<(), ScaleError> {
    let src = plan.input;
    if src.w == 0 || src.h == 0 {
        return Err(ScaleError::EmptyInput);
    }
    let expected = src.rgba_len();
    if src_rgba.len() != expected {
        return Err(ScaleError::SourceLengthMismatch {
            expected,
            actual: src_rgba.len(),
        });
    }
    let dst_len = plan.out_len();
    if dst.len() < dst_len {
        return Err(ScaleError::BufferTooSmall);
    }

    if plan.is_identity() {
        dst[..dst_len].copy_from_slice(src_rgba);
        return Ok(());
    }

    let src_view = TypedImageRef::<U8x4>::from_buffer(src.w, src.h, src_rgba)?;
    let mut dst_image = TypedImage::<U8x4>::from_buffer(plan.out.w, plan.out.h, &mut dst[..dst_len])?;

    let opts = ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3));
    resizer.resize_typed::<U8x4>(&src_view, &mut dst_image, &opts)?;

    Ok(())
}

/// Allocate the destination buffer and scale into it.
///
/// Plans above [`MAX_OUTPUT_PIXELS`], and allocations the system refuses, are
/// errors rather than aborts.
pub fn scale_rgba_to_vec(
    resizer: &mut Resizer,
    src_rgba: &[u8],
    plan: &ResizePlan,
) -> Result<Vec<u8>, ScaleError> {
    let pixels = plan.out_pixels();
    if pixels > MAX_OUTPUT_PIXELS {
        return Err(ScaleError::OutputTooLarge {
            pixels,
            limit: MAX_OUTPUT_PIXELS,
        });
    }
    let bytes = plan.out_len();
    let mut out = Vec::new();
    out.try_reserve_exact(bytes)
        .map_err(|_| ScaleError::OutOfMemory { bytes })?;
    out.resize(bytes, 0);
    scale_rgba_cpu(resizer, src_rgba, plan, &mut out)?;
    Ok(out)
}
