// SPDX-License-Identifier: MIT
//! # Resize Plan Computation
//!
//! Computes the output dimensions used when an encoded image is too large to
//! upload. The width is pinned to a fixed value and the height follows the
//! source aspect ratio.
//!
//! - All computations use floating-point and round to the nearest integer
//! - Output sides are clamped to a minimum of 1px
//! - Narrow sources are stretched up to the fixed width; the plan records this

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    /// Number of bytes an RGBA8 buffer of this size occupies.
    pub fn rgba_len(self) -> usize {
        (self.w as usize) * (self.h as usize) * 4
    }
}

/// Complete resize plan computed from the source size and target width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResizePlan {
    /// Original input dimensions
    pub input: Size,
    /// Final computed output dimensions
    pub out: Size,
}

impl ResizePlan {
    /// Byte length of the RGBA8 destination buffer this plan writes.
    pub fn out_len(&self) -> usize {
        self.out.rgba_len()
    }

    /// Output pixel count, computed without overflow.
    pub fn out_pixels(&self) -> u64 {
        self.out.w as u64 * self.out.h as u64
    }

    /// Whether the plan enlarges the source width.
    pub fn is_upscale(&self) -> bool {
        self.out.w > self.input.w
    }

    /// Whether the plan leaves the image untouched.
    pub fn is_identity(&self) -> bool {
        self.input == self.out
    }
}

/// Plan a resize to exactly `width` pixels wide with a proportional height.
///
/// Height is `round(input.h / input.w * width)`, never below 1px. A zero-width
/// input yields a 1px-high plan rather than dividing by zero.
///
/// # Examples
///
/// ```rust
/// use detect_scale::plan::{plan_fixed_width, Size};
///
/// let plan = plan_fixed_width(Size { w: 4000, h: 3000 }, 800);
/// assert_eq!(plan.out, Size { w: 800, h: 600 });
/// ```
pub fn plan_fixed_width(input: Size, width: u32) -> ResizePlan {
    let width = width.max(1);
    let h = if input.w == 0 {
        1
    } else {
        let scaled = input.h as f64 / input.w as f64 * width as f64;
        (scaled.round() as u32).max(1)
    };
    ResizePlan {
        input,
        out: Size { w: width, h },
    }
}
