// SPDX-License-Identifier: MIT
//! # detect-scale: Upload-Size Resizing for Vision Requests
//!
//! Small helper crate that shrinks (or stretches) an RGBA8 image to a fixed
//! output width before it is serialized and uploaded to a vision annotate
//! endpoint.
//!
//! ## Key Components
//!
//! - [`plan`]: Output size computation (fixed width, proportional height)
//! - [`cpu`]: CPU-based RGBA8 scaling on top of `fast_image_resize`
//!
//! ## Usage Example
//!
//! ```rust
//! use detect_scale::{cpu::scale_rgba_cpu, plan::{plan_fixed_width, Size}};
//!
//! let input = Size { w: 500, h: 300 };
//! let plan = plan_fixed_width(input, 800);
//! assert_eq!((plan.out.w, plan.out.h), (800, 480));
//!
//! let src = vec![0u8; (input.w * input.h * 4) as usize];
//! let mut resizer = fast_image_resize::Resizer::new();
//! let mut dst = vec![0u8; plan.out_len()];
//! scale_rgba_cpu(&mut resizer, &src, &plan, &mut dst).unwrap();
//! ```

pub mod cpu;
pub mod plan;
