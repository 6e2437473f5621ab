//! SVG renderer for morph frames
//!
//! This module takes a FrameSnapshot and produces an SVG string
//! with appropriate CSS classes for styling.

pub mod config;
pub mod svg;

pub use config::SvgConfig;
pub use svg::{render_frame, render_frame_with_stylesheet};
