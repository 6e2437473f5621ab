//! Graph Morph - intersection-free morphing between two drawings of a graph
//!
//! This library provides a record reader, the morphing engine (compatible
//! triangulation, rigid alignment, convex-combination solver, frame scheduler)
//! and an SVG frame renderer.
//!
//! # Example
//!
//! ```rust
//! use graph_morph::render;
//!
//! let records = "
//!     node 0 0 0 255 0 0 0
//!     node 1 10 0 0 255 0 0
//!     node 2 5 10 0 0 255 0
//!     node 0 0 0 255 0 0 1
//!     node 1 0 10 0 255 0 1
//!     node 2 10 5 0 0 255 1
//!     edge 0 0 1 0
//!     edge 0 1 2 1
//!     edge 0 2 0 2
//!     edge 1 0 1 0
//!     edge 1 1 2 1
//!     edge 1 2 0 2
//! ";
//! let svg = render(records, 50).unwrap();
//! assert!(svg.contains("<svg"));
//! ```

pub mod error;
pub mod morph;
pub mod parser;
pub mod renderer;
pub mod stylesheet;

pub use error::ParseError;
pub use morph::{
    CompatibleTriangulation, ConfigError, Direction, FrameSnapshot, GraphPair, MorphConfig,
    MorphError, MorphSession, MotionMode, PlayState,
};
pub use parser::{parse, read_records, write_records, Document};
pub use renderer::{render_frame, render_frame_with_stylesheet, SvgConfig};

use thiserror::Error;

pub use stylesheet::Stylesheet;

/// Errors that can occur in the load-morph-render pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Error while reading records
    #[error("parse errors: {}", format_parse_errors(.0))]
    Parse(Vec<ParseError>),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Error from the morphing engine
    #[error("morph error: {0}")]
    Morph(#[from] MorphError),
}

impl From<Vec<ParseError>> for PipelineError {
    fn from(errors: Vec<ParseError>) -> Self {
        PipelineError::Parse(errors)
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Configuration for the complete pipeline
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    /// Morph engine configuration
    pub morph: MorphConfig,
    /// SVG output configuration
    pub svg: SvgConfig,
    /// Stylesheet for color resolution
    pub stylesheet: Stylesheet,
    /// Debug mode: draw the triangulation and dump node positions to stderr
    pub debug: bool,
}

impl RenderConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the morph configuration
    pub fn with_morph(mut self, config: MorphConfig) -> Self {
        self.morph = config;
        self
    }

    /// Set the SVG configuration
    pub fn with_svg(mut self, config: SvgConfig) -> Self {
        self.svg = config;
        self
    }

    /// Set the stylesheet for color resolution
    pub fn with_stylesheet(mut self, stylesheet: Stylesheet) -> Self {
        self.stylesheet = stylesheet;
        self
    }

    /// Enable or disable debug mode
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Read and validate a record file
pub fn load(source: &str) -> Result<GraphPair, PipelineError> {
    Ok(read_records(source)?)
}

/// Load records and arm a session in the configured mode
pub fn session_from_source(source: &str, config: &MorphConfig) -> Result<MorphSession, PipelineError> {
    config.validate()?;
    let pair = load(source)?;
    let mut session = MorphSession::new(pair, config.clone())?;
    session.arm()?;
    Ok(session)
}

/// Render one frame of the morph described by `source` with default configuration
pub fn render(source: &str, frame: u32) -> Result<String, PipelineError> {
    render_with_config(source, frame, &RenderConfig::default())
}

/// Render one frame of the morph described by `source`
///
/// # Example
///
/// ```rust
/// use graph_morph::{render_with_config, MorphConfig, RenderConfig, SvgConfig};
///
/// let records = "
///     node 0 0 0 0 0 0 0
///     node 1 4 0 0 0 0 0
///     node 0 0 0 0 0 0 1
///     node 1 0 4 0 0 0 1
///     edge 0 0 1 0
///     edge 1 0 1 0
/// ";
/// let config = RenderConfig::new()
///     .with_morph(MorphConfig::new().with_total_frames(10))
///     .with_svg(SvgConfig::default().with_viewbox_padding(5.0));
///
/// let svg = render_with_config(records, 10, &config).unwrap();
/// assert!(svg.contains(r#"cx="0" cy="4""#));
/// ```
pub fn render_with_config(source: &str, frame: u32, config: &RenderConfig) -> Result<String, PipelineError> {
    let mut session = session_from_source(source, &config.morph)?;
    session.capture_frame(frame)?;
    let snapshot = session.snapshot();

    if config.debug {
        eprintln!("=== Frame Debug ===");
        eprintln!(
            "frame {} of {} ({} motion, t = {:.3})",
            snapshot.frame,
            snapshot.total_frames,
            snapshot.mode,
            snapshot.fraction()
        );
        for (i, (p, origin)) in snapshot.positions.iter().zip(&snapshot.origins).enumerate() {
            eprintln!("  [{}] {:?} x={:.2} y={:.2}", i, origin, p.x, p.y);
        }
        eprintln!("===================");
    }

    let svg_config = if config.debug {
        config.svg.clone().with_steiner(true)
    } else {
        config.svg.clone()
    };
    Ok(render_frame_with_stylesheet(&snapshot, &svg_config, &config.stylesheet))
}
