//! SVG generation from frame snapshots

use crate::morph::{BoundingBox, FrameSnapshot, NodeOrigin, Point};
use crate::stylesheet::Stylesheet;

use super::SvgConfig;

/// Round to two decimals and drop trailing zeros
fn num(value: f64) -> String {
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Build SVG elements incrementally
pub struct SvgBuilder {
    config: SvgConfig,
    styles: Vec<String>,
    elements: Vec<String>,
    indent: usize,
}

impl SvgBuilder {
    pub fn new(config: SvgConfig) -> Self {
        Self {
            config,
            styles: vec![],
            elements: vec![],
            indent: 1,
        }
    }

    /// Add CSS custom properties from a stylesheet
    pub fn add_stylesheet(&mut self, stylesheet: &Stylesheet) {
        let mut tokens: Vec<_> = stylesheet.colors.iter().collect();
        tokens.sort();
        let mut css = String::from(":root {\n");
        for (token, value) in tokens {
            css.push_str(&format!("    --{}: {};\n", token, value));
        }
        css.push_str("  }");
        self.styles.push(css);
    }

    fn prefix(&self) -> String {
        self.config.class_prefix.clone().unwrap_or_default()
    }

    fn class_list(&self, classes: &[&str]) -> String {
        let prefix = self.prefix();
        classes
            .iter()
            .map(|c| format!("{}{}", prefix, c))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn indent_str(&self) -> String {
        if self.config.pretty_print {
            "  ".repeat(self.indent)
        } else {
            String::new()
        }
    }

    fn newline(&self) -> &str {
        if self.config.pretty_print {
            "\n"
        } else {
            ""
        }
    }

    pub fn add_rect(&mut self, bounds: &BoundingBox, classes: &[&str], styles: &str) {
        self.elements.push(format!(
            r#"{}<rect class="{}" x="{}" y="{}" width="{}" height="{}"{}/>"#,
            self.indent_str(),
            self.class_list(classes),
            num(bounds.x),
            num(bounds.y),
            num(bounds.width),
            num(bounds.height),
            styles
        ));
    }

    pub fn add_line(&mut self, from: Point, to: Point, classes: &[&str], styles: &str) {
        self.elements.push(format!(
            r#"{}<line class="{}" x1="{}" y1="{}" x2="{}" y2="{}"{}/>"#,
            self.indent_str(),
            self.class_list(classes),
            num(from.x),
            num(from.y),
            num(to.x),
            num(to.y),
            styles
        ));
    }

    pub fn add_circle(&mut self, id: Option<&str>, center: Point, r: f64, classes: &[&str], styles: &str) {
        let id_attr = id.map(|i| format!(r#" id="{}""#, i)).unwrap_or_default();
        self.elements.push(format!(
            r#"{}<circle{} class="{}" cx="{}" cy="{}" r="{}"{}/>"#,
            self.indent_str(),
            id_attr,
            self.class_list(classes),
            num(center.x),
            num(center.y),
            num(r),
            styles
        ));
    }

    pub fn add_text(&mut self, text: &str, at: Point, classes: &[&str], styles: &str) {
        self.elements.push(format!(
            r#"{}<text class="{}" x="{}" y="{}"{}>{}</text>"#,
            self.indent_str(),
            self.class_list(classes),
            num(at.x),
            num(at.y),
            styles,
            text
        ));
    }

    /// Open a `<g>` layer
    pub fn start_group(&mut self, classes: &[&str]) {
        self.elements.push(format!(
            r#"{}<g class="{}">"#,
            self.indent_str(),
            self.class_list(classes)
        ));
        self.indent += 1;
    }

    pub fn end_group(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.elements.push(format!("{}</g>", self.indent_str()));
    }

    pub fn add_comment(&mut self, text: &str) {
        self.elements.push(format!("{}<!-- {} -->", self.indent_str(), text));
    }

    /// Finish the document; `viewbox` is already padded
    pub fn build(self, viewbox: BoundingBox) -> String {
        let nl = self.newline();
        let mut svg = String::new();

        if self.config.standalone {
            svg.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
            svg.push_str(nl);
        }

        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
            num(viewbox.x),
            num(viewbox.y),
            num(viewbox.width),
            num(viewbox.height)
        ));
        svg.push_str(nl);

        if !self.styles.is_empty() {
            svg.push_str("  <style>");
            svg.push_str(nl);
            for style in &self.styles {
                svg.push_str("  ");
                svg.push_str(style);
                svg.push_str(nl);
            }
            svg.push_str("  </style>");
            svg.push_str(nl);
        }

        for elem in &self.elements {
            svg.push_str(elem);
            svg.push_str(nl);
        }

        svg.push_str("</svg>");
        svg
    }
}

/// Box around everything the frame will draw
fn content_bounds(snapshot: &FrameSnapshot, config: &SvgConfig) -> BoundingBox {
    let visible = |i: &usize| config.show_steiner || snapshot.origins[*i] == NodeOrigin::Authored;
    let mut points: Vec<Point> = (0..snapshot.positions.len())
        .filter(visible)
        .map(|i| snapshot.positions[i])
        .collect();
    if config.show_ghosts {
        for drawing in &snapshot.endpoints {
            points.extend((0..drawing.len()).filter(visible).map(|i| drawing[i]));
        }
    }
    BoundingBox::from_points(points).unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0))
}

/// Render a frame with the default stylesheet
pub fn render_frame(snapshot: &FrameSnapshot, config: &SvgConfig) -> String {
    render_frame_with_stylesheet(snapshot, config, &Stylesheet::default())
}

/// Render a frame to an SVG string
///
/// Layers from bottom to top: background, ghosts of both endpoint drawings,
/// Steiner edges, structural edges, nodes, labels.
pub fn render_frame_with_stylesheet(
    snapshot: &FrameSnapshot,
    config: &SvgConfig,
    stylesheet: &Stylesheet,
) -> String {
    let viewbox = content_bounds(snapshot, config).expand(config.viewbox_padding);
    let color = |token: &str| stylesheet.resolve_or_default(token);
    let radius = config.node_radius;

    let mut builder = SvgBuilder::new(config.clone());
    builder.add_stylesheet(stylesheet);
    builder.add_comment(&format!(
        "frame {} of {} ({} motion)",
        snapshot.frame, snapshot.total_frames, snapshot.mode
    ));
    builder.add_rect(
        &viewbox,
        &["background"],
        &format!(r#" fill="{}""#, color("background")),
    );

    if config.show_ghosts {
        for (drawing, token) in snapshot.endpoints.iter().zip(["ghost-initial", "ghost-final"]) {
            builder.start_group(&["ghost", token]);
            let stroke = format!(r#" stroke="{}" stroke-width="1""#, color(token));
            for &(a, b) in &snapshot.structural_edges {
                builder.add_line(drawing[a], drawing[b], &["edge"], &stroke);
            }
            builder.end_group();
        }
    }

    if config.show_steiner {
        builder.start_group(&["steiner"]);
        let stroke = format!(
            r#" stroke="{}" stroke-width="0.5" stroke-dasharray="2,2""#,
            color("steiner-edge")
        );
        for &edge in &snapshot.steiner_edges {
            let (from, to) = snapshot.segment(edge);
            builder.add_line(from, to, &["edge", "steiner-edge"], &stroke);
        }
        builder.end_group();
    }

    builder.start_group(&["structure"]);
    let stroke = format!(r#" stroke="{}" stroke-width="2""#, color("structural-edge"));
    for &edge in &snapshot.structural_edges {
        let (from, to) = snapshot.segment(edge);
        builder.add_line(from, to, &["edge", "structural-edge"], &stroke);
    }
    builder.end_group();

    builder.start_group(&["nodes"]);
    let node_stroke = color("node-stroke");
    for (i, (&position, origin)) in snapshot.positions.iter().zip(&snapshot.origins).enumerate() {
        let id = format!("node-{}", i);
        match origin {
            NodeOrigin::Authored => {
                let fill = snapshot.colors.get(i).map(|c| c.to_hex()).unwrap_or_default();
                builder.add_circle(
                    Some(&id),
                    position,
                    radius,
                    &["node"],
                    &format!(r#" fill="{}" stroke="{}""#, fill, node_stroke),
                );
            }
            NodeOrigin::Frame | NodeOrigin::Steiner if config.show_steiner => {
                let (class, token) = if *origin == NodeOrigin::Frame {
                    ("frame-node", "frame-node")
                } else {
                    ("steiner-node", "steiner-node")
                };
                builder.add_circle(
                    Some(&id),
                    position,
                    radius * 0.5,
                    &["node", class],
                    &format!(r#" fill="{}""#, color(token)),
                );
            }
            _ => {}
        }
    }
    builder.end_group();

    if config.show_labels {
        builder.start_group(&["labels"]);
        let fill = format!(r#" fill="{}" font-size="10""#, color("label-text"));
        for (i, (&position, origin)) in snapshot.positions.iter().zip(&snapshot.origins).enumerate() {
            if *origin == NodeOrigin::Authored || config.show_steiner {
                let at = position + Point::new(radius + 2.0, -(radius + 2.0));
                builder.add_text(&i.to_string(), at, &["label"], &fill);
            }
        }
        builder.end_group();
    }

    builder.build(viewbox)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morph::{MotionMode, Rgb};

    fn snapshot() -> FrameSnapshot {
        FrameSnapshot {
            frame: 5,
            total_frames: 10,
            mode: MotionMode::Linear,
            positions: vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(5.0, 7.5),
                Point::new(-40.0, -40.0),
            ],
            colors: vec![Rgb::new(255, 0, 0), Rgb::new(0, 255, 0), Rgb::new(0, 0, 255), Rgb::WHITE],
            origins: vec![
                NodeOrigin::Authored,
                NodeOrigin::Authored,
                NodeOrigin::Authored,
                NodeOrigin::Frame,
            ],
            structural_edges: vec![(0, 1), (1, 2), (2, 0)],
            steiner_edges: vec![(3, 0)],
            triangles: vec![],
            endpoints: [
                vec![
                    Point::new(0.0, 0.0),
                    Point::new(10.0, 0.0),
                    Point::new(5.0, 10.0),
                    Point::new(-40.0, -40.0),
                ],
                vec![
                    Point::new(0.0, 0.0),
                    Point::new(10.0, 0.0),
                    Point::new(5.0, 5.0),
                    Point::new(-40.0, -40.0),
                ],
            ],
        }
    }

    #[test]
    fn test_num_formatting() {
        assert_eq!(num(7.5), "7.5");
        assert_eq!(num(10.0), "10");
        assert_eq!(num(-0.001), "0");
        assert_eq!(num(1.0 / 3.0), "0.33");
    }

    #[test]
    fn test_render_frame_layers() {
        let svg = render_frame(&snapshot(), &SvgConfig::default());
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains(r#"viewBox="-20 -20 50 50""#));
        assert!(svg.contains("<!-- frame 5 of 10 (linear motion) -->"));
        assert!(svg.contains(r#"class="gm-ghost gm-ghost-initial""#));
        assert_eq!(svg.matches("gm-structural-edge").count(), 3);
        assert!(!svg.contains("gm-steiner-edge"));
        assert!(svg.contains(r##"<circle id="node-2" class="gm-node" cx="5" cy="7.5" r="4" fill="#0000ff""##));
        assert!(!svg.contains("node-3"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_render_frame_with_steiner() {
        let config = SvgConfig::default().with_steiner(true).with_ghosts(false);
        let svg = render_frame(&snapshot(), &config);
        assert!(svg.contains(r#"class="gm-edge gm-steiner-edge" x1="-40" y1="-40" x2="0" y2="0""#));
        assert!(svg.contains(r#"class="gm-node gm-frame-node""#));
        assert!(svg.contains(r#"viewBox="-60 -60 90 87.5""#));
    }

    #[test]
    fn test_render_without_prefix_or_pretty_print() {
        let config = SvgConfig::default()
            .without_class_prefix()
            .with_pretty_print(false)
            .with_standalone(false)
            .with_labels(false);
        let svg = render_frame(&snapshot(), &config);
        assert!(svg.starts_with("<svg"));
        assert!(!svg.contains('\n') || svg.contains(":root {\n"));
        assert!(svg.contains(r#"class="edge structural-edge""#));
        assert!(!svg.contains("<text"));
    }

    #[test]
    fn test_stylesheet_colours_applied() {
        let mut stylesheet = Stylesheet::default();
        stylesheet
            .colors
            .insert("structural-edge".to_string(), "#ff00ff".to_string());
        let svg = render_frame_with_stylesheet(&snapshot(), &SvgConfig::default(), &stylesheet);
        assert!(svg.contains("--structural-edge: #ff00ff;"));
        assert!(svg.contains(r##"stroke="#ff00ff" stroke-width="2""##));
    }
}
