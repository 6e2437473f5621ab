//! Frame scheduler: one session object owning the graphs, the motion model and
//! the frame counter.
//!
//! ## States
//!
//! - `Idle`: editing, nothing precomputed
//! - `Armed`: the selected mode's model is ready (triangulation, alignment,
//!   weights)
//! - `Playing(direction)`: every [`MorphSession::tick`] moves one frame
//! - `Paused`: playback stopped, either by request or because the counter hit
//!   `0` or `total_frames`
//!
//! Selecting another mode drops the model and returns to `Idle`.

use std::thread;

use log::{debug, info, warn};

use super::compatible::{check_capacity, CompatibleTriangulation};
use super::config::MorphConfig;
use super::convex::ConvexModel;
use super::error::MorphError;
use super::rigid::RigidModel;
use super::types::{
    BoundingBox, EdgeKind, GraphPair, MotionMode, NodeOrigin, Point, Rgb, Triangle,
};

/// Playback direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    fn step(self) -> i64 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Idle,
    Armed,
    Playing(Direction),
    Paused,
}

/// Frame counter and pacing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub current: u32,
    pub total: u32,
    pub frame_rate: f64,
    pub direction: Direction,
}

impl FrameState {
    /// Interpolation fraction of a frame
    pub fn fraction(&self, frame: u32) -> f64 {
        frame.min(self.total) as f64 / self.total as f64
    }
}

#[derive(Debug, Clone)]
enum Motion {
    Linear,
    Rigid(RigidModel),
    Convex(ConvexModel),
    Hybrid {
        rigid: RigidModel,
        convex: ConvexModel,
    },
}

/// Everything a renderer needs to draw one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub frame: u32,
    pub total_frames: u32,
    pub mode: MotionMode,
    pub positions: Vec<Point>,
    pub colors: Vec<Rgb>,
    pub origins: Vec<NodeOrigin>,
    pub structural_edges: Vec<(usize, usize)>,
    pub steiner_edges: Vec<(usize, usize)>,
    pub triangles: Vec<Triangle>,
    /// Initial and final drawing of the working pair
    pub endpoints: [Vec<Point>; 2],
}

impl FrameSnapshot {
    pub fn fraction(&self) -> f64 {
        self.frame as f64 / self.total_frames.max(1) as f64
    }

    /// Box around the current frame and both endpoint drawings
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(
            self.positions
                .iter()
                .chain(self.endpoints[0].iter())
                .chain(self.endpoints[1].iter())
                .copied(),
        )
    }

    pub fn segment(&self, edge: (usize, usize)) -> (Point, Point) {
        (self.positions[edge.0], self.positions[edge.1])
    }
}

/// A morph between two drawings, driven frame by frame
#[derive(Debug, Clone)]
pub struct MorphSession {
    authored: GraphPair,
    config: MorphConfig,
    mode: MotionMode,
    triangulation: Option<CompatibleTriangulation>,
    motion: Option<Motion>,
    state: PlayState,
    frame: FrameState,
    positions: Vec<Point>,
    colors: Vec<Rgb>,
}

impl MorphSession {
    pub fn new(pair: GraphPair, config: MorphConfig) -> Result<Self, MorphError> {
        check_capacity(&pair, &config)?;
        let frame = FrameState {
            current: 0,
            total: config.total_frames.max(1),
            frame_rate: config.frame_rate,
            direction: Direction::Forward,
        };
        Ok(Self {
            positions: pair.initial().positions(),
            colors: pair.initial().colors(),
            mode: config.mode,
            authored: pair,
            config,
            triangulation: None,
            motion: None,
            state: PlayState::Idle,
            frame,
        })
    }

    pub fn mode(&self) -> MotionMode {
        self.mode
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn frame(&self) -> FrameState {
        self.frame
    }

    pub fn config(&self) -> &MorphConfig {
        &self.config
    }

    /// The pair as loaded
    pub fn authored(&self) -> &GraphPair {
        &self.authored
    }

    pub fn triangulation(&self) -> Option<&CompatibleTriangulation> {
        self.triangulation.as_ref()
    }

    /// The triangulated pair once built, the authored pair before
    pub fn working_pair(&self) -> &GraphPair {
        self.triangulation
            .as_ref()
            .map_or(&self.authored, |tri| &tri.pair)
    }

    /// Positions of the last computed frame
    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Switch motion model; the session must be armed again
    pub fn select_mode(&mut self, mode: MotionMode) {
        if mode != self.mode || self.motion.is_some() {
            info!("motion mode set to {}", mode);
        }
        self.mode = mode;
        self.motion = None;
        self.state = PlayState::Idle;
    }

    /// Build the compatible triangulation if it is not there yet
    pub fn triangulate(&mut self) -> Result<&CompatibleTriangulation, MorphError> {
        if self.triangulation.is_none() {
            let tri = CompatibleTriangulation::build(&self.authored, &self.config)?;
            self.triangulation = Some(tri);
            self.motion = None;
            self.state = PlayState::Idle;
            self.frame.current = 0;
            self.positions = self.working_pair().initial().positions();
            self.colors = self.working_pair().initial().colors();
        }
        match &self.triangulation {
            Some(tri) => Ok(tri),
            None => Err(MorphError::invalid_graph("triangulation unavailable")),
        }
    }

    /// Precompute the selected mode's model and enter `Armed`
    pub fn arm(&mut self) -> Result<(), MorphError> {
        if self.mode.needs_triangulation() {
            self.triangulate()?;
        }
        let authored = self.authored.node_count();
        let fit = || {
            RigidModel::fit(
                &self.authored.initial().positions(),
                &self.authored.target().positions(),
            )
        };
        let motion = match self.mode {
            MotionMode::Linear => Motion::Linear,
            MotionMode::Rigid => Motion::Rigid(fit()?),
            MotionMode::Convex => Motion::Convex(self.convex_model(self.working_pair())?),
            MotionMode::Hybrid => {
                let rigid = fit()?;
                let pair = self.working_pair();
                let midway: Vec<Point> = pair
                    .initial()
                    .positions()
                    .into_iter()
                    .map(|p| rigid.endpoint(p))
                    .collect();
                let convex = self.convex_model(&pair.with_initial_positions(&midway))?;
                Motion::Hybrid { rigid, convex }
            }
        };
        info!(
            "armed {} motion over {} nodes ({} authored)",
            self.mode,
            self.working_pair().node_count(),
            authored
        );
        self.motion = Some(motion);
        self.state = PlayState::Armed;
        Ok(())
    }

    fn convex_model(&self, pair: &GraphPair) -> Result<ConvexModel, MorphError> {
        let ring = self
            .triangulation
            .as_ref()
            .map(|tri| tri.ring.clone())
            .unwrap_or_default();
        ConvexModel::new(pair, &ring, self.config.boundary_count, self.config.pivot_epsilon)
    }

    pub fn play(&mut self, direction: Direction) -> Result<(), MorphError> {
        if self.motion.is_none() {
            return Err(MorphError::NotArmed { action: "play" });
        }
        self.frame.direction = direction;
        self.state = PlayState::Playing(direction);
        info!("playing {:?} from frame {}", direction, self.frame.current);
        Ok(())
    }

    pub fn pause(&mut self) {
        if let PlayState::Playing(_) = self.state {
            self.state = PlayState::Paused;
            info!("paused at frame {}", self.frame.current);
        }
    }

    /// Advance one frame while playing
    ///
    /// Reaching either end pauses playback. A frame whose positions cannot be
    /// computed keeps the previous positions and reports the error.
    pub fn tick(&mut self) -> Result<u32, MorphError> {
        let PlayState::Playing(direction) = self.state else {
            return Ok(self.frame.current);
        };
        let next = (self.frame.current as i64 + direction.step()).clamp(0, self.frame.total as i64);
        self.frame.current = next as u32;
        if next == 0 || next == self.frame.total as i64 {
            self.state = PlayState::Paused;
            info!("reached frame {}, pausing", next);
        }
        self.refresh()?;
        Ok(self.frame.current)
    }

    /// Jump to a frame and compute it without touching the play state
    pub fn capture_frame(&mut self, frame: u32) -> Result<(), MorphError> {
        if self.motion.is_none() {
            return Err(MorphError::NotArmed {
                action: "capture a frame",
            });
        }
        self.frame.current = frame.min(self.frame.total);
        self.refresh()
    }

    /// Back to frame 0
    pub fn reset(&mut self) {
        self.frame.current = 0;
        self.positions = self.working_pair().initial().positions();
        self.colors = self.working_pair().initial().colors();
        self.state = if self.motion.is_some() {
            PlayState::Armed
        } else {
            PlayState::Idle
        };
    }

    fn refresh(&mut self) -> Result<(), MorphError> {
        match self.frame_positions(self.frame.current) {
            Ok(positions) => {
                self.positions = positions;
                self.colors = self.frame_colors(self.frame.current);
                Ok(())
            }
            Err(err) => {
                warn!(
                    "frame {} failed, keeping previous positions: {}",
                    self.frame.current, err
                );
                Err(err)
            }
        }
    }

    /// Node positions of a frame, without changing the session
    pub fn frame_positions(&self, frame: u32) -> Result<Vec<Point>, MorphError> {
        let Some(motion) = &self.motion else {
            return Err(MorphError::NotArmed {
                action: "compute a frame",
            });
        };
        let t = self.frame.fraction(frame);
        let pair = self.working_pair();
        let from = pair.initial().positions();
        let to = pair.target().positions();
        debug!("frame {} (t = {:.3}) in {} mode", frame, t, self.mode);
        match motion {
            Motion::Linear => Ok(from.iter().zip(&to).map(|(&p, &q)| p.lerp(q, t)).collect()),
            Motion::Rigid(rigid) => Ok(rigid.positions(&from, &to, t)),
            Motion::Convex(convex) => convex.positions(t),
            Motion::Hybrid { rigid, convex } => {
                if t <= 0.5 {
                    Ok(from.iter().map(|&p| rigid.phase_one(p, 2.0 * t)).collect())
                } else {
                    convex.positions(2.0 * t - 1.0)
                }
            }
        }
    }

    /// Node colours of a frame, blended linearly
    pub fn frame_colors(&self, frame: u32) -> Vec<Rgb> {
        let t = self.frame.fraction(frame);
        let pair = self.working_pair();
        pair.initial()
            .nodes
            .iter()
            .zip(&pair.target().nodes)
            .map(|(a, b)| a.color.lerp(b.color, t))
            .collect()
    }

    /// The last computed frame, ready for a renderer
    pub fn snapshot(&self) -> FrameSnapshot {
        let pair = self.working_pair();
        let split = |kind: EdgeKind| -> Vec<(usize, usize)> {
            pair.edges()
                .iter()
                .filter(|e| e.kind == kind)
                .map(|e| (e.from, e.to))
                .collect()
        };
        FrameSnapshot {
            frame: self.frame.current,
            total_frames: self.frame.total,
            mode: self.mode,
            positions: self.positions.clone(),
            colors: self.colors.clone(),
            origins: pair.initial().nodes.iter().map(|n| n.origin).collect(),
            structural_edges: split(EdgeKind::Structural),
            steiner_edges: split(EdgeKind::Steiner),
            triangles: self
                .triangulation
                .as_ref()
                .map(|tri| tri.triangles[0].clone())
                .unwrap_or_default(),
            endpoints: [pair.initial().positions(), pair.target().positions()],
        }
    }

    /// Play in real time, handing every frame to `sink`
    ///
    /// Ticks once per `1 / frame_rate` seconds until playback pauses or `sink`
    /// returns `false`. Returns the number of frames handed over.
    pub fn run<F>(&mut self, mut sink: F) -> u32
    where
        F: FnMut(&FrameSnapshot) -> bool,
    {
        let interval = self.config.tick_interval();
        let mut emitted = 0;
        while let PlayState::Playing(_) = self.state {
            if let Err(err) = self.tick() {
                debug!("tick failed: {}", err);
            }
            emitted += 1;
            if !sink(&self.snapshot()) {
                self.pause();
                break;
            }
            if let PlayState::Playing(_) = self.state {
                thread::sleep(interval);
            }
        }
        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morph::types::{Edge, Graph, Node};

    fn triangle_pair() -> GraphPair {
        let edges = vec![Edge::structural(0, 1), Edge::structural(1, 2), Edge::structural(2, 0)];
        let build = |coords: [(f64, f64); 3], color: Rgb| {
            Graph::new(
                coords
                    .iter()
                    .enumerate()
                    .map(|(i, &(x, y))| Node::authored(i, Point::new(x, y), color))
                    .collect(),
                edges.clone(),
            )
        };
        GraphPair::new(
            build([(0.0, 0.0), (10.0, 0.0), (5.0, 10.0)], Rgb::new(0, 0, 0)),
            build([(2.0, 1.0), (12.0, 2.0), (6.0, 12.0)], Rgb::new(200, 100, 0)),
        )
        .unwrap()
    }

    fn session(frames: u32) -> MorphSession {
        let config = MorphConfig::default()
            .with_total_frames(frames)
            .with_frame_rate(1000.0);
        MorphSession::new(triangle_pair(), config).unwrap()
    }

    #[test]
    fn test_play_requires_arming() {
        let mut s = session(4);
        assert_eq!(s.play(Direction::Forward), Err(MorphError::NotArmed { action: "play" }));
        assert!(s.capture_frame(1).is_err());
        assert_eq!(s.state(), PlayState::Idle);
    }

    #[test]
    fn test_tick_clamps_and_pauses() {
        let mut s = session(3);
        s.arm().unwrap();
        s.play(Direction::Forward).unwrap();
        assert_eq!(s.tick(), Ok(1));
        assert_eq!(s.tick(), Ok(2));
        assert_eq!(s.tick(), Ok(3));
        assert_eq!(s.state(), PlayState::Paused);
        assert_eq!(s.tick(), Ok(3));

        s.play(Direction::Backward).unwrap();
        assert_eq!(s.tick(), Ok(2));
        s.pause();
        assert_eq!(s.state(), PlayState::Paused);
        assert_eq!(s.tick(), Ok(2));
    }

    #[test]
    fn test_capture_frame_keeps_play_state() {
        let mut s = session(10);
        s.arm().unwrap();
        s.capture_frame(25).unwrap();
        assert_eq!(s.frame().current, 10);
        assert_eq!(s.state(), PlayState::Armed);
        assert_eq!(s.positions()[2], Point::new(6.0, 12.0));
        assert_eq!(s.colors()[0], Rgb::new(200, 100, 0));
    }

    #[test]
    fn test_select_mode_disarms() {
        let mut s = session(10);
        s.arm().unwrap();
        s.select_mode(MotionMode::Rigid);
        assert_eq!(s.state(), PlayState::Idle);
        assert!(s.play(Direction::Forward).is_err());
        s.arm().unwrap();
        assert_eq!(s.state(), PlayState::Armed);
    }

    #[test]
    fn test_convex_arming_triangulates() {
        let mut s = session(10);
        s.select_mode(MotionMode::Convex);
        s.arm().unwrap();
        assert!(s.triangulation().is_some());
        assert_eq!(s.working_pair().node_count(), 7);
        let snapshot = s.snapshot();
        assert_eq!(snapshot.structural_edges.len(), 3);
        assert_eq!(snapshot.triangles.len(), 8);
        assert_eq!(snapshot.origins[3], NodeOrigin::Frame);
    }

    #[test]
    fn test_run_stops_at_last_frame() {
        let mut s = session(5);
        s.arm().unwrap();
        s.play(Direction::Forward).unwrap();
        let mut frames = Vec::new();
        let emitted = s.run(|snap| {
            frames.push(snap.frame);
            true
        });
        assert_eq!(emitted, 5);
        assert_eq!(frames, vec![1, 2, 3, 4, 5]);
        assert_eq!(s.state(), PlayState::Paused);
    }

    #[test]
    fn test_run_stops_when_sink_declines() {
        let mut s = session(50);
        s.arm().unwrap();
        s.play(Direction::Forward).unwrap();
        let emitted = s.run(|snap| snap.frame < 3);
        assert_eq!(emitted, 3);
        assert_eq!(s.state(), PlayState::Paused);
        s.reset();
        assert_eq!(s.frame().current, 0);
        assert_eq!(s.state(), PlayState::Armed);
    }

    #[test]
    fn test_session_enforces_capacity() {
        let config = MorphConfig::default().with_capacity(2, 800);
        assert!(matches!(
            MorphSession::new(triangle_pair(), config),
            Err(MorphError::CapacityExceeded { what: "nodes", .. })
        ));
    }
}
