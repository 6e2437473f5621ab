//! Graph Morph CLI
//!
//! Usage:
//!   graph-morph [OPTIONS] [FILE]
//!
//! Options:
//!   -m, --mode <MODE>               linear, rigid, convex or hybrid
//!   -n, --frames <N>                Number of frames in the morph
//!   -f, --frame <F>                 Frame to render to stdout (default 0)
//!   -o, --out-dir <DIR>             Render every frame into DIR
//!       --play                      Play in real time into --out-dir
//!   -c, --config <FILE>             Morph configuration (TOML format)
//!   -s, --stylesheet <FILE>         Stylesheet file for color palette (TOML format)
//!       --steiner                   Draw the triangulation's Steiner edges and nodes
//!       --save-triangulated <FILE>  Write the compatible triangulation as records
//!   -d, --debug                     Dump frame positions to stderr
//!   -v, --verbose                   More log output (repeatable)
//!   -h, --help                      Print help

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use log::{info, LevelFilter};

use graph_morph::{
    read_records, render_frame_with_stylesheet, write_records, Direction, FrameSnapshot,
    MorphConfig, MorphSession, MotionMode, PipelineError, Stylesheet, SvgConfig,
};

#[derive(Parser)]
#[command(name = "graph-morph")]
#[command(about = "Intersection-free morphing between two drawings of a graph")]
struct Cli {
    /// Input record file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Motion model: linear, rigid, convex or hybrid
    #[arg(short, long)]
    mode: Option<MotionMode>,

    /// Number of frames in the morph
    #[arg(short = 'n', long)]
    frames: Option<u32>,

    /// Frame to render to stdout
    #[arg(short, long, default_value_t = 0)]
    frame: u32,

    /// Render every frame into this directory
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Play the morph in real time, writing frames into --out-dir
    #[arg(long, requires = "out_dir")]
    play: bool,

    /// Morph configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stylesheet file for color palette (TOML format)
    #[arg(short, long)]
    stylesheet: Option<PathBuf>,

    /// Draw the triangulation's Steiner edges and nodes
    #[arg(long)]
    steiner: bool,

    /// Write the compatible triangulation as records to this file
    #[arg(long)]
    save_triangulated: Option<PathBuf>,

    /// Debug mode: dump frame positions to stderr
    #[arg(short, long)]
    debug: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.input.is_none() && io::stdin().is_terminal() {
        print_intro();
        return;
    }

    // Morph configuration, then command-line overrides
    let mut config = match &cli.config {
        Some(path) => MorphConfig::from_file(path).unwrap_or_else(|e| {
            fail(format!("loading config '{}': {}", path.display(), e))
        }),
        None => MorphConfig::default(),
    };
    if let Some(mode) = cli.mode {
        config = config.with_mode(mode);
    }
    if let Some(frames) = cli.frames {
        config = config.with_total_frames(frames);
    }
    if let Err(e) = config.validate() {
        fail(e);
    }

    let stylesheet = match &cli.stylesheet {
        Some(path) => Stylesheet::from_file(path).unwrap_or_else(|e| {
            fail(format!("loading stylesheet '{}': {}", path.display(), e))
        }),
        None => Stylesheet::default(),
    };

    let (source, filename) = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => fail(format!("reading file '{}': {}", path.display(), e)),
        },
        None => {
            let mut buffer = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buffer) {
                fail(format!("reading from stdin: {}", e));
            }
            (buffer, "<stdin>".to_string())
        }
    };

    let pair = match read_records(&source) {
        Ok(pair) => pair,
        Err(errors) => {
            for err in &errors {
                eprint!("{}", err.format(&source, &filename));
            }
            fail(PipelineError::Parse(errors));
        }
    };

    let mut session = MorphSession::new(pair, config).unwrap_or_else(|e| fail(e));

    if let Some(path) = &cli.save_triangulated {
        let triangulation = session.triangulate().unwrap_or_else(|e| fail(e));
        if let Err(e) = fs::write(path, write_records(&triangulation.pair)) {
            fail(format!("writing '{}': {}", path.display(), e));
        }
        info!("wrote compatible triangulation to {}", path.display());
    }

    if let Err(e) = session.arm() {
        fail(e);
    }

    let svg_config = SvgConfig::default().with_steiner(cli.steiner || cli.debug);
    let render = |snapshot: &FrameSnapshot| -> String {
        if cli.debug {
            eprintln!("=== Frame {} ===", snapshot.frame);
            for (i, p) in snapshot.positions.iter().enumerate() {
                eprintln!("  [{}] x={:.2} y={:.2}", i, p.x, p.y);
            }
        }
        render_frame_with_stylesheet(snapshot, &svg_config, &stylesheet)
    };

    match &cli.out_dir {
        Some(dir) if cli.play => play_into(&mut session, dir, &render),
        Some(dir) => {
            create_dir(dir);
            for frame in 0..=session.frame().total {
                if let Err(e) = session.capture_frame(frame) {
                    eprintln!("Warning: frame {}: {}", frame, e);
                }
                write_frame(dir, frame, &render(&session.snapshot()));
            }
        }
        None => {
            if let Err(e) = session.capture_frame(cli.frame) {
                fail(e);
            }
            println!("{}", render(&session.snapshot()));
        }
    }
}

fn create_dir(dir: &Path) {
    if let Err(e) = fs::create_dir_all(dir) {
        fail(format!("creating '{}': {}", dir.display(), e));
    }
}

fn write_frame(dir: &Path, frame: u32, svg: &str) {
    let path = dir.join(format!("frame_{:04}.svg", frame));
    if let Err(e) = fs::write(&path, svg) {
        fail(format!("writing '{}': {}", path.display(), e));
    }
}

fn play_into(session: &mut MorphSession, dir: &Path, render: &dyn Fn(&FrameSnapshot) -> String) {
    create_dir(dir);
    write_frame(dir, session.frame().current, &render(&session.snapshot()));
    if let Err(e) = session.play(Direction::Forward) {
        fail(e);
    }
    let played = session.run(|snapshot| {
        write_frame(dir, snapshot.frame, &render(snapshot));
        true
    });
    info!("played {} frames into {}", played, dir.display());
}

fn print_intro() {
    println!(
        r#"Graph Morph - intersection-free morphing between two drawings of a graph

USAGE:
    graph-morph [OPTIONS] [FILE]
    cat pair.txt | graph-morph --mode convex --frame 50 > frame.svg

INPUT RECORDS:
    node <id> <x> <y> <r> <g> <b> <graph>    graph is 0 (initial) or 1 (final)
    edge <graph> <from> <to> <edgeId>

OPTIONS:
    -m, --mode           linear, rigid, convex or hybrid
    -n, --frames         Number of frames (default 100)
    -f, --frame          Frame to render to stdout (default 0)
    -o, --out-dir        Render every frame into a directory
    --play               Play in real time into --out-dir
    -c, --config         Morph configuration (TOML file)
    -s, --stylesheet     Custom color palette (TOML file)
    --steiner            Draw Steiner edges and nodes
    --save-triangulated  Write the compatible triangulation as records
    -v, --verbose        More log output
    -h, --help           Print help"#
    );
}
