//! plotfill - plotter fill toolpaths from SVG shapes
//!
//! Usage:
//!   plotfill fill <svg> [options]     Generate fill strokes
//!   plotfill shapes <svg>             List fillable shapes in a document
//!   plotfill render <svg> -o <png>    Fill and rasterize a preview image
//!   plotfill help                     Show full usage

use std::env;
use std::fs;
use std::io::{self, Read};

use serde::{Deserialize, Serialize};

use resvg::usvg;
use tiny_skia::Pixmap;

use plotfill::{
    extract_scene_from_svg, parse_guide_path, stage_shapes, FillJob, FillMode, FillSettings,
    Progress, Rect, StepStatus, TraceStroke,
};

/// Default safety valve for the frame loop; each frame runs one step budget.
const MAX_FRAMES: u64 = 4_000_000;

/// Pixels per document unit for the render command.
const DEFAULT_RENDER_SCALE: f64 = 4.0;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    match args[1].as_str() {
        "fill" => cmd_fill(&args[2..]),
        "shapes" => cmd_shapes(&args[2..]),
        "render" => cmd_render(&args[2..]),
        "help" | "--help" | "-h" => print_usage(&args[0]),
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage(&args[0]);
            std::process::exit(1);
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum OutputFormat {
    Svg,
    Json,
}

/// A fill job described in YAML. Every field is optional; command line
/// flags override whatever the file sets.
#[derive(Default, Deserialize)]
struct JobFile {
    input: Option<String>,
    output: Option<String>,
    format: Option<String>,
    /// Guide path data (an SVG `d` attribute) for overlay mode.
    guide: Option<String>,
    #[serde(default)]
    settings: FillSettings,
}

/// One pen stroke in JSON output.
#[derive(Serialize)]
struct JsonStroke {
    #[serde(skip_serializing_if = "Option::is_none")]
    shape: Option<String>,
    color: String,
    pen: String,
    width: f64,
    points: Vec<[f64; 2]>,
}

/// Top level JSON output for a fill run.
#[derive(Serialize)]
struct JsonOutput {
    view: [f64; 2],
    total_shapes: u32,
    steps: u32,
    strokes: Vec<JsonStroke>,
}

fn print_usage(prog: &str) {
    eprintln!("plotfill - plotter fill toolpaths from SVG shapes");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {} fill <svg> [options]      Generate fill strokes", prog);
    eprintln!("  {} shapes <svg>              List fillable shapes", prog);
    eprintln!("  {} render <svg> -o <png>     Fill and rasterize a preview", prog);
    eprintln!("  {} help                      Show this message", prog);
    eprintln!();
    eprintln!("Fill options:");
    eprintln!("  -c, --config <file>    YAML job file (flags override it)");
    eprintln!("  -m, --mode <name>      Fill mode: zigzag, zigstraight, zigsmooth, overlay");
    eprintln!("  -s, --spacing <n>      Distance between scan lines (default: 13)");
    eprintln!("  -a, --angle <deg>      Scan line angle, 0 is horizontal (default: 28)");
    eprintln!("  -w, --width <n>        Stroke width on output (default: 10)");
    eprintln!("  -t, --target <name>    Fill only the shape with this id");
    eprintln!("  -g, --guide <d>        Custom guide path data (switches to overlay mode)");
    eprintln!("  --hatch                Run a second pass rotated 90 degrees");
    eprintln!("  --seed <n>             Randomize scan angles with a fixed seed");
    eprintln!("  --random               Randomize scan angles with a fresh seed");
    eprintln!("  --no-occlusion         Also fill areas hidden behind later shapes");
    eprintln!("  --no-align             Center overlay guides on the view, not each shape");
    eprintln!("  --budget <n>           Work units per frame (default: 2)");
    eprintln!("  --resolution <n>       Guide sampling distance (default: 15)");
    eprintln!("  --threshold <n>        Segment grouping distance (default: 40)");
    eprintln!("  --max-frames <n>       Abort after this many frames (default: 4000000)");
    eprintln!("  -f, --format <fmt>     Output format: svg, json (default: svg)");
    eprintln!("  -o, --output <file>    Output file (- for stdout, default: stdout)");
    eprintln!("  -q, --quiet            Suppress progress messages");
    eprintln!("  -v, --verbose          Enable debug logging");
    eprintln!();
    eprintln!("Shapes options:");
    eprintln!("  -t, --target <name>    Mark the shape with this id as the target");
    eprintln!("  --no-occlusion         List outlines without occlusion subtraction");
    eprintln!();
    eprintln!("Render options (in addition to the fill options):");
    eprintln!("  --scale <n>            Pixels per document unit (default: 4)");
    eprintln!();
    eprintln!("Stdin support:");
    eprintln!("  Use '-' as the input file to read SVG from stdin:");
    eprintln!("  cat drawing.svg | {} fill - -m zigsmooth -o -", prog);
}

/// Route log output to stderr so piped stdout stays clean.
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "plotfill=debug" } else { "plotfill=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(io::stderr)
        .init();
}

/// Everything the fill and render commands share, merged from the job
/// file and the command line.
struct FillOptions {
    svg_path: Option<String>,
    output_path: Option<String>,
    format: OutputFormat,
    settings: FillSettings,
    guide_d: Option<String>,
    scale: f64,
    max_frames: u64,
    quiet: bool,
    verbose: bool,
}

fn parse_fill_options(args: &[String]) -> FillOptions {
    let mut svg_path: Option<String> = None;
    let mut config_path: Option<String> = None;
    let mut output_path: Option<String> = None;
    let mut format_flag: Option<OutputFormat> = None;
    let mut mode_flag: Option<FillMode> = None;
    let mut spacing_flag: Option<f64> = None;
    let mut angle_flag: Option<f64> = None;
    let mut width_flag: Option<f64> = None;
    let mut target_flag: Option<String> = None;
    let mut guide_flag: Option<String> = None;
    let mut seed_flag: Option<u64> = None;
    let mut budget_flag: Option<u32> = None;
    let mut resolution_flag: Option<f64> = None;
    let mut threshold_flag: Option<f64> = None;
    let mut random = false;
    let mut hatch = false;
    let mut no_occlusion = false;
    let mut no_align = false;
    let mut scale = DEFAULT_RENDER_SCALE;
    let mut max_frames = MAX_FRAMES;
    let mut quiet = false;
    let mut verbose = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-c" | "--config" => {
                i += 1;
                if i < args.len() {
                    config_path = Some(args[i].clone());
                }
            }
            "-m" | "--mode" => {
                i += 1;
                if i < args.len() {
                    mode_flag = Some(FillMode::from_name(&args[i]).unwrap_or_else(|| {
                        eprintln!(
                            "Unknown mode: {}. Use 'zigzag', 'zigstraight', 'zigsmooth' or 'overlay'.",
                            args[i]
                        );
                        std::process::exit(1);
                    }));
                }
            }
            "-s" | "--spacing" => {
                i += 1;
                if i < args.len() {
                    spacing_flag = Some(parse_number(&args[i], "--spacing"));
                }
            }
            "-a" | "--angle" => {
                i += 1;
                if i < args.len() {
                    angle_flag = Some(parse_number(&args[i], "--angle"));
                }
            }
            "-w" | "--width" => {
                i += 1;
                if i < args.len() {
                    width_flag = Some(parse_number(&args[i], "--width"));
                }
            }
            "-t" | "--target" => {
                i += 1;
                if i < args.len() {
                    target_flag = Some(args[i].clone());
                }
            }
            "-g" | "--guide" => {
                i += 1;
                if i < args.len() {
                    guide_flag = Some(args[i].clone());
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    seed_flag = Some(args[i].parse().unwrap_or_else(|_| {
                        eprintln!("Invalid --seed value: {}", args[i]);
                        std::process::exit(1);
                    }));
                }
            }
            "--random" => {
                random = true;
            }
            "--hatch" => {
                hatch = true;
            }
            "--no-occlusion" => {
                no_occlusion = true;
            }
            "--no-align" => {
                no_align = true;
            }
            "--budget" => {
                i += 1;
                if i < args.len() {
                    budget_flag = Some(args[i].parse().unwrap_or_else(|_| {
                        eprintln!("Invalid --budget value: {}", args[i]);
                        std::process::exit(1);
                    }));
                }
            }
            "--resolution" => {
                i += 1;
                if i < args.len() {
                    resolution_flag = Some(parse_number(&args[i], "--resolution"));
                }
            }
            "--threshold" => {
                i += 1;
                if i < args.len() {
                    threshold_flag = Some(parse_number(&args[i], "--threshold"));
                }
            }
            "--max-frames" => {
                i += 1;
                if i < args.len() {
                    max_frames = args[i].parse().unwrap_or_else(|_| {
                        eprintln!("Invalid --max-frames value: {}", args[i]);
                        std::process::exit(1);
                    });
                }
            }
            "--scale" => {
                i += 1;
                if i < args.len() {
                    scale = parse_number(&args[i], "--scale");
                }
            }
            "-f" | "--format" => {
                i += 1;
                if i < args.len() {
                    format_flag = Some(match args[i].to_lowercase().as_str() {
                        "json" => OutputFormat::Json,
                        "svg" => OutputFormat::Svg,
                        other => {
                            eprintln!("Unknown format: {}. Use 'svg' or 'json'.", other);
                            std::process::exit(1);
                        }
                    });
                }
            }
            "-o" | "--output" => {
                i += 1;
                if i < args.len() {
                    output_path = Some(args[i].clone());
                }
            }
            "-q" | "--quiet" => {
                quiet = true;
            }
            "-v" | "--verbose" => {
                verbose = true;
            }
            path => {
                if svg_path.is_none() && (path == "-" || !path.starts_with('-')) {
                    svg_path = Some(path.to_string());
                }
            }
        }
        i += 1;
    }

    // Start from the job file, then let flags override.
    let job = match &config_path {
        Some(path) => load_job_file(path),
        None => JobFile::default(),
    };

    let mut settings = job.settings;
    if let Some(mode) = mode_flag {
        settings.mode = mode;
    }
    if let Some(spacing) = spacing_flag {
        settings.spacing = spacing;
    }
    if let Some(angle) = angle_flag {
        settings.angle = angle;
    }
    if let Some(width) = width_flag {
        settings.stroke_width = width;
    }
    if let Some(target) = target_flag {
        settings.target = Some(target);
    }
    if let Some(budget) = budget_flag {
        settings.step_budget = budget;
    }
    if let Some(resolution) = resolution_flag {
        settings.flatten_resolution = resolution;
    }
    if let Some(threshold) = threshold_flag {
        settings.threshold = threshold;
    }
    if hatch {
        settings.hatch = true;
    }
    if no_occlusion {
        settings.check_occlusion = false;
    }
    if no_align {
        settings.align_guide_to_shape = false;
    }
    if let Some(seed) = seed_flag {
        settings.randomize_angle = true;
        settings.random_seed = seed;
    } else if random {
        settings.randomize_angle = true;
        settings.random_seed = rand::random();
    }

    let format = match format_flag {
        Some(format) => format,
        None => match job.format.as_deref() {
            Some("json") => OutputFormat::Json,
            Some("svg") | None => OutputFormat::Svg,
            Some(other) => {
                eprintln!("Unknown format in job file: {}. Use 'svg' or 'json'.", other);
                std::process::exit(1);
            }
        },
    };

    FillOptions {
        svg_path: svg_path.or(job.input),
        output_path: output_path.or(job.output),
        format,
        settings,
        guide_d: guide_flag.or(job.guide),
        scale,
        max_frames,
        quiet,
        verbose,
    }
}

fn load_job_file(path: &str) -> JobFile {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading {}: {}", path, e);
            std::process::exit(1);
        }
    };
    match serde_yaml::from_str(&content) {
        Ok(job) => job,
        Err(e) => {
            eprintln!("Error parsing {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

fn parse_number(value: &str, flag: &str) -> f64 {
    value.parse().unwrap_or_else(|_| {
        eprintln!("Invalid {} value: {}", flag, value);
        std::process::exit(1);
    })
}

/// Read SVG content from a file path, or from stdin when the path is "-".
fn read_svg_input(path: &str, quiet: bool) -> String {
    if path == "-" {
        if !quiet {
            eprintln!("Reading SVG from stdin...");
        }
        let mut buffer = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut buffer) {
            eprintln!("Error reading stdin: {}", e);
            std::process::exit(1);
        }
        buffer
    } else {
        if !quiet {
            eprintln!("Loading: {}", path);
        }
        match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading {}: {}", path, e);
                std::process::exit(1);
            }
        }
    }
}

/// What a completed fill run leaves behind.
struct FillOutcome {
    view: Rect,
    strokes: Vec<TraceStroke>,
    progress: Progress,
}

fn run_fill(svg_content: &str, options: &FillOptions) -> FillOutcome {
    let scene = match extract_scene_from_svg(svg_content) {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("Error parsing SVG: {}", e);
            std::process::exit(1);
        }
    };

    if !options.quiet {
        eprintln!(
            "Loaded {} shapes ({}x{} view)",
            scene.shapes.len(),
            scene.view.width(),
            scene.view.height()
        );
    }

    let mut settings = options.settings.clone();
    if let Some(d) = &options.guide_d {
        let guide = match parse_guide_path(d) {
            Ok(points) => points,
            Err(e) => {
                eprintln!("Error parsing guide path: {}", e);
                std::process::exit(1);
            }
        };
        settings.guide = Some(guide);
        // A custom guide only makes sense traced as an overlay.
        settings.mode = FillMode::Overlay;
    }

    let mut job = FillJob::new(settings);
    job.start(scene.shapes, scene.view);

    let mut frames: u64 = 0;
    while job.step() == StepStatus::Running {
        frames += 1;
        if frames >= options.max_frames {
            eprintln!(
                "Error: fill did not finish within {} frames",
                options.max_frames
            );
            std::process::exit(1);
        }
        if !options.quiet && frames % 2000 == 0 {
            let p = job.progress();
            eprintln!("  shape {}/{} ({} steps)", p.current_shape, p.total_shapes, p.steps);
        }
    }

    let progress = job.progress();
    if !options.quiet {
        eprintln!(
            "Filled {} of {} shapes in {} steps, {} strokes",
            progress.current_shape,
            progress.total_shapes,
            progress.steps,
            job.strokes().len()
        );
    }

    FillOutcome {
        view: scene.view,
        strokes: job.into_strokes(),
        progress,
    }
}

fn cmd_fill(args: &[String]) {
    let options = parse_fill_options(args);
    init_logging(options.verbose);

    let svg_path = options.svg_path.clone().unwrap_or_else(|| {
        eprintln!("Error: SVG file required (use '-' for stdin)");
        std::process::exit(1);
    });

    let svg_content = read_svg_input(&svg_path, options.quiet);
    let outcome = run_fill(&svg_content, &options);

    let output = match options.format {
        OutputFormat::Svg => strokes_to_svg(&outcome.strokes, outcome.view),
        OutputFormat::Json => strokes_to_json(&outcome),
    };

    match options.output_path.as_deref() {
        Some("-") | None => {
            println!("{}", output);
        }
        Some(path) => {
            if let Err(e) = fs::write(path, &output) {
                eprintln!("Error writing {}: {}", path, e);
                std::process::exit(1);
            }
            if !options.quiet {
                eprintln!("Wrote: {}", path);
            }
        }
    }
}

fn cmd_shapes(args: &[String]) {
    let mut svg_path: Option<String> = None;
    let mut settings = FillSettings::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-t" | "--target" => {
                i += 1;
                if i < args.len() {
                    settings.target = Some(args[i].clone());
                }
            }
            "--no-occlusion" => {
                settings.check_occlusion = false;
            }
            path => {
                if svg_path.is_none() && (path == "-" || !path.starts_with('-')) {
                    svg_path = Some(path.to_string());
                }
            }
        }
        i += 1;
    }

    let svg_path = svg_path.unwrap_or_else(|| {
        eprintln!("Error: SVG file required (use '-' for stdin)");
        std::process::exit(1);
    });

    let svg_content = read_svg_input(&svg_path, true);
    let scene = match extract_scene_from_svg(&svg_content) {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("Error parsing SVG: {}", e);
            std::process::exit(1);
        }
    };

    // List the stack the way a fill job would consume it.
    let stack = stage_shapes(&scene.shapes, &settings);

    println!(
        "{} shapes in a {}x{} view",
        stack.len(),
        scene.view.width(),
        scene.view.height()
    );
    for (index, shape) in stack.iter().enumerate() {
        let name = shape.name.as_deref().unwrap_or("(unnamed)");
        let (r, g, b) = shape.fill;
        let points: usize = shape.contours.iter().map(Vec::len).sum();
        let size = match shape.bounding_box() {
            Some(b) => format!("{:.0}x{:.0}", b.width(), b.height()),
            None => "empty".to_string(),
        };
        let mut marker = String::new();
        if shape.target {
            marker.push_str("  [target]");
        }
        if shape.color_id.is_paper() {
            marker.push_str("  [paper, not filled]");
        }
        println!(
            "  [{}] {:16} #{:02x}{:02x}{:02x} {} ({}), {}, {} contours, {} points{}",
            index,
            name,
            r,
            g,
            b,
            shape.color_id.label(),
            shape.color_id.name(),
            size,
            shape.contours.len(),
            points,
            marker
        );
    }
}

fn cmd_render(args: &[String]) {
    let options = parse_fill_options(args);
    init_logging(options.verbose);

    let svg_path = options.svg_path.clone().unwrap_or_else(|| {
        eprintln!("Error: SVG file required (use '-' for stdin)");
        std::process::exit(1);
    });
    let output_path = options.output_path.clone().unwrap_or_else(|| {
        eprintln!("Error: render needs an output PNG path (-o)");
        std::process::exit(1);
    });

    let svg_content = read_svg_input(&svg_path, options.quiet);
    let outcome = run_fill(&svg_content, &options);

    render_to_png(&outcome, options.scale, &output_path);
    if !options.quiet {
        eprintln!("Wrote: {}", output_path);
    }
}

/// Format a palette color as `#rrggbb`.
fn hex_color((r, g, b): (u8, u8, u8)) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Polyline elements for a group of strokes, one element per stroke.
fn polyline_body(strokes: &[TraceStroke]) -> String {
    let mut body = String::new();
    for stroke in strokes {
        body.push_str("  <polyline points=\"");
        for (i, p) in stroke.points.iter().enumerate() {
            if i > 0 {
                body.push(' ');
            }
            body.push_str(&format!("{:.2},{:.2}", p.x, p.y));
        }
        body.push_str(&format!(
            "\" stroke=\"{}\" stroke-width=\"{}\"/>\n",
            hex_color(stroke.color),
            stroke.width
        ));
    }
    body
}

/// Convert strokes to a standalone SVG document.
fn strokes_to_svg(strokes: &[TraceStroke], view: Rect) -> String {
    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}">
<g fill="none" stroke-linecap="round" stroke-linejoin="round">
"#,
        view.width(),
        view.height()
    ));
    svg.push_str(&polyline_body(strokes));
    svg.push_str("</g>\n</svg>\n");
    svg
}

/// Convert strokes to the JSON output document.
fn strokes_to_json(outcome: &FillOutcome) -> String {
    let strokes: Vec<JsonStroke> = outcome
        .strokes
        .iter()
        .map(|stroke| JsonStroke {
            shape: stroke.name.clone(),
            color: hex_color(stroke.color),
            pen: stroke.color_id.label(),
            width: stroke.width,
            points: stroke.points.iter().map(|p| [p.x, p.y]).collect(),
        })
        .collect();

    let output = JsonOutput {
        view: [outcome.view.width(), outcome.view.height()],
        total_shapes: outcome.progress.total_shapes,
        steps: outcome.progress.steps,
        strokes,
    };
    serde_json::to_string(&output).expect("Failed to serialize JSON")
}

/// Rasterize strokes to a PNG preview on a white background.
fn render_to_png(outcome: &FillOutcome, scale: f64, path: &str) {
    let width = (outcome.view.width() * scale).ceil().max(1.0) as u32;
    let height = (outcome.view.height() * scale).ceil().max(1.0) as u32;

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<rect width="100%" height="100%" fill="white"/>
<g fill="none" stroke-linecap="round" stroke-linejoin="round">
"#,
        width,
        height,
        outcome.view.width(),
        outcome.view.height()
    ));
    svg.push_str(&polyline_body(&outcome.strokes));
    svg.push_str("</g>\n</svg>");

    let options = usvg::Options::default();
    let tree = match usvg::Tree::from_str(&svg, &options) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("Error building preview SVG: {}", e);
            std::process::exit(1);
        }
    };

    let Some(mut pixmap) = Pixmap::new(width, height) else {
        eprintln!("Error: preview too large ({}x{} px)", width, height);
        std::process::exit(1);
    };

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    if let Err(e) = pixmap.save_png(path) {
        eprintln!("Error writing {}: {}", path, e);
        std::process::exit(1);
    }
}
