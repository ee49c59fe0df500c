use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tilemark::annotation::{Annotation, ElementAnnotation, FeatureCollection};
use tilemark::bus::{BusAdapter, BusCommand, BusEvent, RegionModel};
use tilemark::config::Config;
use tilemark::convert::{self, Region};
use tilemark::draw_mode::DrawOptions;
use tilemark::headless::{HeadlessBackend, ViewportCall};
use tilemark::runtime::ViewerLoop;
use tilemark::viewer::{Viewer, ViewerSettings};
use tilemark::viewport::{
    MapParams, RawAnnotation, ShapeKind, TileInfo, TileUrlTemplate, ViewportEvent,
};

#[derive(Parser, Debug)]
#[command(name = "tilemark")]
#[command(version, about = "Annotation overlays and interactive draw mode for tiled-image viewports")]
struct Cli {
    /// Read settings from this file instead of the default config path
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print map parameters for an image as JSON
    Params(ImageArgs),

    /// Normalize a drawn annotation (JSON) into an element
    Convert {
        /// Input file; standard input when omitted
        file: Option<PathBuf>,

        /// Assign an identity when the drawing layer supplied none
        #[arg(long)]
        with_id: bool,
    },

    /// Print the `[left, top, width, height]` region of a drawn rectangle
    Region {
        /// Input file; standard input when omitted
        file: Option<PathBuf>,
    },

    /// Export an annotation document as a feature collection
    Geojson {
        /// Input file; standard input when omitted
        file: Option<PathBuf>,
    },

    /// Run a full draw session against the headless viewport
    Simulate {
        #[command(flatten)]
        image: ImageArgs,

        /// Request a region instead of publishing the element
        #[arg(long)]
        region: bool,

        /// Drawn annotation (JSON); standard input when omitted
        file: Option<PathBuf>,
    },

    /// Show configuration details
    Config {
        /// Print the JSON schema of the config file
        #[arg(long, conflicts_with = "path")]
        schema: bool,

        /// Print the config file location
        #[arg(long)]
        path: bool,
    },
}

#[derive(Args, Debug)]
struct ImageArgs {
    /// Image width in pixels
    #[arg(long, default_value_t = 1024)]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 1024)]
    height: u32,

    #[arg(long, default_value_t = 256)]
    tile_width: u32,

    #[arg(long, default_value_t = 256)]
    tile_height: u32,

    /// Image identifier substituted into the tile path
    #[arg(long, default_value = "image")]
    item: String,
}

impl ImageArgs {
    fn tile_info(&self) -> TileInfo {
        let tile_width = self.tile_width.max(1);
        let tile_height = self.tile_height.max(1);
        let tiles_across = (self.width as f64 / tile_width as f64)
            .max(self.height as f64 / tile_height as f64);
        TileInfo {
            levels: tiles_across.log2().ceil().max(0.0) as u32 + 1,
            size_x: self.width,
            size_y: self.height,
            tile_width,
            tile_height,
        }
    }
}

#[derive(Serialize)]
struct SimulationReport {
    events: Vec<BusEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<Region>,
    calls: Vec<ViewportCall>,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Command::Params(image) => {
            let settings = ViewerSettings::from(&config);
            let url = TileUrlTemplate::new(&settings.api_root, &settings.tile_path, &image.item);
            let params = MapParams::pixel_coordinates(
                settings.node_width,
                settings.node_height,
                &image.tile_info(),
                url,
            );
            print_json(&params)?;
        }
        Command::Convert { file, with_id } => {
            let raw = read_raw(file.as_deref())?;
            let mut element = convert::convert(&raw)?;
            if with_id {
                element.ensure_id();
            }
            print_json(&element)?;
        }
        Command::Region { file } => {
            let raw = read_raw(file.as_deref())?;
            if raw.kind != ShapeKind::Rectangle {
                return Err(anyhow!("expected a rectangle, got a {}", raw.kind));
            }
            let region = Region::from_element(&convert::convert(&raw)?)?;
            print_json(&region)?;
        }
        Command::Geojson { file } => {
            let input = read_input(file.as_deref())?;
            let document: ElementAnnotation =
                serde_json::from_str(&input).context("Failed to parse annotation document")?;
            let collection: FeatureCollection = document.geojson();
            print_json(&collection)?;
        }
        Command::Simulate {
            image,
            region,
            file,
        } => {
            let raw = read_raw(file.as_deref())?;
            let report = simulate(&config, &image, raw, region)?;
            print_json(&report)?;
        }
        Command::Config { schema, path } => {
            if schema {
                print_json(&Config::json_schema())?;
            } else if path {
                match &cli.config {
                    Some(path) => println!("{}", path.display()),
                    None => println!("{}", Config::get_config_path()?.display()),
                }
            } else {
                print!(
                    "{}",
                    toml::to_string_pretty(&config).context("Failed to serialize config")?
                );
            }
        }
    }

    Ok(())
}

/// Renders the image headlessly, starts one session for `raw`'s shape, feeds
/// the shape back as the user's drawing and shuts the viewer down.
fn simulate(
    config: &Config,
    image: &ImageArgs,
    raw: RawAnnotation,
    region: bool,
) -> Result<SimulationReport> {
    let backend = HeadlessBackend::new();
    let log = backend.log().clone();
    let (adapter, mut incoming) = BusAdapter::channel();

    let mut viewer = Viewer::new(ViewerSettings::from(config), adapter);
    viewer.attach_backend(backend);
    viewer.set_image(image.item.clone(), image.tile_info());
    let mut viewer_loop = ViewerLoop::new(viewer)?;
    let commands = viewer_loop.commands();
    let tick = Some(Duration::ZERO);

    commands.send(BusCommand::Render)?;
    viewer_loop.dispatch(tick)?;
    if !viewer_loop.viewer().is_rendered() {
        return Err(anyhow!("image could not be rendered"));
    }

    let model: Option<RegionModel> = region.then(RegionModel::new);
    if let Some(model) = &model {
        if raw.kind != ShapeKind::Rectangle {
            return Err(anyhow!("regions are drawn as rectangles, got a {}", raw.kind));
        }
        commands.send(BusCommand::DrawRegion {
            model: Some(model.clone()),
        })?;
    } else {
        commands.send(BusCommand::StartDrawMode {
            shape: raw.kind,
            options: Some(DrawOptions::default()),
        })?;
    }
    viewer_loop.dispatch(tick)?;

    let layer = viewer_loop
        .viewer()
        .active_draw_layer()
        .context("draw session did not start")?;
    viewer_loop
        .viewport_events()
        .send(ViewportEvent::AnnotationState {
            layer,
            annotation: raw,
        })?;
    viewer_loop.dispatch(tick)?;

    commands.send(BusCommand::Shutdown)?;
    viewer_loop.run()?;

    let mut events = Vec::new();
    while let Ok(Some(event)) = incoming.try_next() {
        events.push(event);
    }
    Ok(SimulationReport {
        events,
        region: model.and_then(|model| model.region()),
        calls: log.calls(),
    })
}

fn read_raw(path: Option<&Path>) -> Result<RawAnnotation> {
    let input = read_input(path)?;
    serde_json::from_str(&input).context("Failed to parse drawn annotation")
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read standard input")?;
            Ok(input)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
