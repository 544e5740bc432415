use crate::choropleth::{HoverTracker, RegionBinder};
use crate::config::{Config, load_config};
use crate::data::{Dataset, RegionFeature, RegionShape, load_polygon_feed};
use crate::layout::compute_sankey;
use crate::layout_dump::{LayoutDump, write_layout_dump};
#[cfg(feature = "png")]
use crate::render::write_output_png;
use crate::render::{render_map_svg, render_sankey_svg, write_output_svg};
use crate::sample;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "tatlas",
    version,
    about = "Treatment dashboard renderer: referral Sankey and adoption choropleth"
)]
pub struct Args {
    /// Which view to render
    #[arg(long = "view", value_enum, default_value = "sankey")]
    pub view: View,

    /// Dataset JSON ({stages, flows, regions}) or '-' for stdin. Built-in sample data when omitted.
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Polygon feed JSON for the map view. Built-in tile grid when omitted.
    #[arg(long = "regions")]
    pub regions: Option<PathBuf>,

    /// Region id to render as hovered (map view)
    #[arg(long = "hover")]
    pub hover: Option<String>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON5 file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Width of the active view
    #[arg(short = 'w', long = "width")]
    pub width: Option<f64>,

    /// Height of the active view
    #[arg(short = 'H', long = "height")]
    pub height: Option<f64>,

    /// Write computed geometry as JSON
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(long = "verbose")]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Sankey,
    Map,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    apply_size_overrides(&mut config, args.view, args.width, args.height);

    let dataset = read_dataset(args.input.as_deref())?;
    let svg = match args.view {
        View::Sankey => render_sankey_view(&dataset, &config, args.dump_layout.as_deref())?,
        View::Map => {
            let loaded;
            let feed: &[RegionFeature<RegionShape>] = match args.regions.as_deref() {
                Some(path) => {
                    loaded = load_polygon_feed(path)?;
                    &loaded
                }
                None => sample::tile_feed(),
            };
            render_map_view(
                &dataset,
                feed,
                &config,
                args.hover.as_deref(),
                args.dump_layout.as_deref(),
            )?
        }
    };

    match args.output_format {
        OutputFormat::Svg => write_output_svg(&svg, args.output.as_deref())?,
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_png(&svg, &output, &config)?;
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn apply_size_overrides(config: &mut Config, view: View, width: Option<f64>, height: Option<f64>) {
    match view {
        View::Sankey => {
            if let Some(width) = width {
                config.sankey.viewport.width = width;
            }
            if let Some(height) = height {
                config.sankey.viewport.height = height;
            }
        }
        View::Map => {
            if let Some(width) = width {
                config.choropleth.width = width;
            }
            if let Some(height) = height {
                config.choropleth.height = height;
            }
        }
    }
}

fn render_sankey_view(dataset: &Dataset, config: &Config, dump: Option<&Path>) -> Result<String> {
    let layout = compute_sankey(dataset, &config.sankey.viewport, config.sankey.measure)?;
    if let Some(path) = dump {
        write_layout_dump(path, &LayoutDump::from_sankey(&layout))?;
    }
    Ok(render_sankey_svg(&layout, &config.theme, &config.sankey))
}

fn render_map_view(
    dataset: &Dataset,
    feed: &[RegionFeature<RegionShape>],
    config: &Config,
    hover: Option<&str>,
    dump: Option<&Path>,
) -> Result<String> {
    let metrics = dataset.metric_table()?;
    let classifier = config.choropleth.classifier();
    let binder = RegionBinder::new(feed, &metrics, &classifier, &config.choropleth.palette);
    tracing::debug!(regions = binder.len(), records = metrics.len(), "binding map view");

    let mut tracker = HoverTracker::new(config.choropleth.no_data_message.clone());
    if let Some(region_id) = hover {
        tracker.on_enter(region_id, &binder);
    }
    if let Some(path) = dump {
        write_layout_dump(path, &LayoutDump::from_regions(binder))?;
    }
    Ok(render_map_svg(
        binder,
        tracker.state(),
        &config.theme,
        &config.choropleth,
    ))
}

fn read_dataset(path: Option<&Path>) -> Result<Dataset> {
    match path {
        None => Ok(sample::dataset()),
        Some(path) if path == Path::new("-") => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Dataset::from_json(&buf)
        }
        Some(path) => Dataset::load(path),
    }
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, config: &Config) -> Result<()> {
    write_output_png(svg, output, &config.render)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_map_flags() {
        let args = Args::try_parse_from([
            "tatlas", "--view", "map", "--hover", "48", "-w", "1200", "--dumpLayout", "out.json",
        ])
        .unwrap();
        assert_eq!(args.view, View::Map);
        assert_eq!(args.hover.as_deref(), Some("48"));
        assert_eq!(args.width, Some(1200.0));
        assert_eq!(args.dump_layout, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn size_overrides_follow_active_view() {
        let mut config = Config::default();
        apply_size_overrides(&mut config, View::Map, Some(1200.0), None);
        assert_eq!(config.choropleth.width, 1200.0);
        assert_eq!(config.choropleth.height, 600.0);
        assert_eq!(config.sankey.viewport.width, 800.0);

        apply_size_overrides(&mut config, View::Sankey, None, Some(500.0));
        assert_eq!(config.sankey.viewport.height, 500.0);
    }

    #[test]
    fn hover_on_region_without_metrics_shows_no_data_message() {
        let config = Config::default();
        let svg = render_map_view(
            &sample::dataset(),
            sample::tile_feed(),
            &config,
            Some("72"),
            None,
        )
        .unwrap();
        assert!(svg.contains("class=\"tooltip\""));
        assert!(svg.contains("No data available"));
    }

    #[test]
    fn png_requires_output_path() {
        assert!(ensure_output(&None, "png").is_err());
    }

    #[cfg(not(feature = "png"))]
    #[test]
    fn png_without_feature_is_an_error() {
        let err = write_png("<svg/>", Path::new("out.png"), &Config::default()).unwrap_err();
        assert!(err.to_string().contains("`png` feature"));
    }
}
