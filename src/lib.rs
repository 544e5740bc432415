pub mod choropleth;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod layout;
pub mod layout_dump;
pub mod render;
pub mod sample;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::Config;
pub use data::{Dataset, RegionFeature, RegionMetric, RegionShape};
pub use error::{DataError, GraphError, LayoutError};

use choropleth::{RegionBinder, TooltipState};
use config::{ChoroplethConfig, SankeyConfig};
use theme::Theme;

/// Everything the two views need besides the data itself.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub theme: Theme,
    pub sankey: SankeyConfig,
    pub choropleth: ChoroplethConfig,
}

impl RenderOptions {
    pub fn modern() -> Self {
        Self::default()
    }

    pub fn dark() -> Self {
        Self {
            theme: Theme::dark(),
            ..Self::default()
        }
    }
}

impl From<Config> for RenderOptions {
    fn from(config: Config) -> Self {
        Self {
            theme: config.theme,
            sankey: config.sankey,
            choropleth: config.choropleth,
        }
    }
}

/// Normalizes, lays out and draws the dataset's stage graph.
pub fn render_sankey(dataset: &Dataset, options: &RenderOptions) -> anyhow::Result<String> {
    let layout =
        layout::compute_sankey(dataset, &options.sankey.viewport, options.sankey.measure)?;
    Ok(render::render_sankey_svg(&layout, &options.theme, &options.sankey))
}

/// Binds `feed` to the dataset's region records and draws the map, with `hover`
/// naming the highlighted region if any.
pub fn render_map(
    dataset: &Dataset,
    feed: &[RegionFeature<RegionShape>],
    hover: &TooltipState,
    options: &RenderOptions,
) -> anyhow::Result<String> {
    let metrics = dataset.metric_table()?;
    let classifier = options.choropleth.classifier();
    let binder = RegionBinder::new(feed, &metrics, &classifier, &options.choropleth.palette);
    Ok(render::render_map_svg(
        binder,
        hover,
        &options.theme,
        &options.choropleth,
    ))
}
