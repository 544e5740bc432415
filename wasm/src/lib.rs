use serde::Deserialize;
use treatment_atlas::choropleth::{HoverTracker, RegionBinder, ThresholdClassifier};
use treatment_atlas::data::{MetricTable, parse_polygon_feed};
use treatment_atlas::theme::Theme;
use treatment_atlas::{Dataset, RegionFeature, RegionShape, RenderOptions, sample};
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AtlasRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
    value_suffix: Option<String>,
}

fn build_render_options(options: AtlasRenderOptions) -> RenderOptions {
    let mut render_options = RenderOptions::modern();
    if let Some(theme) = options.theme.as_deref().and_then(Theme::by_name) {
        render_options.theme = theme;
    }
    if let Some(font_family) = options.font_family {
        render_options.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        render_options.theme.font_size = font_size;
    }
    if let Some(width) = options.width {
        render_options.sankey.viewport.width = width;
        render_options.choropleth.width = width;
    }
    if let Some(height) = options.height {
        render_options.sankey.viewport.height = height;
        render_options.choropleth.height = height;
    }
    if let Some(suffix) = options.value_suffix {
        render_options.sankey.value_suffix = suffix;
    }
    render_options
}

fn to_js(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn parse_options(options_json: Option<String>) -> Result<RenderOptions, JsValue> {
    let options = match options_json {
        Some(raw) => serde_json::from_str::<AtlasRenderOptions>(&raw).map_err(to_js)?,
        None => AtlasRenderOptions::default(),
    };
    Ok(build_render_options(options))
}

fn parse_dataset(dataset_json: Option<String>) -> Result<Dataset, JsValue> {
    match dataset_json {
        Some(raw) => Dataset::from_json(&raw).map_err(to_js),
        None => Ok(sample::dataset()),
    }
}

fn parse_feed(feed_json: Option<String>) -> Result<Vec<RegionFeature<RegionShape>>, JsValue> {
    match feed_json {
        Some(raw) => parse_polygon_feed(&raw).map_err(to_js),
        None => Ok(sample::tile_feed().to_vec()),
    }
}

#[wasm_bindgen]
pub fn render_sankey_svg(
    dataset_json: Option<String>,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    let dataset = parse_dataset(dataset_json)?;
    let options = parse_options(options_json)?;
    treatment_atlas::render_sankey(&dataset, &options).map_err(to_js)
}

#[wasm_bindgen]
pub fn render_map_svg(
    dataset_json: Option<String>,
    feed_json: Option<String>,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    let dataset = parse_dataset(dataset_json)?;
    let feed = parse_feed(feed_json)?;
    let options = parse_options(options_json)?;
    treatment_atlas::render_map(&dataset, &feed, &Default::default(), &options).map_err(to_js)
}

/// A map that keeps its data and hover state between pointer events.
#[wasm_bindgen]
pub struct MapSession {
    metrics: MetricTable,
    classifier: ThresholdClassifier,
    feed: Vec<RegionFeature<RegionShape>>,
    options: RenderOptions,
    hover: HoverTracker,
}

#[wasm_bindgen]
impl MapSession {
    #[wasm_bindgen(constructor)]
    pub fn new(
        dataset_json: Option<String>,
        feed_json: Option<String>,
        options_json: Option<String>,
    ) -> Result<MapSession, JsValue> {
        let dataset = parse_dataset(dataset_json)?;
        let metrics = dataset.metric_table().map_err(to_js)?;
        let options = parse_options(options_json)?;
        let hover = HoverTracker::new(options.choropleth.no_data_message.clone());
        Ok(MapSession {
            metrics,
            classifier: options.choropleth.classifier(),
            feed: parse_feed(feed_json)?,
            options,
            hover,
        })
    }

    pub fn enter(&mut self, region_id: &str) {
        let binder = RegionBinder::new(
            &self.feed,
            &self.metrics,
            &self.classifier,
            &self.options.choropleth.palette,
        );
        self.hover.on_enter(region_id, &binder);
    }

    pub fn leave(&mut self) {
        self.hover.on_leave();
    }

    /// Tooltip text of the hovered region, if any.
    pub fn tooltip(&self) -> Option<String> {
        self.hover.state().text.clone()
    }

    pub fn render(&self) -> Result<String, JsValue> {
        Ok(treatment_atlas::render::render_map_svg(
            self.binder(),
            self.hover.state(),
            &self.options.theme,
            &self.options.choropleth,
        ))
    }
}

impl MapSession {
    fn binder(&self) -> RegionBinder<'_, RegionShape> {
        RegionBinder::new(
            &self.feed,
            &self.metrics,
            &self.classifier,
            &self.options.choropleth.palette,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_sample_sankey_with_options() {
        let svg = render_sankey_svg(None, Some(r#"{"theme":"dark","valueSuffix":" pts"}"#.into()))
            .unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Genetic Testing: 90 pts"));
        assert!(svg.contains("#111827"));
    }

    #[test]
    fn session_tracks_hover() {
        let mut session = MapSession::new(None, None, None).unwrap();
        assert_eq!(session.tooltip(), None);

        session.enter("06");
        let text = session.tooltip().unwrap();
        assert!(text.starts_with("State: CA"));
        assert!(session.render().unwrap().contains("class=\"tooltip\""));

        session.enter("72");
        assert_eq!(session.tooltip().as_deref(), Some("No data available"));

        session.leave();
        assert_eq!(session.tooltip(), None);
        assert!(!session.render().unwrap().contains("class=\"tooltip\""));
    }

    #[test]
    fn session_render_reuses_cached_metrics() {
        let mut session = MapSession::new(None, None, None).unwrap();
        session.enter("48");
        let expected = treatment_atlas::render_map(
            &sample::dataset(),
            sample::tile_feed(),
            session.hover.state(),
            &RenderOptions::modern(),
        )
        .unwrap();
        assert_eq!(session.render().unwrap(), expected);
        assert_eq!(session.binder().iter().count(), sample::tile_feed().len());
    }
}
