use crate::choropleth::{
    BandThreshold, ColorToken, NO_DATA_MESSAGE, Palette, ThresholdClassifier, default_bands,
};
use crate::layout::{FlowMeasure, Viewport};
use crate::theme::Theme;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

const STAGE_COLORS: [&str; 4] = ["#FF8C00", "#FF6347", "#98C5E6", "#45B7D1"];

static COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(#[0-9A-Fa-f]{3,4}|#[0-9A-Fa-f]{6}|#[0-9A-Fa-f]{8}|[A-Za-z]+|(rgb|hsl)a?\([0-9.,%\s]+\))$")
        .expect("color pattern is valid")
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SankeyConfig {
    pub viewport: Viewport,
    pub measure: FlowMeasure,
    /// Cycled over stages in declaration order.
    pub stage_colors: Vec<String>,
    pub link_opacity: f64,
    pub node_corner_radius: f64,
    pub title: Option<String>,
    /// Appended to the flow value in node annotations.
    pub value_suffix: String,
}

impl SankeyConfig {
    pub fn stage_color(&self, idx: usize) -> &str {
        if self.stage_colors.is_empty() {
            return STAGE_COLORS[idx % STAGE_COLORS.len()];
        }
        &self.stage_colors[idx % self.stage_colors.len()]
    }
}

impl Default for SankeyConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            measure: FlowMeasure::default(),
            stage_colors: STAGE_COLORS.iter().map(|c| c.to_string()).collect(),
            link_opacity: 0.5,
            node_corner_radius: 4.0,
            title: Some("SMA Referral Process".to_string()),
            value_suffix: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoroplethConfig {
    pub width: f64,
    pub height: f64,
    /// Space kept clear around the projected regions.
    pub padding: f64,
    pub bands: Vec<BandThreshold>,
    pub palette: Palette,
    pub hover_fill: String,
    pub hover_opacity: f64,
    pub stroke: String,
    pub stroke_width: f64,
    pub title: Option<String>,
    pub no_data_message: String,
    pub show_legend: bool,
}

impl ChoroplethConfig {
    pub fn classifier(&self) -> ThresholdClassifier {
        ThresholdClassifier::new(self.bands.clone(), ColorToken::Low)
    }
}

impl Default for ChoroplethConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 600.0,
            padding: 24.0,
            bands: default_bands(),
            palette: Palette::default(),
            hover_fill: "#3b82f6".to_string(),
            hover_opacity: 0.8,
            stroke: "#FFFFFF".to_string(),
            stroke_width: 0.5,
            title: Some("SMA Healthcare Statistics by State".to_string()),
            no_data_message: NO_DATA_MESSAGE.to_string(),
            show_legend: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Pixel ratio applied when rasterizing to PNG.
    pub png_scale: f32,
    pub png_font_family: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            png_scale: 1.0,
            png_font_family: "Inter".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub theme: Theme,
    pub sankey: SankeyConfig,
    pub choropleth: ChoroplethConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f64>,
    title_font_size: Option<f64>,
    text_color: Option<String>,
    muted_text_color: Option<String>,
    background: Option<String>,
    tooltip_background: Option<String>,
    tooltip_border: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SankeyConfigFile {
    width: Option<f64>,
    height: Option<f64>,
    margin_top: Option<f64>,
    margin_right: Option<f64>,
    margin_bottom: Option<f64>,
    margin_left: Option<f64>,
    node_thickness: Option<f64>,
    node_padding: Option<f64>,
    measure: Option<FlowMeasure>,
    stage_colors: Option<Vec<String>>,
    link_opacity: Option<f64>,
    node_corner_radius: Option<f64>,
    title: Option<String>,
    value_suffix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThresholdsFile {
    high: Option<f64>,
    medium_high: Option<f64>,
    medium_low: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaletteFile {
    high: Option<String>,
    medium_high: Option<String>,
    medium_low: Option<String>,
    low: Option<String>,
    no_data: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapConfigFile {
    width: Option<f64>,
    height: Option<f64>,
    padding: Option<f64>,
    thresholds: Option<ThresholdsFile>,
    palette: Option<PaletteFile>,
    hover_fill: Option<String>,
    hover_opacity: Option<f64>,
    stroke: Option<String>,
    stroke_width: Option<f64>,
    title: Option<String>,
    no_data_message: Option<String>,
    show_legend: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    png_scale: Option<f32>,
    png_font_family: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    sankey: Option<SankeyConfigFile>,
    map: Option<MapConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Applies a JSON5 override document on top of the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match Theme::by_name(theme_name) {
            Some(theme) => config.theme = theme,
            None => tracing::warn!(theme = theme_name, "unknown theme, keeping default"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        apply_theme_variables(&mut config.theme, vars);
    }
    if let Some(sankey) = parsed.sankey {
        apply_sankey(&mut config.sankey, sankey);
    }
    if let Some(map) = parsed.map {
        apply_map(&mut config.choropleth, map);
    }
    if let Some(render) = parsed.render {
        if let Some(v) = render.png_scale.filter(|v| *v > 0.0) {
            config.render.png_scale = v;
        }
        if let Some(v) = render.png_font_family {
            config.render.png_font_family = v;
        }
    }

    Ok(config)
}

fn apply_theme_variables(theme: &mut Theme, vars: ThemeVariables) {
    if let Some(v) = vars.font_family {
        theme.font_family = v;
    }
    if let Some(v) = vars.font_size {
        theme.font_size = v;
    }
    if let Some(v) = vars.title_font_size {
        theme.title_font_size = v;
    }
    set_color(&mut theme.text_color, vars.text_color, "textColor");
    set_color(&mut theme.muted_text_color, vars.muted_text_color, "mutedTextColor");
    set_color(&mut theme.background, vars.background, "background");
    set_color(&mut theme.tooltip_background, vars.tooltip_background, "tooltipBackground");
    set_color(&mut theme.tooltip_border, vars.tooltip_border, "tooltipBorder");
}

fn apply_sankey(config: &mut SankeyConfig, file: SankeyConfigFile) {
    let viewport = &mut config.viewport;
    if let Some(v) = file.width {
        viewport.width = v;
    }
    if let Some(v) = file.height {
        viewport.height = v;
    }
    if let Some(v) = file.margin_top {
        viewport.margin_top = v;
    }
    if let Some(v) = file.margin_right {
        viewport.margin_right = v;
    }
    if let Some(v) = file.margin_bottom {
        viewport.margin_bottom = v;
    }
    if let Some(v) = file.margin_left {
        viewport.margin_left = v;
    }
    if let Some(v) = file.node_thickness {
        viewport.node_thickness = v;
    }
    if let Some(v) = file.node_padding {
        viewport.node_padding = v;
    }
    if let Some(v) = file.measure {
        config.measure = v;
    }
    if let Some(colors) = file.stage_colors {
        let valid: Vec<String> = colors
            .into_iter()
            .filter(|color| {
                let ok = is_color(color);
                if !ok {
                    tracing::warn!(color = %color, "ignoring invalid stage color");
                }
                ok
            })
            .collect();
        if !valid.is_empty() {
            config.stage_colors = valid;
        }
    }
    if let Some(v) = file.link_opacity {
        config.link_opacity = v.clamp(0.0, 1.0);
    }
    if let Some(v) = file.node_corner_radius {
        config.node_corner_radius = v.max(0.0);
    }
    if let Some(v) = file.title {
        config.title = (!v.is_empty()).then_some(v);
    }
    if let Some(v) = file.value_suffix {
        config.value_suffix = v;
    }
}

fn apply_map(config: &mut ChoroplethConfig, file: MapConfigFile) {
    if let Some(v) = file.width {
        config.width = v;
    }
    if let Some(v) = file.height {
        config.height = v;
    }
    if let Some(v) = file.padding {
        config.padding = v.max(0.0);
    }
    if let Some(thresholds) = file.thresholds {
        let overrides = [
            (ColorToken::High, thresholds.high),
            (ColorToken::MediumHigh, thresholds.medium_high),
            (ColorToken::MediumLow, thresholds.medium_low),
        ];
        for (token, min) in overrides {
            let Some(min) = min else { continue };
            if let Some(band) = config.bands.iter_mut().find(|band| band.token == token) {
                band.min = min;
            }
        }
    }
    if let Some(palette) = file.palette {
        let overrides = [
            (ColorToken::High, palette.high, "palette.high"),
            (ColorToken::MediumHigh, palette.medium_high, "palette.mediumHigh"),
            (ColorToken::MediumLow, palette.medium_low, "palette.mediumLow"),
            (ColorToken::Low, palette.low, "palette.low"),
            (ColorToken::NoData, palette.no_data, "palette.noData"),
        ];
        for (token, value, key) in overrides {
            set_color(config.palette.color_mut(token), value, key);
        }
    }
    set_color(&mut config.hover_fill, file.hover_fill, "hoverFill");
    if let Some(v) = file.hover_opacity {
        config.hover_opacity = v.clamp(0.0, 1.0);
    }
    set_color(&mut config.stroke, file.stroke, "stroke");
    if let Some(v) = file.stroke_width {
        config.stroke_width = v.max(0.0);
    }
    if let Some(v) = file.title {
        config.title = (!v.is_empty()).then_some(v);
    }
    if let Some(v) = file.no_data_message {
        config.no_data_message = v;
    }
    if let Some(v) = file.show_legend {
        config.show_legend = v;
    }
}

fn set_color(slot: &mut String, value: Option<String>, key: &str) {
    let Some(value) = value else {
        return;
    };
    if is_color(&value) {
        *slot = value;
    } else {
        tracing::warn!(key, value = %value, "ignoring invalid color");
    }
}

pub fn is_color(value: &str) -> bool {
    COLOR_RE.is_match(value.trim())
}
