use geo::{BoundingRect, LineString, Rect};

use crate::choropleth::{RegionBinder, TooltipState};
use crate::config::ChoroplethConfig;
use crate::data::RegionShape;
use crate::text_metrics::text_width;
use crate::theme::Theme;

use super::escape_xml;

const TITLE_BASELINE: f64 = 28.0;
const LEGEND_TOP: f64 = 44.0;
const LEGEND_SWATCH: f64 = 14.0;
const LEGEND_SPACING: f64 = 24.0;
const HEADER_HEIGHT: f64 = 72.0;
const TOOLTIP_PADDING: f64 = 8.0;

/// Fits map coordinates (y up) into a screen rectangle (y down), keeping the aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapProjection {
    scale: f64,
    min_x: f64,
    max_y: f64,
    offset_x: f64,
    offset_y: f64,
}

impl MapProjection {
    pub fn fit(bounds: Rect<f64>, left: f64, top: f64, width: f64, height: f64) -> Self {
        let bounds_w = bounds.width();
        let bounds_h = bounds.height();
        let scale = match (bounds_w > 0.0, bounds_h > 0.0) {
            (true, true) => (width / bounds_w).min(height / bounds_h),
            (true, false) => width / bounds_w,
            (false, true) => height / bounds_h,
            (false, false) => 1.0,
        }
        .max(0.0);
        Self {
            scale,
            min_x: bounds.min().x,
            max_y: bounds.max().y,
            offset_x: left + (width - bounds_w * scale) / 2.0,
            offset_y: top + (height - bounds_h * scale) / 2.0,
        }
    }

    pub fn project(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.offset_x + (x - self.min_x) * self.scale,
            self.offset_y + (self.max_y - y) * self.scale,
        )
    }

    fn ring_path(&self, ring: &LineString<f64>, out: &mut String) {
        for (idx, coord) in ring.0.iter().enumerate() {
            let (x, y) = self.project(coord.x, coord.y);
            let cmd = if idx == 0 { "M" } else { " L" };
            out.push_str(&format!("{cmd} {x:.2} {y:.2}"));
        }
        if !ring.0.is_empty() {
            out.push_str(" Z ");
        }
    }

    pub fn shape_path(&self, shape: &RegionShape) -> String {
        let mut d = String::new();
        for polygon in &shape.0 {
            self.ring_path(polygon.exterior(), &mut d);
            for interior in polygon.interiors() {
                self.ring_path(interior, &mut d);
            }
        }
        d.trim_end().to_string()
    }
}

fn feed_bounds(binder: RegionBinder<'_, RegionShape>) -> Option<Rect<f64>> {
    binder
        .iter()
        .filter_map(|region| region.geometry.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                geo::coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                geo::coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
            )
        })
}

pub fn render_map_svg(
    binder: RegionBinder<'_, RegionShape>,
    hover: &TooltipState,
    theme: &Theme,
    config: &ChoroplethConfig,
) -> String {
    let width = config.width;
    let height = config.height;
    let mut svg = String::new();

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\" role=\"img\" aria-roledescription=\"choropleth\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    if let Some(title) = config.title.as_deref() {
        svg.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{TITLE_BASELINE}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" font-weight=\"bold\" fill=\"{}\">{}</text>",
            width / 2.0,
            escape_xml(&theme.font_family),
            theme.title_font_size,
            theme.text_color,
            escape_xml(title)
        ));
    }
    if config.show_legend {
        push_legend(&mut svg, theme, config);
    }

    let top = if config.title.is_some() || config.show_legend {
        HEADER_HEIGHT.max(config.padding)
    } else {
        config.padding
    };
    let area_left = config.padding;
    let area_width = (width - 2.0 * config.padding).max(0.0);
    let area_height = (height - top - config.padding).max(0.0);

    if let Some(bounds) = feed_bounds(binder) {
        let projection = MapProjection::fit(bounds, area_left, top, area_width, area_height);
        svg.push_str("<g class=\"regions\">");
        for region in binder.iter() {
            let highlighted = hover.region_id.as_deref() == Some(region.region_id);
            let (fill, opacity) = if highlighted {
                (config.hover_fill.as_str(), config.hover_opacity)
            } else {
                (region.fill_color, 1.0)
            };
            let summary = region
                .tooltip_text
                .as_deref()
                .unwrap_or(config.no_data_message.as_str());
            svg.push_str(&format!(
                "<path class=\"region {}\" data-region=\"{}\" d=\"{}\" fill=\"{}\" fill-opacity=\"{}\" fill-rule=\"evenodd\" stroke=\"{}\" stroke-width=\"{}\"><title>{}</title></path>",
                region.token.as_str(),
                escape_xml(region.region_id),
                projection.shape_path(region.geometry),
                fill,
                opacity,
                config.stroke,
                config.stroke_width,
                escape_xml(summary)
            ));
        }
        svg.push_str("</g>");
    }

    if let Some(text) = hover.text.as_deref() {
        push_tooltip(&mut svg, text, width - config.padding, top, theme);
    }

    svg.push_str("</svg>");
    svg
}

fn push_legend(svg: &mut String, theme: &Theme, config: &ChoroplethConfig) {
    let entries: Vec<(String, f64, &str)> = config
        .classifier()
        .legend()
        .into_iter()
        .map(|(token, range)| {
            let label = format!("Adoption Rate: {range}");
            let label_width = text_width(&label, theme.font_size, &theme.font_family);
            (label, label_width, config.palette.color(token))
        })
        .collect();
    let total: f64 = entries
        .iter()
        .map(|(_, w, _)| LEGEND_SWATCH + 6.0 + w)
        .sum::<f64>()
        + LEGEND_SPACING * entries.len().saturating_sub(1) as f64;
    let mut x = ((config.width - total) / 2.0).max(config.padding);

    svg.push_str("<g class=\"legend\">");
    for (label, label_width, color) in entries {
        svg.push_str(&format!(
            "<rect x=\"{x:.2}\" y=\"{LEGEND_TOP}\" width=\"{LEGEND_SWATCH}\" height=\"{LEGEND_SWATCH}\" fill=\"{color}\"/>",
        ));
        svg.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" dy=\"0.35em\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            x + LEGEND_SWATCH + 6.0,
            LEGEND_TOP + LEGEND_SWATCH / 2.0,
            escape_xml(&theme.font_family),
            theme.font_size,
            theme.text_color,
            escape_xml(&label)
        ));
        x += LEGEND_SWATCH + 6.0 + label_width + LEGEND_SPACING;
    }
    svg.push_str("</g>");
}

/// Tooltip box anchored by its top-right corner.
fn push_tooltip(svg: &mut String, text: &str, right: f64, top: f64, theme: &Theme) {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let line_height = theme.font_size * 1.4;
    let text_w = lines
        .iter()
        .map(|line| text_width(line, theme.font_size, &theme.font_family))
        .fold(0.0, f64::max);
    let box_w = text_w + 2.0 * TOOLTIP_PADDING;
    let box_h = lines.len() as f64 * line_height + 2.0 * TOOLTIP_PADDING;
    let x = right - box_w;

    svg.push_str(&format!(
        "<g class=\"tooltip\"><rect x=\"{x:.2}\" y=\"{top:.2}\" width=\"{box_w:.2}\" height=\"{box_h:.2}\" rx=\"4\" ry=\"4\" fill=\"{}\" stroke=\"{}\"/>",
        theme.tooltip_background, theme.tooltip_border
    ));
    svg.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">",
        x + TOOLTIP_PADDING,
        top + TOOLTIP_PADDING,
        escape_xml(&theme.font_family),
        theme.font_size,
        theme.text_color
    ));
    for (idx, line) in lines.iter().enumerate() {
        let dy = if idx == 0 { theme.font_size } else { line_height };
        svg.push_str(&format!(
            "<tspan x=\"{:.2}\" dy=\"{dy:.2}\">{}</tspan>",
            x + TOOLTIP_PADDING,
            escape_xml(line)
        ));
    }
    svg.push_str("</text></g>");
}
