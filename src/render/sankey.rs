use std::collections::HashMap;

use crate::config::SankeyConfig;
use crate::layout::{LayoutNode, SankeyLayout};
use crate::text_metrics::text_width;
use crate::theme::Theme;

use super::{escape_xml, format_number};

const LABEL_GAP: f64 = 6.0;

pub fn node_annotation(node: &LayoutNode, suffix: &str) -> String {
    format!(
        "{}: {}{}",
        node.display_name,
        format_number(node.value),
        suffix
    )
}

pub fn render_sankey_svg(layout: &SankeyLayout, theme: &Theme, config: &SankeyConfig) -> String {
    let viewport = &layout.viewport;
    let width = viewport.width;
    let height = viewport.height;
    let mut svg = String::new();

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\" role=\"img\" aria-roledescription=\"sankey\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    let stage_idx: HashMap<&str, usize> = layout
        .nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| (node.id.as_str(), idx))
        .collect();
    let color_of = |id: &str| {
        stage_idx
            .get(id)
            .map(|&idx| config.stage_color(idx))
            .unwrap_or(theme.muted_text_color.as_str())
    };

    svg.push_str("<defs>");
    for (idx, link) in layout.links.iter().enumerate() {
        svg.push_str(&format!(
            "<linearGradient id=\"link-grad-{idx}\" gradientUnits=\"userSpaceOnUse\" x1=\"{:.2}\" x2=\"{:.2}\"><stop offset=\"0%\" stop-color=\"{}\"/><stop offset=\"100%\" stop-color=\"{}\"/></linearGradient>",
            link.path.start.0,
            link.path.end.0,
            color_of(&link.source_id),
            color_of(&link.target_id)
        ));
    }
    svg.push_str("</defs>");

    if let Some(title) = config.title.as_deref() {
        svg.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" font-weight=\"bold\" fill=\"{}\">{}</text>",
            width / 2.0,
            viewport.margin_top / 2.0,
            escape_xml(&theme.font_family),
            theme.title_font_size,
            theme.text_color,
            escape_xml(title)
        ));
    }

    svg.push_str("<g class=\"links\" fill=\"none\">");
    for (idx, link) in layout.links.iter().enumerate() {
        svg.push_str(&format!(
            "<path class=\"link\" d=\"{}\" stroke=\"url(#link-grad-{idx})\" stroke-opacity=\"{}\" stroke-width=\"{:.2}\"><title>{} \u{2192} {}: {}</title></path>",
            link.path.to_svg_path(),
            config.link_opacity,
            link.stroke_width.max(1.0),
            escape_xml(&link.source_id),
            escape_xml(&link.target_id),
            format_number(link.weight)
        ));
    }
    svg.push_str("</g>");

    let last_column = layout.column_count.saturating_sub(1);
    svg.push_str("<g class=\"nodes\">");
    for (idx, node) in layout.nodes.iter().enumerate() {
        svg.push_str(&format!(
            "<rect class=\"node\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{r}\" ry=\"{r}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"2\"/>",
            node.x0,
            node.vertical_start,
            node.x1 - node.x0,
            node.height(),
            config.stage_color(idx),
            theme.node_border,
            r = config.node_corner_radius
        ));

        let label = node_annotation(node, &config.value_suffix);
        let label_width = text_width(&label, theme.font_size, &theme.font_family);
        let center_y = (node.vertical_start + node.vertical_end) / 2.0;
        let (x, anchor) = if label_width + LABEL_GAP <= node.x1 - node.x0 {
            ((node.x0 + node.x1) / 2.0, "middle")
        } else if node.column_index == last_column && last_column > 0 {
            (node.x0 - LABEL_GAP, "end")
        } else {
            (node.x1 + LABEL_GAP, "start")
        };
        svg.push_str(&format!(
            "<text x=\"{x:.2}\" y=\"{center_y:.2}\" dy=\"0.35em\" text-anchor=\"{anchor}\" font-family=\"{}\" font-size=\"{}\" font-weight=\"bold\" fill=\"{}\">{}</text>",
            escape_xml(&theme.font_family),
            theme.font_size,
            theme.text_color,
            escape_xml(&label)
        ));
    }
    svg.push_str("</g>");

    svg.push_str("</svg>");
    svg
}
