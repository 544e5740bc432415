use crate::data::{MetricTable, RegionFeature, RegionMetric};

use super::classify::{ColorToken, Palette, ThresholdClassifier};

/// Per-polygon render input: geometry passed through untouched, plus the
/// fill and tooltip derived from the region's metric record.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionDescriptor<'a, G> {
    pub region_id: &'a str,
    pub geometry: &'a G,
    pub token: ColorToken,
    pub fill_color: &'a str,
    /// `None` when the feed has a polygon with no metric record.
    pub tooltip_text: Option<String>,
}

/// Joins a polygon feed with a metric table.
///
/// Holds only borrows, so it can be rebuilt whenever the metric table is
/// swapped out. Every call to [`RegionBinder::iter`] starts a fresh pass.
#[derive(Debug)]
pub struct RegionBinder<'a, G> {
    feed: &'a [RegionFeature<G>],
    metrics: &'a MetricTable,
    classifier: &'a ThresholdClassifier,
    palette: &'a Palette,
}

impl<G> Clone for RegionBinder<'_, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G> Copy for RegionBinder<'_, G> {}

impl<'a, G: 'a> RegionBinder<'a, G> {
    pub fn new(
        feed: &'a [RegionFeature<G>],
        metrics: &'a MetricTable,
        classifier: &'a ThresholdClassifier,
        palette: &'a Palette,
    ) -> Self {
        Self {
            feed,
            metrics,
            classifier,
            palette,
        }
    }

    /// Descriptors in feed order, which is also draw order.
    pub fn iter(self) -> impl Iterator<Item = RegionDescriptor<'a, G>> + Clone + 'a {
        let metrics = self.metrics;
        let classifier = self.classifier;
        let palette = self.palette;
        self.feed
            .iter()
            .map(move |feature| describe(feature, metrics, classifier, palette))
    }

    /// First descriptor whose polygon carries `region_id`.
    pub fn descriptor(&self, region_id: &str) -> Option<RegionDescriptor<'a, G>> {
        self.feed
            .iter()
            .find(|feature| feature.id == region_id)
            .map(|feature| describe(feature, self.metrics, self.classifier, self.palette))
    }

    pub fn len(&self) -> usize {
        self.feed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feed.is_empty()
    }
}

pub fn bind_regions<'a, G: 'a>(
    feed: &'a [RegionFeature<G>],
    metrics: &'a MetricTable,
    classifier: &'a ThresholdClassifier,
    palette: &'a Palette,
) -> impl Iterator<Item = RegionDescriptor<'a, G>> + Clone + 'a {
    RegionBinder::new(feed, metrics, classifier, palette).iter()
}

fn describe<'a, G>(
    feature: &'a RegionFeature<G>,
    metrics: &MetricTable,
    classifier: &ThresholdClassifier,
    palette: &'a Palette,
) -> RegionDescriptor<'a, G> {
    let (token, tooltip_text) = match metrics.get(&feature.id) {
        Some(metric) => (
            classifier.classify(metric.adoption_rate_percent),
            Some(tooltip_text(metric)),
        ),
        None => (ColorToken::NoData, None),
    };
    RegionDescriptor {
        region_id: &feature.id,
        geometry: &feature.geometry,
        token,
        fill_color: palette.color(token),
        tooltip_text,
    }
}

pub fn tooltip_text(metric: &RegionMetric) -> String {
    format!(
        "State: {}\nSMA Patients: {}\nActive HCPs: {}\nAdoption Rate: {}%",
        metric.short_name,
        metric.patient_count,
        metric.active_provider_count,
        metric.adoption_rate_percent
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> MetricTable {
        MetricTable::from_records([
            RegionMetric {
                region_id: "06".to_string(),
                short_name: "CA".to_string(),
                patient_count: 873,
                active_provider_count: 264,
                adoption_rate_percent: 82.0,
            },
            RegionMetric {
                region_id: "22".to_string(),
                short_name: "LA".to_string(),
                patient_count: 186,
                active_provider_count: 73,
                adoption_rate_percent: 64.0,
            },
        ])
        .unwrap()
    }

    fn feed() -> Vec<RegionFeature<&'static str>> {
        ["22", "72", "06"]
            .into_iter()
            .map(|id| RegionFeature {
                id: id.to_string(),
                geometry: "shape",
            })
            .collect()
    }

    #[test]
    fn preserves_feed_order() {
        let (metrics, feed) = (metrics(), feed());
        let (classifier, palette) = (ThresholdClassifier::default(), Palette::default());
        let ids: Vec<&str> = bind_regions(&feed, &metrics, &classifier, &palette)
            .map(|d| d.region_id)
            .collect();
        assert_eq!(ids, ["22", "72", "06"]);
    }

    #[test]
    fn colors_follow_adoption_rate() {
        let (metrics, feed) = (metrics(), feed());
        let (classifier, palette) = (ThresholdClassifier::default(), Palette::default());
        let binder = RegionBinder::new(&feed, &metrics, &classifier, &palette);
        let ca = binder.descriptor("06").unwrap();
        assert_eq!(ca.token, ColorToken::High);
        assert_eq!(ca.fill_color, "#34A853");
        let la = binder.descriptor("22").unwrap();
        assert_eq!(la.token, ColorToken::Low);
        assert_eq!(la.fill_color, "#EA4335");
    }

    #[test]
    fn missing_record_falls_back_to_no_data() {
        let (metrics, feed) = (metrics(), feed());
        let (classifier, palette) = (ThresholdClassifier::default(), Palette::default());
        let binder = RegionBinder::new(&feed, &metrics, &classifier, &palette);
        let pr = binder.descriptor("72").unwrap();
        assert_eq!(pr.token, ColorToken::NoData);
        assert_eq!(pr.fill_color, palette.no_data);
        assert!(pr.tooltip_text.is_none());
    }

    #[test]
    fn rebinding_is_idempotent() {
        let (metrics, feed) = (metrics(), feed());
        let (classifier, palette) = (ThresholdClassifier::default(), Palette::default());
        let binder = RegionBinder::new(&feed, &metrics, &classifier, &palette);
        let first: Vec<_> = binder.iter().collect();
        let second: Vec<_> = binder.iter().collect();
        assert_eq!(first, second);

        let pass = binder.iter();
        let replay = pass.clone();
        assert!(pass.eq(replay));
    }

    #[test]
    fn tooltip_lists_the_four_metrics() {
        let table = metrics();
        let text = tooltip_text(table.get("06").unwrap());
        assert_eq!(
            text,
            "State: CA\nSMA Patients: 873\nActive HCPs: 264\nAdoption Rate: 82%"
        );
    }
}
