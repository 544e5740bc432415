use serde::Serialize;

use super::binder::RegionBinder;

pub const NO_DATA_MESSAGE: &str = "No data available";

/// The single active tooltip slot. Both fields are `None` when nothing is hovered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipState {
    pub region_id: Option<String>,
    pub text: Option<String>,
}

impl TooltipState {
    pub fn is_active(&self) -> bool {
        self.region_id.is_some()
    }
}

/// Owns the hover slot and is its only writer. The last call wins.
#[derive(Debug, Clone)]
pub struct HoverTracker {
    state: TooltipState,
    no_data_message: String,
}

impl HoverTracker {
    pub fn new(no_data_message: impl Into<String>) -> Self {
        Self {
            state: TooltipState::default(),
            no_data_message: no_data_message.into(),
        }
    }

    pub fn on_enter<G>(&mut self, region_id: &str, regions: &RegionBinder<'_, G>) {
        let text = regions
            .descriptor(region_id)
            .and_then(|descriptor| descriptor.tooltip_text)
            .unwrap_or_else(|| self.no_data_message.clone());
        tracing::debug!(region = region_id, "hover enter");
        self.state = TooltipState {
            region_id: Some(region_id.to_string()),
            text: Some(text),
        };
    }

    /// Clears the slot no matter which region was entered last.
    pub fn on_leave(&mut self) {
        if let Some(region) = self.state.region_id.as_deref() {
            tracing::debug!(region, "hover leave");
        }
        self.state = TooltipState::default();
    }

    pub fn state(&self) -> &TooltipState {
        &self.state
    }

    pub fn is_highlighted(&self, region_id: &str) -> bool {
        self.state.region_id.as_deref() == Some(region_id)
    }
}

impl Default for HoverTracker {
    fn default() -> Self {
        Self::new(NO_DATA_MESSAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choropleth::classify::{Palette, ThresholdClassifier};
    use crate::data::{MetricTable, RegionFeature, RegionMetric};

    struct Fixture {
        feed: Vec<RegionFeature<()>>,
        metrics: MetricTable,
        classifier: ThresholdClassifier,
        palette: Palette,
    }

    impl Fixture {
        fn new() -> Self {
            let metrics = MetricTable::from_records([RegionMetric {
                region_id: "36".to_string(),
                short_name: "NY".to_string(),
                patient_count: 672,
                active_provider_count: 241,
                adoption_rate_percent: 81.0,
            }])
            .unwrap();
            let feed = ["36", "72"]
                .into_iter()
                .map(|id| RegionFeature {
                    id: id.to_string(),
                    geometry: (),
                })
                .collect();
            Self {
                feed,
                metrics,
                classifier: ThresholdClassifier::default(),
                palette: Palette::default(),
            }
        }

        fn binder(&self) -> RegionBinder<'_, ()> {
            RegionBinder::new(&self.feed, &self.metrics, &self.classifier, &self.palette)
        }
    }

    #[test]
    fn enter_shows_region_summary() {
        let fixture = Fixture::new();
        let mut hover = HoverTracker::default();
        hover.on_enter("36", &fixture.binder());
        assert_eq!(hover.state().region_id.as_deref(), Some("36"));
        assert!(hover.state().text.as_deref().unwrap().starts_with("State: NY"));
        assert!(hover.is_highlighted("36"));
    }

    #[test]
    fn enter_without_data_shows_generic_message() {
        let fixture = Fixture::new();
        let mut hover = HoverTracker::default();
        hover.on_enter("72", &fixture.binder());
        assert_eq!(hover.state().text.as_deref(), Some(NO_DATA_MESSAGE));

        hover.on_enter("99", &fixture.binder());
        assert_eq!(hover.state().region_id.as_deref(), Some("99"));
        assert_eq!(hover.state().text.as_deref(), Some(NO_DATA_MESSAGE));
    }

    #[test]
    fn leave_always_resets() {
        let fixture = Fixture::new();
        let binder = fixture.binder();
        let mut hover = HoverTracker::default();
        hover.on_enter("36", &binder);
        hover.on_enter("72", &binder);
        hover.on_enter("36", &binder);
        hover.on_leave();
        assert_eq!(*hover.state(), TooltipState::default());
        assert!(!hover.state().is_active());

        hover.on_leave();
        assert_eq!(*hover.state(), TooltipState::default());
    }

    #[test]
    fn last_enter_wins() {
        let fixture = Fixture::new();
        let binder = fixture.binder();
        let mut hover = HoverTracker::new("n/a");
        hover.on_enter("36", &binder);
        hover.on_enter("72", &binder);
        assert_eq!(hover.state().region_id.as_deref(), Some("72"));
        assert_eq!(hover.state().text.as_deref(), Some("n/a"));
        assert!(!hover.is_highlighted("36"));
    }
}
