mod binder;
mod classify;
mod tooltip;

pub use binder::{RegionBinder, RegionDescriptor, bind_regions, tooltip_text};
pub use classify::{BandThreshold, ColorToken, Palette, ThresholdClassifier, default_bands};
pub use tooltip::{HoverTracker, NO_DATA_MESSAGE, TooltipState};
