use serde::{Deserialize, Serialize};

/// Categorical fill tokens for the adoption map.
///
/// `NoData` is never produced by [`ThresholdClassifier::classify`]; the binder
/// assigns it when a polygon has no metric record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorToken {
    High,
    MediumHigh,
    MediumLow,
    Low,
    NoData,
}

impl ColorToken {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::MediumHigh => "medium-high",
            Self::MediumLow => "medium-low",
            Self::Low => "low",
            Self::NoData => "no-data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandThreshold {
    pub min: f64,
    pub token: ColorToken,
}

/// Ordered `(minThreshold, token)` bands plus the token for values below all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdClassifier {
    bands: Vec<BandThreshold>,
    floor: ColorToken,
}

impl ThresholdClassifier {
    /// Bands are evaluated highest threshold first regardless of input order.
    pub fn new(mut bands: Vec<BandThreshold>, floor: ColorToken) -> Self {
        bands.sort_by(|a, b| b.min.total_cmp(&a.min));
        Self { bands, floor }
    }

    pub fn adoption_default() -> Self {
        Self::new(default_bands(), ColorToken::Low)
    }

    /// Total over all reals: no clamping, NaN falls through to the floor band.
    pub fn classify(&self, value: f64) -> ColorToken {
        self.bands
            .iter()
            .find(|band| value >= band.min)
            .map(|band| band.token)
            .unwrap_or(self.floor)
    }

    pub fn bands(&self) -> &[BandThreshold] {
        &self.bands
    }

    pub fn floor(&self) -> ColorToken {
        self.floor
    }

    /// Legend rows top to bottom, e.g. `75%+`, `70-74%`, `65-69%`, `<65%`.
    pub fn legend(&self) -> Vec<(ColorToken, String)> {
        let mut rows = Vec::with_capacity(self.bands.len() + 1);
        let mut upper: Option<f64> = None;
        for band in &self.bands {
            let label = match upper {
                None => format!("{}%+", band.min),
                Some(next) if next.fract() == 0.0 && band.min.fract() == 0.0 => {
                    format!("{}-{}%", band.min, next - 1.0)
                }
                Some(next) => format!("{}-{}%", band.min, next),
            };
            rows.push((band.token, label));
            upper = Some(band.min);
        }
        let floor_label = match upper {
            Some(min) => format!("<{min}%"),
            None => "All".to_string(),
        };
        rows.push((self.floor, floor_label));
        rows
    }
}

impl Default for ThresholdClassifier {
    fn default() -> Self {
        Self::adoption_default()
    }
}

pub fn default_bands() -> Vec<BandThreshold> {
    vec![
        BandThreshold {
            min: 75.0,
            token: ColorToken::High,
        },
        BandThreshold {
            min: 70.0,
            token: ColorToken::MediumHigh,
        },
        BandThreshold {
            min: 65.0,
            token: ColorToken::MediumLow,
        },
    ]
}

/// Fill colors for each token. Legend swatches and region fills share it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    pub high: String,
    pub medium_high: String,
    pub medium_low: String,
    pub low: String,
    pub no_data: String,
}

impl Palette {
    pub fn color(&self, token: ColorToken) -> &str {
        match token {
            ColorToken::High => &self.high,
            ColorToken::MediumHigh => &self.medium_high,
            ColorToken::MediumLow => &self.medium_low,
            ColorToken::Low => &self.low,
            ColorToken::NoData => &self.no_data,
        }
    }

    pub fn color_mut(&mut self, token: ColorToken) -> &mut String {
        match token {
            ColorToken::High => &mut self.high,
            ColorToken::MediumHigh => &mut self.medium_high,
            ColorToken::MediumLow => &mut self.medium_low,
            ColorToken::Low => &mut self.low,
            ColorToken::NoData => &mut self.no_data,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            high: "#34A853".to_string(),
            medium_high: "#4285F4".to_string(),
            medium_low: "#FBBC05".to_string(),
            low: "#EA4335".to_string(),
            no_data: "#F0F2F5".to_string(),
        }
    }
}
