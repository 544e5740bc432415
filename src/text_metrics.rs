use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

static TEXT_MEASURER: Lazy<Mutex<TextMeasurer>> = Lazy::new(|| Mutex::new(TextMeasurer::new()));

/// Average advance of a proportional sans-serif glyph, in ems.
const FALLBACK_EM_WIDTH: f64 = 0.56;

/// Width of a single line, measured against an installed font when one
/// matches `font_family`.
pub fn measure_text_width(text: &str, font_size: f64, font_family: &str) -> Option<f64> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    let mut guard = TEXT_MEASURER.lock().ok()?;
    guard.measure(text, font_size, font_family)
}

/// Like [`measure_text_width`], falling back to a per-character estimate when
/// no font is available (e.g. in a browser build).
pub fn text_width(text: &str, font_size: f64, font_family: &str) -> f64 {
    measure_text_width(text, font_size, font_family)
        .unwrap_or_else(|| estimate_width(text, font_size))
}

pub fn estimate_width(text: &str, font_size: f64) -> f64 {
    text.chars().filter(|ch| *ch != '\n').count() as f64 * font_size * FALLBACK_EM_WIDTH
}

struct TextMeasurer {
    db: Database,
    loaded_system_fonts: bool,
    cache: HashMap<String, Option<FontFace>>,
}

impl TextMeasurer {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            cache: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f64, font_family: &str) -> Option<f64> {
        let family_key = normalize_family_key(font_family);
        if !self.cache.contains_key(&family_key) {
            let face = self.load_face(font_family);
            if face.is_none() {
                tracing::debug!(family = %family_key, "no installed font, estimating text widths");
            }
            self.cache.insert(family_key.clone(), face);
        }
        let face = self.cache.get(&family_key)?.as_ref()?;
        Some(face.measure_width(&text.replace('\t', "    "), font_size))
    }

    fn load_face(&mut self, font_family: &str) -> Option<FontFace> {
        let mut names: Vec<&str> = Vec::new();
        let mut generics: Vec<(usize, Family<'static>)> = Vec::new();
        for part in font_family.split(',') {
            let raw = part.trim().trim_matches('"').trim_matches('\'');
            if raw.is_empty() {
                continue;
            }
            let generic = match raw.to_ascii_lowercase().as_str() {
                "serif" => Some(Family::Serif),
                "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => {
                    Some(Family::SansSerif)
                }
                "monospace" | "ui-monospace" => Some(Family::Monospace),
                _ => None,
            };
            match generic {
                Some(family) => generics.push((names.len(), family)),
                None => names.push(raw),
            }
        }

        // Named families first in their written order, generics slotted where they appeared.
        let mut families: Vec<Family<'_>> = Vec::with_capacity(names.len() + generics.len());
        let mut generic_iter = generics.into_iter().peekable();
        for (idx, name) in names.iter().enumerate() {
            while let Some((_, family)) = generic_iter.next_if(|(at, _)| *at == idx) {
                families.push(family);
            }
            families.push(Family::Name(name));
        }
        families.extend(generic_iter.map(|(_, family)| family));
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| FontFace::parse(data.to_vec(), index))
            .flatten()
    }
}

struct FontFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
    ascii_advances: [u16; 128],
}

impl FontFace {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Face::parse(&data, index).ok()?;
        let units_per_em = face.units_per_em().max(1);
        let mut ascii_advances = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph) = face.glyph_index(byte as char) {
                ascii_advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
            }
        }
        Some(Self {
            data,
            index,
            units_per_em,
            ascii_advances,
        })
    }

    fn measure_width(&self, text: &str, font_size: f64) -> f64 {
        let scale = font_size / f64::from(self.units_per_em);
        let fallback = font_size * FALLBACK_EM_WIDTH;
        let advance = |units: u16| {
            if units == 0 {
                fallback
            } else {
                f64::from(units) * scale
            }
        };

        if text.is_ascii() {
            return text
                .bytes()
                .filter(|byte| *byte != b'\n')
                .map(|byte| advance(self.ascii_advances[byte as usize]))
                .sum();
        }

        let Ok(face) = Face::parse(&self.data, self.index) else {
            return estimate_width(text, font_size);
        };
        text.chars()
            .filter(|ch| *ch != '\n')
            .map(|ch| {
                let units = face
                    .glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .unwrap_or(0);
                advance(units)
            })
            .sum()
    }
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_no_width() {
        assert_eq!(measure_text_width("", 12.0, "sans-serif"), Some(0.0));
        assert_eq!(text_width("abc", 0.0, "sans-serif"), 0.0);
    }

    #[test]
    fn width_grows_with_text() {
        let short = text_width("Genetic", 12.0, "sans-serif");
        let long = text_width("Genetic Testing: 90", 12.0, "sans-serif");
        assert!(long > short);
        assert!(short > 0.0);
    }

    #[test]
    fn estimate_ignores_newlines() {
        assert_eq!(estimate_width("ab\ncd", 10.0), estimate_width("abcd", 10.0));
    }
}
