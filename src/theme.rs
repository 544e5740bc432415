use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f64,
    pub title_font_size: f64,
    pub text_color: String,
    pub muted_text_color: String,
    pub background: String,
    pub tooltip_background: String,
    pub tooltip_border: String,
    pub node_border: String,
}

impl Theme {
    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 12.0,
            title_font_size: 16.0,
            text_color: "#000000".to_string(),
            muted_text_color: "#6B7280".to_string(),
            background: "#FFFFFF".to_string(),
            tooltip_background: "#FFFFFF".to_string(),
            tooltip_border: "#E5E7EB".to_string(),
            node_border: "#FFFFFF".to_string(),
        }
    }

    /// Dark canvas for wall displays.
    pub fn dark() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 12.0,
            title_font_size: 16.0,
            text_color: "#F3F4F6".to_string(),
            muted_text_color: "#9CA3AF".to_string(),
            background: "#111827".to_string(),
            tooltip_background: "#1F2937".to_string(),
            tooltip_border: "#374151".to_string(),
            node_border: "#111827".to_string(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "modern" | "default" => Some(Self::modern()),
            "dark" => Some(Self::dark()),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::modern()
    }
}
