use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub line_color: String,
    pub line_width: f32,
    pub line_dasharray: String,
    pub spouse_line_color: String,
    pub card_fill: String,
    pub card_border: String,
    pub name_color: String,
    pub relation_color: String,
    pub avatar_fill: String,
    pub avatar_text_color: String,
    pub background: String,
}

impl Theme {
    pub fn ancestry_default() -> Self {
        Self {
            font_family: "ui-sans-serif, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 14.0,
            line_color: "#a78bfa".to_string(),
            line_width: 2.0,
            line_dasharray: "6 4".to_string(),
            spouse_line_color: "#a78bfa".to_string(),
            card_fill: "#FFFFFF".to_string(),
            card_border: "#E7E5E4".to_string(),
            name_color: "#292524".to_string(),
            relation_color: "#4F46E5".to_string(),
            avatar_fill: "#E7E5E4".to_string(),
            avatar_text_color: "#A8A29E".to_string(),
            background: "#FAFAF9".to_string(),
        }
    }

    pub fn midnight() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 14.0,
            line_color: "#C4B5FD".to_string(),
            line_width: 2.0,
            line_dasharray: "6 4".to_string(),
            spouse_line_color: "#F0ABFC".to_string(),
            card_fill: "#1C1917".to_string(),
            card_border: "#44403C".to_string(),
            name_color: "#FAFAF9".to_string(),
            relation_color: "#A5B4FC".to_string(),
            avatar_fill: "#292524".to_string(),
            avatar_text_color: "#78716C".to_string(),
            background: "#0C0A09".to_string(),
        }
    }
}
