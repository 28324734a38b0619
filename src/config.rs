use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Card and row placement used by [`crate::layout::RowLayout`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub content_padding: f32,
    pub row_gap: f32,
    pub card_gap: f32,
    pub card_width: f32,
    pub card_height: f32,
    pub avatar_size: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            content_padding: 48.0,
            row_gap: 96.0,
            card_gap: 32.0,
            card_width: 192.0,
            card_height: 156.0,
            avatar_size: 96.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Minimum horizontal distance between trunks of different families.
    pub min_drop_gap: f32,
    /// Where the sibling bar sits between parent bottom (0) and child top (1).
    pub junction_ratio: f32,
    /// How far the spouse arc dips below the parents' shared bottom edge.
    pub spouse_arc_depth: f32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            min_drop_gap: 24.0,
            junction_ratio: 0.6,
            spouse_arc_depth: 14.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentationConfig {
    pub auto_play_interval_ms: u64,
    pub max_scale: f32,
    pub min_scale: f32,
    /// Fixed chrome above the usable viewport area.
    pub header_height: f32,
    /// Fixed chrome below it (the presentation controls).
    pub footer_height: f32,
    /// Fraction of the usable area the active row may occupy.
    pub fit_padding: f32,
    pub inactive_opacity: f32,
}

impl PresentationConfig {
    pub fn auto_play_interval(&self) -> Duration {
        Duration::from_millis(self.auto_play_interval_ms.max(1))
    }
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            auto_play_interval_ms: 5000,
            max_scale: 1.3,
            min_scale: 0.1,
            header_height: 64.0,
            footer_height: 120.0,
            fit_padding: 0.9,
            inactive_opacity: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilizerConfig {
    /// Delays after a member-list change at which connectors are recomputed.
    pub delays_ms: Vec<u64>,
    pub resize_delay_ms: u64,
}

impl StabilizerConfig {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays_ms.iter().map(|ms| Duration::from_millis(*ms)).collect()
    }

    pub fn resize_delay(&self) -> Duration {
        Duration::from_millis(self.resize_delay_ms)
    }
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            delays_ms: vec![50, 150, 300, 600, 1000],
            resize_delay_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            background: "#FAFAF9".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub router: RouterConfig,
    pub presentation: PresentationConfig,
    pub stabilizer: StabilizerConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::ancestry_default();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            router: RouterConfig::default(),
            presentation: PresentationConfig::default(),
            stabilizer: StabilizerConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown theme {0:?}")]
    UnknownTheme(String),
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: f32,
    },
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    line_color: Option<String>,
    line_width: Option<f32>,
    line_dasharray: Option<String>,
    spouse_line_color: Option<String>,
    card_fill: Option<String>,
    card_border: Option<String>,
    name_color: Option<String>,
    relation_color: Option<String>,
    avatar_fill: Option<String>,
    avatar_text_color: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    content_padding: Option<f32>,
    row_gap: Option<f32>,
    card_gap: Option<f32>,
    card_width: Option<f32>,
    card_height: Option<f32>,
    avatar_size: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RouterConfigFile {
    min_drop_gap: Option<f32>,
    junction_ratio: Option<f32>,
    spouse_arc_depth: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PresentationConfigFile {
    auto_play_interval: Option<u64>,
    presentation_scale: Option<f32>,
    min_scale: Option<f32>,
    header_height: Option<f32>,
    footer_height: Option<f32>,
    fit_padding: Option<f32>,
    inactive_opacity: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct StabilizerConfigFile {
    delays: Option<Vec<u64>>,
    resize_delay: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    router: Option<RouterConfigFile>,
    presentation: Option<PresentationConfigFile>,
    stabilizer: Option<StabilizerConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Applies a JSON config document on top of the defaults.
pub fn parse_config(contents: &str) -> Result<Config, ConfigError> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        config.theme = match theme_name {
            "default" | "base" => Theme::ancestry_default(),
            "midnight" | "dark" => Theme::midnight(),
            other => return Err(ConfigError::UnknownTheme(other.to_string())),
        };
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.line_width {
            config.theme.line_width = v;
        }
        if let Some(v) = vars.line_dasharray {
            config.theme.line_dasharray = v;
        }
        if let Some(v) = vars.spouse_line_color {
            config.theme.spouse_line_color = v;
        }
        if let Some(v) = vars.card_fill {
            config.theme.card_fill = v;
        }
        if let Some(v) = vars.card_border {
            config.theme.card_border = v;
        }
        if let Some(v) = vars.name_color {
            config.theme.name_color = v;
        }
        if let Some(v) = vars.relation_color {
            config.theme.relation_color = v;
        }
        if let Some(v) = vars.avatar_fill {
            config.theme.avatar_fill = v;
        }
        if let Some(v) = vars.avatar_text_color {
            config.theme.avatar_text_color = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.content_padding {
            config.layout.content_padding = v;
        }
        if let Some(v) = layout.row_gap {
            config.layout.row_gap = v;
        }
        if let Some(v) = layout.card_gap {
            config.layout.card_gap = v;
        }
        if let Some(v) = layout.card_width {
            config.layout.card_width = v;
        }
        if let Some(v) = layout.card_height {
            config.layout.card_height = v;
        }
        if let Some(v) = layout.avatar_size {
            config.layout.avatar_size = v;
        }
    }

    if let Some(router) = parsed.router {
        if let Some(v) = router.min_drop_gap {
            if v < 0.0 {
                return Err(ConfigError::OutOfRange {
                    field: "router.minDropGap",
                    expected: "non-negative",
                    value: v,
                });
            }
            config.router.min_drop_gap = v;
        }
        if let Some(v) = router.junction_ratio {
            if !(0.0..=1.0).contains(&v) {
                return Err(ConfigError::OutOfRange {
                    field: "router.junctionRatio",
                    expected: "between 0 and 1",
                    value: v,
                });
            }
            config.router.junction_ratio = v;
        }
        if let Some(v) = router.spouse_arc_depth {
            config.router.spouse_arc_depth = v;
        }
    }

    if let Some(presentation) = parsed.presentation {
        if let Some(v) = presentation.auto_play_interval {
            config.presentation.auto_play_interval_ms = v;
        }
        if let Some(v) = presentation.presentation_scale {
            config.presentation.max_scale = v;
        }
        if let Some(v) = presentation.min_scale {
            config.presentation.min_scale = v;
        }
        if let Some(v) = presentation.header_height {
            config.presentation.header_height = v;
        }
        if let Some(v) = presentation.footer_height {
            config.presentation.footer_height = v;
        }
        if let Some(v) = presentation.fit_padding {
            config.presentation.fit_padding = v;
        }
        if let Some(v) = presentation.inactive_opacity {
            config.presentation.inactive_opacity = v;
        }
        if config.presentation.min_scale <= 0.0 || config.presentation.max_scale < config.presentation.min_scale {
            return Err(ConfigError::OutOfRange {
                field: "presentation.presentationScale",
                expected: "positive and at least minScale",
                value: config.presentation.max_scale,
            });
        }
    }

    if let Some(stabilizer) = parsed.stabilizer {
        if let Some(v) = stabilizer.delays {
            config.stabilizer.delays_ms = v;
        }
        if let Some(v) = stabilizer.resize_delay {
            config.stabilizer.resize_delay_ms = v;
        }
    }

    config.render.background = config.theme.background.clone();

    Ok(config)
}
