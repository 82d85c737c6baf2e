use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Named trees with fewer members than this are dissolved into orphans.
    pub min_trunk_size: usize,
    pub node_width: f32,
    pub node_height: f32,
    pub margin_x: f32,
    pub margin_y: f32,
    /// Horizontal space available for the isolated-node grid.
    pub display_width: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_trunk_size: 2,
            node_width: 200.0,
            node_height: 50.0,
            margin_x: 50.0,
            margin_y: 10.0,
            display_width: 1600.0,
        }
    }
}

impl LayoutConfig {
    pub fn column_step(&self) -> f32 {
        self.node_width + self.margin_x
    }

    pub fn lane_step(&self) -> f32 {
        self.node_height + self.margin_y
    }

    pub fn nodes_per_row(&self) -> usize {
        let step = self.column_step();
        if step <= 0.0 || !self.display_width.is_finite() {
            return 1;
        }
        ((self.display_width / step) as usize).max(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub padding: f32,
    pub background: String,
    pub show_bands: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            padding: 20.0,
            background: "#FFFFFF".to_string(),
            show_bands: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::classic();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfigFile {
    pub min_trunk_size: Option<usize>,
    pub node_width: Option<f32>,
    pub node_height: Option<f32>,
    pub margin_x: Option<f32>,
    pub margin_y: Option<f32>,
    pub display_width: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    text_color: Option<String>,
    background: Option<String>,
    node_fill_opacity: Option<f32>,
    band_opacity: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    padding: Option<f32>,
    background: Option<String>,
    show_bands: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "modern" {
            config.theme = Theme::modern();
        } else if theme_name == "classic" || theme_name == "default" {
            config.theme = Theme::classic();
        }
        config.render.background = config.theme.background.clone();
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v.clone();
            config.render.background = v;
        }
        if let Some(v) = vars.node_fill_opacity {
            config.theme.node_fill_opacity = v.clamp(0.0, 1.0);
        }
        if let Some(v) = vars.band_opacity {
            config.theme.band_opacity = v.clamp(0.0, 1.0);
        }
    }

    if let Some(layout) = parsed.layout {
        merge_layout_overrides(&mut config.layout, &layout);
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.padding {
            config.render.padding = v.max(0.0);
        }
        if let Some(v) = render.background {
            config.render.background = v;
        }
        if let Some(v) = render.show_bands {
            config.render.show_bands = v;
        }
    }

    Ok(config)
}

pub fn merge_layout_overrides(config: &mut LayoutConfig, overrides: &LayoutConfigFile) {
    if let Some(v) = overrides.min_trunk_size {
        config.min_trunk_size = v.max(1);
    }
    if let Some(v) = overrides.node_width {
        config.node_width = v.max(1.0);
    }
    if let Some(v) = overrides.node_height {
        config.node_height = v.max(1.0);
    }
    if let Some(v) = overrides.margin_x {
        config.margin_x = v.max(0.0);
    }
    if let Some(v) = overrides.margin_y {
        config.margin_y = v.max(0.0);
    }
    if let Some(v) = overrides.display_width {
        config.display_width = v.max(0.0);
    }
}
