//! Viewer configuration loading and defaults

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::camera::{CameraAction, MouseBindings};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub controls: ControlsConfig,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub labels: LabelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Remote payload holding the scene description
    #[serde(default = "default_model_url")]
    pub url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            url: default_model_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_model_url() -> String {
    "https://storage.yandexcloud.net/lahta.contextmachine.online/files/pretty_ceiling_props.json"
        .to_string()
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Vertical field of view
    #[serde(default = "default_fov")]
    pub fov_degrees: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
    #[serde(default = "default_camera_position")]
    pub position: [f32; 3],
    #[serde(default)]
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: default_fov(),
            near: default_near(),
            far: default_far(),
            position: default_camera_position(),
            target: [0.0; 3],
        }
    }
}

fn default_fov() -> f32 {
    75.0
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    1000.0
}

fn default_camera_position() -> [f32; 3] {
    [10.0, 10.0, 10.0]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlsConfig {
    #[serde(default = "default_left_action")]
    pub left: CameraAction,
    #[serde(default = "default_middle_action")]
    pub middle: CameraAction,
    #[serde(default = "default_right_action")]
    pub right: CameraAction,
    #[serde(default = "default_wheel_action")]
    pub wheel: CameraAction,
    /// Smoothing time constant in seconds when not dragging (0 snaps)
    #[serde(default)]
    pub smooth_time: f32,
    /// Smoothing time constant in seconds while dragging (0 snaps)
    #[serde(default)]
    pub dragging_smooth_time: f32,
    #[serde(default = "default_dolly_speed")]
    pub dolly_speed: f32,
    /// Dolly toward the point under the cursor instead of the target
    #[serde(default = "default_true")]
    pub dolly_to_cursor: bool,
    #[serde(default = "default_one")]
    pub rotate_speed: f32,
    #[serde(default = "default_truck_speed")]
    pub truck_speed: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            left: default_left_action(),
            middle: default_middle_action(),
            right: default_right_action(),
            wheel: default_wheel_action(),
            smooth_time: 0.0,
            dragging_smooth_time: 0.0,
            dolly_speed: default_dolly_speed(),
            dolly_to_cursor: true,
            rotate_speed: default_one(),
            truck_speed: default_truck_speed(),
        }
    }
}

impl ControlsConfig {
    pub fn bindings(&self) -> MouseBindings {
        MouseBindings {
            left: self.left,
            middle: self.middle,
            right: self.right,
            wheel: self.wheel,
        }
    }
}

fn default_left_action() -> CameraAction {
    CameraAction::None
}

fn default_middle_action() -> CameraAction {
    CameraAction::Dolly
}

fn default_right_action() -> CameraAction {
    CameraAction::Rotate
}

fn default_wheel_action() -> CameraAction {
    CameraAction::Dolly
}

fn default_dolly_speed() -> f32 {
    0.4
}

fn default_true() -> bool {
    true
}

fn default_one() -> f32 {
    1.0
}

fn default_truck_speed() -> f32 {
    2.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Background colour as `#rrggbb`
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_ambient_intensity")]
    pub ambient_intensity: f32,
    #[serde(default)]
    pub directional_light: DirectionalLightConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: default_background(),
            ambient_intensity: default_ambient_intensity(),
            directional_light: DirectionalLightConfig::default(),
        }
    }
}

fn default_background() -> String {
    "#333333".to_string()
}

fn default_ambient_intensity() -> f32 {
    1.5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionalLightConfig {
    #[serde(default = "default_light_position")]
    pub position: [f32; 3],
    #[serde(default = "default_one")]
    pub intensity: f32,
    #[serde(default = "default_true")]
    pub cast_shadow: bool,
    #[serde(default = "default_shadow_map_size")]
    pub shadow_map_size: u32,
    #[serde(default = "default_shadow_near")]
    pub shadow_near: f32,
    #[serde(default = "default_shadow_far")]
    pub shadow_far: f32,
}

impl Default for DirectionalLightConfig {
    fn default() -> Self {
        Self {
            position: default_light_position(),
            intensity: default_one(),
            cast_shadow: true,
            shadow_map_size: default_shadow_map_size(),
            shadow_near: default_shadow_near(),
            shadow_far: default_shadow_far(),
        }
    }
}

fn default_light_position() -> [f32; 3] {
    [5.0, 10.0, 15.0]
}

fn default_shadow_map_size() -> u32 {
    2048
}

fn default_shadow_near() -> f32 {
    0.5
}

fn default_shadow_far() -> f32 {
    50.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    /// Font size in pixels
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    /// Horizontal and vertical padding in pixels
    #[serde(default = "default_padding")]
    pub padding: [f32; 2],
    /// Anchor offset in the labelled node's local space
    #[serde(default = "default_label_offset")]
    pub offset: [f32; 3],
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            font_size: default_font_size(),
            padding: default_padding(),
            offset: default_label_offset(),
        }
    }
}

fn default_font_size() -> f32 {
    12.0
}

fn default_padding() -> [f32; 2] {
    [4.0, 2.0]
}

fn default_label_offset() -> [f32; 3] {
    [0.0, 1.0, 0.0]
}

/// Parse a `#rrggbb` (or `rrggbb`) colour into sRGB floats in `0.0..=1.0`
pub fn parse_hex_color(hex: &str) -> Option<[f32; 3]> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .ok()
            .map(|v| f32::from(v) / 255.0)
    };
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Load configuration from file, falling back to defaults when missing
pub fn load_config(path: &Path) -> Result<ViewerConfig> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ViewerConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(ViewerConfig::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&ViewerConfig::default())?;
    std::fs::write(path, content)?;
    Ok(())
}
