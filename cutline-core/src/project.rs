//! Global project settings shared by every clip in a timeline

use serde::{Deserialize, Serialize};

/// Output dimensions and frame rate of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Frame width in pixels
    #[serde(default)]
    pub width: u32,
    /// Frame height in pixels
    #[serde(default)]
    pub height: u32,
    /// Frames per second
    #[serde(default)]
    pub fps: u32,
}

impl ProjectSettings {
    /// Creates new project settings
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        Self { width, height, fps }
    }
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30,
        }
    }
}
