//! Status bar: playback state, plugin, frame counter and speed.

use crate::param::format_value;

/// Status information for the TUI status bar.
#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub plugin_name: String,
    pub frame: u64,
    pub is_playing: bool,
    pub playback_speed: f64,
    /// Transient notice, cleared by the next action.
    pub message: Option<String>,
}

impl StatusInfo {
    /// Format the playback indicator.
    pub fn playback_display(&self) -> &str {
        if self.is_playing {
            "PLAY"
        } else {
            "STOP"
        }
    }

    /// Format the speed multiplier as "x4" or "x0.5".
    pub fn speed_display(&self) -> String {
        format!("x{}", format_value(self.playback_speed, 0.01))
    }

    /// Format the frame counter.
    pub fn frame_display(&self) -> String {
        format!("frame {}", self.frame)
    }
}

impl Default for StatusInfo {
    fn default() -> Self {
        Self {
            plugin_name: String::new(),
            frame: 0,
            is_playing: false,
            playback_speed: 1.0,
            message: None,
        }
    }
}
