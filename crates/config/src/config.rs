//! Core configuration structures and loading logic

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the config file looked up inside the state directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Error type for configuration operations
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file
    Io(std::io::Error),
    /// TOML parsing error
    Parse(toml::de::Error),
    /// No state directory configured and no home directory to derive one from
    NoHomeDir,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::NoHomeDir => {
                write!(f, "Could not determine home directory for the state directory")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Filesystem locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PathsConfig {
    /// Root of the input/output/fails/skipped/trash tree (`$HOME/.encoder` if None)
    pub state_dir: Option<PathBuf>,
}

/// Program names (or absolute paths) of the external tools
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolsConfig {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,
    #[serde(default = "default_notify_send")]
    pub notify_send: String,
    #[serde(default = "default_systemctl")]
    pub systemctl: String,
    /// Tool-existence probe
    #[serde(default = "default_which")]
    pub which: String,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_notify_send() -> String {
    "notify-send".to_string()
}

fn default_systemctl() -> String {
    "systemctl".to_string()
}

fn default_which() -> String {
    "which".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            notify_send: default_notify_send(),
            systemctl: default_systemctl(),
            which: default_which(),
        }
    }
}

/// Hardware encoder settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EncoderConfig {
    /// VAAPI render node (default /dev/dri/renderD128)
    #[serde(default = "default_vaapi_device")]
    pub vaapi_device: PathBuf,
    /// Filter graph uploading frames to the GPU
    #[serde(default = "default_video_filter")]
    pub video_filter: String,
    /// Hardware codec selector
    #[serde(default = "default_video_codec")]
    pub video_codec: String,
    /// Accepted file extensions, without the leading dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_vaapi_device() -> PathBuf {
    PathBuf::from("/dev/dri/renderD128")
}

fn default_video_filter() -> String {
    "format=nv12,hwupload".to_string()
}

fn default_video_codec() -> String {
    "hevc_vaapi".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["mp4".to_string(), "mkv".to_string(), "ts".to_string()]
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            vaapi_device: default_vaapi_device(),
            video_filter: default_video_filter(),
            video_codec: default_video_codec(),
            extensions: default_extensions(),
        }
    }
}

/// Desktop notification settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotifyConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Expiry passed to the notification daemon, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u32,
    #[serde(default = "default_message")]
    pub message: String,
}

fn default_app_name() -> String {
    "encoder".to_string()
}

fn default_timeout_ms() -> u32 {
    5000
}

fn default_message() -> String {
    "Finished encoding".to_string()
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            timeout_ms: default_timeout_ms(),
            message: default_message(),
        }
    }
}

/// Power-off countdown settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoweroffConfig {
    /// Seconds counted down before the system is powered off
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u32,
}

fn default_delay_secs() -> u32 {
    30
}

impl Default for PoweroffConfig {
    fn default() -> Self {
        Self {
            delay_secs: default_delay_secs(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub poweroff: PoweroffConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Parses the config.toml file and handles missing optional fields with defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    ///
    /// Overrides the following values if environment variables are set:
    /// - ENCODER_STATE_DIR -> paths.state_dir
    /// - ENCODER_FFMPEG -> tools.ffmpeg
    /// - ENCODER_FFPROBE -> tools.ffprobe
    /// - ENCODER_VAAPI_DEVICE -> encoder.vaapi_device
    /// - ENCODER_VIDEO_CODEC -> encoder.video_codec
    /// - ENCODER_POWEROFF_DELAY_SECS -> poweroff.delay_secs
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("ENCODER_STATE_DIR") {
            if !val.is_empty() {
                self.paths.state_dir = Some(PathBuf::from(val));
            }
        }

        if let Ok(val) = env::var("ENCODER_FFMPEG") {
            if !val.is_empty() {
                self.tools.ffmpeg = val;
            }
        }

        if let Ok(val) = env::var("ENCODER_FFPROBE") {
            if !val.is_empty() {
                self.tools.ffprobe = val;
            }
        }

        if let Ok(val) = env::var("ENCODER_VAAPI_DEVICE") {
            if !val.is_empty() {
                self.encoder.vaapi_device = PathBuf::from(val);
            }
        }

        if let Ok(val) = env::var("ENCODER_VIDEO_CODEC") {
            if !val.is_empty() {
                self.encoder.video_codec = val;
            }
        }

        if let Ok(val) = env::var("ENCODER_POWEROFF_DELAY_SECS") {
            if let Ok(secs) = val.parse::<u32>() {
                self.poweroff.delay_secs = secs;
            }
        }
    }

    /// Resolve the state directory, falling back to `$HOME/.encoder`
    pub fn state_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.paths.state_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::home_dir()
                .map(|home| home.join(".encoder"))
                .ok_or(ConfigError::NoHomeDir),
        }
    }

    /// Load configuration from file and apply environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration for a run
    ///
    /// An explicit path must exist. Without one, `config.toml` inside the
    /// state directory is used when present, otherwise defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let mut config = Config::default();
        config.apply_env_overrides();

        let candidate = config.state_dir()?.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Self::load(candidate);
        }

        Ok(config)
    }
}
