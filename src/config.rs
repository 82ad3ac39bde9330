use crate::adapters::{DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT};
use crate::interfaces::{
    ClickMode, Context, Interface, LedInterface, LedSettings, LightInterface, LightSettings, MotorInterface,
    MotorSettings, MouseInterface, MouseSettings, ESP32_SERIAL_ADAPTER, MOUSE_CONTROLLER,
};
use crate::manager::InterfaceManager;
use crate::payload::{landmarks, Handedness, NUM_LANDMARKS};
use log::{debug, warn};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default config file, looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "handmotion.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{field} = {value} is not a landmark index (must be < {max})")]
    Landmark {
        field: &'static str,
        value: usize,
        max: usize,
    },
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Verbose logging
    #[serde(default)]
    pub debug: bool,
    /// Frame loop target rate, 0 disables pacing
    #[serde(default = "default_target_fps")]
    pub target_fps: f64,
    /// Interface ids enabled at start-up
    #[serde(default = "default_active")]
    pub active: Vec<String>,
    #[serde(default)]
    pub gestures: GesturesConfig,
    #[serde(default)]
    pub landmarks: LandmarksConfig,
    #[serde(default)]
    pub cursor: CursorConfig,
    #[serde(default)]
    pub led: HandConfig,
    #[serde(default)]
    pub light: HandConfig,
    #[serde(default)]
    pub motor: MotorConfig,
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            target_fps: default_target_fps(),
            active: default_active(),
            gestures: GesturesConfig::default(),
            landmarks: LandmarksConfig::default(),
            cursor: CursorConfig::default(),
            led: HandConfig::default(),
            light: HandConfig::default(),
            motor: MotorConfig::default(),
            serial: SerialConfig::default(),
            calibration: CalibrationConfig::default(),
        }
    }
}

fn default_target_fps() -> f64 {
    30.0
}

fn default_active() -> Vec<String> {
    vec![MouseInterface::ID.to_string()]
}

fn default_hand() -> Handedness {
    Handedness::Right
}

// ============================================================================
// Gestures / Landmarks
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct GesturesConfig {
    /// World-space distance (metres) below which two fingertips touch
    #[serde(default = "default_pinch_threshold")]
    pub pinch_threshold: f32,
}

impl Default for GesturesConfig {
    fn default() -> Self {
        Self {
            pinch_threshold: default_pinch_threshold(),
        }
    }
}

fn default_pinch_threshold() -> f32 {
    0.03
}

#[derive(Debug, Deserialize, Clone)]
pub struct LandmarksConfig {
    #[serde(default = "default_thumb_tip")]
    pub thumb_tip: usize,
    #[serde(default = "default_index_tip")]
    pub index_tip: usize,
    #[serde(default = "default_middle_tip")]
    pub middle_tip: usize,
    #[serde(default = "default_ring_tip")]
    pub ring_tip: usize,
    #[serde(default = "default_pinky_tip")]
    pub pinky_tip: usize,
}

impl Default for LandmarksConfig {
    fn default() -> Self {
        Self {
            thumb_tip: default_thumb_tip(),
            index_tip: default_index_tip(),
            middle_tip: default_middle_tip(),
            ring_tip: default_ring_tip(),
            pinky_tip: default_pinky_tip(),
        }
    }
}

fn default_thumb_tip() -> usize {
    landmarks::THUMB_TIP
}
fn default_index_tip() -> usize {
    landmarks::INDEX_FINGER_TIP
}
fn default_middle_tip() -> usize {
    landmarks::MIDDLE_FINGER_TIP
}
fn default_ring_tip() -> usize {
    landmarks::RING_FINGER_TIP
}
fn default_pinky_tip() -> usize {
    landmarks::PINKY_TIP
}

// ============================================================================
// Interfaces
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct CursorConfig {
    #[serde(default = "default_hand")]
    pub hand: Handedness,
    /// Landmark that steers the cursor
    #[serde(default = "default_index_tip")]
    pub tracker_landmark: usize,
    /// "level" clicks every frame the pinch holds, "edge" once per pinch
    #[serde(default)]
    pub click_mode: ClickMode,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            hand: default_hand(),
            tracker_landmark: default_index_tip(),
            click_mode: ClickMode::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HandConfig {
    #[serde(default = "default_hand")]
    pub hand: Handedness,
}

impl Default for HandConfig {
    fn default() -> Self {
        Self { hand: default_hand() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MotorConfig {
    #[serde(default = "default_hand")]
    pub hand: Handedness,
    /// Thumb–index distance that maps to full throttle
    #[serde(default = "default_high_bound")]
    pub high_bound: f32,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            hand: default_hand(),
            high_bound: default_high_bound(),
        }
    }
}

fn default_high_bound() -> f32 {
    0.15
}

// ============================================================================
// Serial / Calibration
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_name")]
    pub name: String,
    /// Device path (supports ${ENV_VAR} syntax)
    #[serde(default = "default_serial_port")]
    pub port: String,
    /// Must match the firmware's `Serial.begin`
    #[serde(default = "default_baud")]
    pub baud: u32,
    /// Read timeout while waiting for the handshake
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Wait for READY_ACK after opening
    #[serde(default)]
    pub handshake: bool,
    #[serde(default = "default_handshake_attempts")]
    pub handshake_attempts: usize,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            name: default_serial_name(),
            port: default_serial_port(),
            baud: default_baud(),
            timeout_ms: default_timeout_ms(),
            handshake: false,
            handshake_attempts: default_handshake_attempts(),
        }
    }
}

fn default_serial_name() -> String {
    "ESP32".into()
}
fn default_serial_port() -> String {
    "/dev/ttyUSB0".into()
}
fn default_baud() -> u32 {
    DEFAULT_BAUD_RATE
}
fn default_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT.as_millis() as u64
}
fn default_handshake_attempts() -> usize {
    50
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CalibrationConfig {
    #[serde(default = "default_calibration_duration")]
    pub duration_secs: f64,
    #[serde(default = "default_thumb_tip")]
    pub first_landmark: usize,
    #[serde(default = "default_index_tip")]
    pub second_landmark: usize,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_calibration_duration(),
            first_landmark: default_thumb_tip(),
            second_landmark: default_index_tip(),
        }
    }
}

fn default_calibration_duration() -> f64 {
    5.0
}

/// Expand ${VAR} to environment variable values
fn expand_env_vars(s: &str) -> String {
    let mut result = s.to_string();

    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_else(|_| {
                warn!("[config] Environment variable '{}' not found", var_name);
                String::new()
            });
            result.replace_range(start..start + end + 1, &value);
        } else {
            break;
        }
    }

    result
}

impl Config {
    /// Load from `path`, falling back to defaults when the file is missing or invalid
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!("[config] {:?} not found, using defaults", path);
            return Config::default();
        }
        match fs::read_to_string(path)
            .map_err(ConfigError::from)
            .and_then(|s| Self::from_toml_str(&s))
        {
            Ok(config) => config,
            Err(e) => {
                warn!("[config] Ignoring {:?}: {}", path, e);
                Config::default()
            }
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(s)?;
        config.serial.port = expand_env_vars(&config.serial.port);
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let indices = [
            ("landmarks.thumb_tip", self.landmarks.thumb_tip),
            ("landmarks.index_tip", self.landmarks.index_tip),
            ("landmarks.middle_tip", self.landmarks.middle_tip),
            ("landmarks.ring_tip", self.landmarks.ring_tip),
            ("landmarks.pinky_tip", self.landmarks.pinky_tip),
            ("cursor.tracker_landmark", self.cursor.tracker_landmark),
            ("calibration.first_landmark", self.calibration.first_landmark),
            ("calibration.second_landmark", self.calibration.second_landmark),
        ];
        for (field, value) in indices {
            if value >= NUM_LANDMARKS {
                return Err(ConfigError::Landmark {
                    field,
                    value,
                    max: NUM_LANDMARKS,
                });
            }
        }
        Ok(())
    }

    pub fn mouse_settings(&self) -> MouseSettings {
        MouseSettings {
            hand: self.cursor.hand,
            tracker_landmark: self.cursor.tracker_landmark,
            thumb_tip: self.landmarks.thumb_tip,
            index_tip: self.landmarks.index_tip,
            click_threshold: self.gestures.pinch_threshold,
            click_mode: self.cursor.click_mode,
        }
    }

    pub fn led_settings(&self) -> LedSettings {
        LedSettings {
            hand: self.led.hand,
            thumb_tip: self.landmarks.thumb_tip,
            finger_tips: [
                self.landmarks.index_tip,
                self.landmarks.middle_tip,
                self.landmarks.ring_tip,
                self.landmarks.pinky_tip,
            ],
            pinch_threshold: self.gestures.pinch_threshold,
        }
    }

    pub fn light_settings(&self) -> LightSettings {
        LightSettings {
            hand: self.light.hand,
            thumb_tip: self.landmarks.thumb_tip,
            index_tip: self.landmarks.index_tip,
            pinch_threshold: self.gestures.pinch_threshold,
        }
    }

    pub fn motor_settings(&self) -> MotorSettings {
        MotorSettings {
            hand: self.motor.hand,
            thumb_tip: self.landmarks.thumb_tip,
            index_tip: self.landmarks.index_tip,
            low_threshold: self.gestures.pinch_threshold,
            high_bound: self.motor.high_bound,
        }
    }

    /// Construct and register every interface whose adapter is in `context`:
    /// the cursor interface needs the cursor adapter, the others the serial one.
    pub fn build_manager(&self, context: &Context) -> anyhow::Result<InterfaceManager> {
        let mut manager = InterfaceManager::new();

        if context.contains(MOUSE_CONTROLLER) {
            manager.register(Box::new(MouseInterface::new(context, self.mouse_settings())?))?;
        }
        if context.contains(ESP32_SERIAL_ADAPTER) {
            register_serial_interfaces(&mut manager, context, self)?;
        }
        Ok(manager)
    }
}

fn register_serial_interfaces(
    manager: &mut InterfaceManager,
    context: &Context,
    config: &Config,
) -> anyhow::Result<()> {
    let led = LedInterface::new(context, config.led_settings())?;
    let light = LightInterface::new(context, config.light_settings())?;
    let motor = MotorInterface::new(context, config.motor_settings())?;
    let interfaces: [Box<dyn Interface>; 3] = [Box::new(led), Box::new(light), Box::new(motor)];
    for interface in interfaces {
        manager.register(interface)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{recording_cursor, recording_serial};

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert!(!config.debug);
        assert_eq!(config.target_fps, 30.0);
        assert_eq!(config.active, vec!["cursor"]);
        assert_eq!(config.gestures.pinch_threshold, 0.03);
        assert_eq!(config.landmarks.pinky_tip, 20);
        assert_eq!(config.cursor.click_mode, ClickMode::Level);
        assert_eq!(config.motor.high_bound, 0.15);
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud, 115_200);
        assert_eq!(config.serial.read_timeout(), Duration::from_secs(1));
        assert_eq!(config.serial.handshake_attempts, 50);
        assert_eq!(config.calibration.duration_secs, 5.0);
    }

    #[test]
    fn test_parse_sections() {
        let config = Config::from_toml_str(
            r#"
            active = ["led", "motor"]
            target_fps = 0

            [gestures]
            pinch_threshold = 0.04

            [cursor]
            hand = "Left"
            click_mode = "edge"

            [motor]
            high_bound = 0.2

            [serial]
            baud = 9600
            timeout_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.active, vec!["led", "motor"]);
        assert_eq!(config.target_fps, 0.0);
        assert_eq!(config.mouse_settings().hand, Handedness::Left);
        assert_eq!(config.mouse_settings().click_mode, ClickMode::Edge);
        assert_eq!(config.motor_settings().low_threshold, 0.04);
        assert_eq!(config.motor_settings().high_bound, 0.2);
        assert_eq!(config.led_settings().finger_tips, [8, 12, 16, 20]);
        assert_eq!(config.serial.baud, 9600);
        assert_eq!(config.serial.read_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_rejects_bad_landmark_index() {
        let err = Config::from_toml_str("[landmarks]\npinky_tip = 21").unwrap_err();
        assert!(matches!(err, ConfigError::Landmark { field: "landmarks.pinky_tip", value: 21, .. }));
    }

    #[test]
    fn test_rejects_unparsable() {
        assert!(matches!(
            Config::from_toml_str("target_fps = \"fast\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load(Path::new("/nonexistent/handmotion.toml"));
        assert_eq!(config.active, vec!["cursor"]);
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: test-only variable with a unique name
        unsafe { std::env::set_var("HANDMOTION_TEST_PORT", "ttyACM1") };
        assert_eq!(expand_env_vars("/dev/${HANDMOTION_TEST_PORT}"), "/dev/ttyACM1");
        assert_eq!(expand_env_vars("/dev/${HANDMOTION_MISSING_VAR}x"), "/dev/x");
        assert_eq!(expand_env_vars("/dev/${unterminated"), "/dev/${unterminated");
    }

    #[test]
    fn test_build_manager_follows_context() {
        let config = Config::default();

        let (serial, _out) = recording_serial();
        let mut context = Context::new();
        context.insert_serial(ESP32_SERIAL_ADAPTER, serial);
        let manager = config.build_manager(&context).unwrap();
        assert_eq!(manager.ids(), vec!["led", "light", "motor"]);

        let (cursor, _events) = recording_cursor();
        context.insert_cursor(MOUSE_CONTROLLER, cursor);
        let manager = config.build_manager(&context).unwrap();
        assert_eq!(manager.ids(), vec!["cursor", "led", "light", "motor"]);
        assert!(manager.active_ids().is_empty());
    }
}
