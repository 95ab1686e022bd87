// ABOUTME: Typed settings persisted to primitive key-value stores
// ABOUTME: Validation, default fallback, change notification, and the settings registry

pub mod error;
pub mod kinds;
pub mod registry;
pub mod setting;
pub mod types;

pub use error::{SettingError, SettingResult};
pub use kinds::{
    ColorKind, ColorSetting, EnumKind, EnumSetting, IntSetting, OrdinalEnum, PlainKind,
    PlainPrimitive, SecretKind, SecretSetting, StringSetting,
};
pub use registry::{Settings, SettingsSnapshot};
pub use setting::{Setting, SettingKind};
pub use types::{Color, ThemeMode};
