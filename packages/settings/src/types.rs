// ABOUTME: Domain value types exposed by settings
// ABOUTME: Theme mode enumeration and packed ARGB color

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SettingError;
use crate::kinds::OrdinalEnum;

/// Application theme. Persisted by ordinal, so variant order is part of the
/// storage format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    System,
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::System => "system",
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }
}

impl OrdinalEnum for ThemeMode {
    const VARIANTS: &'static [Self] = &[ThemeMode::System, ThemeMode::Light, ThemeMode::Dark];

    fn ordinal(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = SettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "system" => Ok(ThemeMode::System),
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            _ => Err(SettingError::InvalidThemeMode(s.to_string())),
        }
    }
}

/// 32-bit color packed as `0xAARRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(u32);

impl Color {
    pub const fn from_argb(argb: u32) -> Self {
        Self(argb)
    }

    /// Fully opaque color from RGB channels
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self(0xFF00_0000 | (red as u32) << 16 | (green as u32) << 8 | blue as u32)
    }

    pub const fn argb(&self) -> u32 {
        self.0
    }

    pub const fn alpha(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn red(&self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(&self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(&self) -> u8 {
        self.0 as u8
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

impl FromStr for Color {
    type Err = SettingError;

    /// Accepts `#RRGGBB` (opaque) and `#AARRGGBB`; `0x` works in place of `#`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| SettingError::InvalidColor(s.to_string()))?;

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SettingError::InvalidColor(s.to_string()));
        }

        let value =
            u32::from_str_radix(hex, 16).map_err(|_| SettingError::InvalidColor(s.to_string()))?;

        match hex.len() {
            6 => Ok(Color(0xFF00_0000 | value)),
            8 => Ok(Color(value)),
            _ => Err(SettingError::InvalidColor(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_mode_ordinals_follow_variant_order() {
        for (index, mode) in ThemeMode::VARIANTS.iter().enumerate() {
            assert_eq!(mode.ordinal(), index);
        }
    }

    #[test]
    fn test_theme_mode_parse() {
        assert_eq!("dark".parse::<ThemeMode>().unwrap(), ThemeMode::Dark);
        assert_eq!(" Light ".parse::<ThemeMode>().unwrap(), ThemeMode::Light);
        assert_eq!("SYSTEM".parse::<ThemeMode>().unwrap(), ThemeMode::System);
        assert!("sepia".parse::<ThemeMode>().is_err());
    }

    #[test]
    fn test_theme_mode_serde_lowercase() {
        assert_eq!(serde_json::to_string(&ThemeMode::Dark).unwrap(), "\"dark\"");
    }

    #[test]
    fn test_color_channels() {
        let color = Color::from_argb(0x80112233);
        assert_eq!(color.alpha(), 0x80);
        assert_eq!(color.red(), 0x11);
        assert_eq!(color.green(), 0x22);
        assert_eq!(color.blue(), 0x33);
        assert_eq!(Color::from_rgb(0x11, 0x22, 0x33).argb(), 0xFF112233);
    }

    #[test]
    fn test_color_parse_and_display() {
        assert_eq!("#3F51B5".parse::<Color>().unwrap(), Color::from_argb(0xFF3F51B5));
        assert_eq!("#803f51b5".parse::<Color>().unwrap(), Color::from_argb(0x803F51B5));
        assert_eq!("0x00000000".parse::<Color>().unwrap(), Color::from_argb(0));
        assert_eq!(Color::from_argb(0xFFFF4081).to_string(), "#FFFF4081");

        assert!("3F51B5".parse::<Color>().is_err());
        assert!("#3F51B".parse::<Color>().is_err());
        assert!("#+3F51B5".parse::<Color>().is_err());
        assert!("#GG51B5".parse::<Color>().is_err());
    }
}
