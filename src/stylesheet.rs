//! Palette for the frame renderer
//!
//! Rendered elements are coloured through named tokens (`structural-edge`,
//! `steiner-edge`, `ghost-initial`, ...). A stylesheet maps tokens to concrete
//! colours and can be loaded from TOML:
//!
//! ```toml
//! [metadata]
//! name = "Night"
//!
//! [colors]
//! background = "#101018"
//! structural-edge = "#f0f0f0"
//! ```
//!
//! Node fills are not tokens: they come from the interpolated node colours.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading or parsing stylesheets
#[derive(Error, Debug)]
pub enum StylesheetError {
    #[error("Failed to read stylesheet file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse stylesheet TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// A stylesheet mapping colour tokens to concrete values
#[derive(Debug, Clone, PartialEq)]
pub struct Stylesheet {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Color mappings: token name -> hex color
    pub colors: HashMap<String, String>,
}

/// TOML structure for deserializing stylesheets
#[derive(Deserialize)]
struct TomlStylesheet {
    metadata: Option<TomlMetadata>,
    #[serde(default)]
    colors: HashMap<String, String>,
}

#[derive(Deserialize)]
struct TomlMetadata {
    name: Option<String>,
    description: Option<String>,
}

/// Default palette: dark edges on white, muted Steiner structure, pale ghosts
const DEFAULT_PALETTE: &[(&str, &str)] = &[
    ("background", "#ffffff"),
    ("structural-edge", "#333333"),
    ("steiner-edge", "#bbdefb"),
    ("steiner-node", "#90caf9"),
    ("frame-node", "#9e9e9e"),
    ("node-stroke", "#1a1a1a"),
    ("ghost-initial", "#e0e0e0"),
    ("ghost-final", "#ffe0b2"),
    ("label-text", "#333333"),
];

impl Stylesheet {
    /// Load stylesheet from TOML file
    pub fn from_file(path: &Path) -> Result<Self, StylesheetError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load stylesheet from TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, StylesheetError> {
        let parsed: TomlStylesheet = toml::from_str(content)?;

        Ok(Stylesheet {
            name: parsed.metadata.as_ref().and_then(|m| m.name.clone()),
            description: parsed.metadata.as_ref().and_then(|m| m.description.clone()),
            colors: parsed.colors,
        })
    }

    /// Resolve a token defined in this stylesheet
    pub fn resolve(&self, token: &str) -> Option<&str> {
        self.colors.get(token).map(|s| s.as_str())
    }

    /// Resolve a token with fallback to the default palette
    ///
    /// Fallback order:
    /// 1. This stylesheet
    /// 2. The default palette
    /// 3. `#cccccc` for `ghost-*` tokens, `#333333` for anything else
    pub fn resolve_or_default(&self, token: &str) -> String {
        if let Some(color) = self.resolve(token) {
            return color.to_string();
        }
        if let Some((_, color)) = DEFAULT_PALETTE.iter().find(|(name, _)| *name == token) {
            return color.to_string();
        }
        if token.starts_with("ghost") {
            return "#cccccc".to_string();
        }
        "#333333".to_string()
    }
}

impl Default for Stylesheet {
    fn default() -> Self {
        Self {
            name: Some("default".to_string()),
            description: None,
            colors: DEFAULT_PALETTE
                .iter()
                .map(|&(token, color)| (token.to_string(), color.to_string()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> Stylesheet {
        Stylesheet {
            name: None,
            description: None,
            colors: HashMap::new(),
        }
    }

    #[test]
    fn test_default_stylesheet() {
        let stylesheet = Stylesheet::default();
        assert!(stylesheet.colors.contains_key("structural-edge"));
        assert!(stylesheet.colors.contains_key("steiner-edge"));
        assert!(stylesheet.colors.contains_key("background"));
        assert_eq!(stylesheet.resolve("label-text"), Some("#333333"));
    }

    #[test]
    fn test_resolve_missing_token() {
        assert_eq!(Stylesheet::default().resolve("nonexistent"), None);
    }

    #[test]
    fn test_resolve_or_default_fallback() {
        let empty = empty();
        assert_eq!(empty.resolve_or_default("steiner-edge"), "#bbdefb");
        assert_eq!(empty.resolve_or_default("ghost-middle"), "#cccccc");
        assert_eq!(empty.resolve_or_default("whatever"), "#333333");
    }

    #[test]
    fn test_parse_toml_with_metadata() {
        let toml_str = r##"
[metadata]
name = "Night"
description = "Light on dark"

[colors]
background = "#101018"
"##;
        let stylesheet = Stylesheet::from_str(toml_str).expect("Should parse");
        assert_eq!(stylesheet.name, Some("Night".to_string()));
        assert_eq!(stylesheet.description, Some("Light on dark".to_string()));
        assert_eq!(stylesheet.resolve_or_default("background"), "#101018");
        assert_eq!(stylesheet.resolve_or_default("structural-edge"), "#333333");
    }

    #[test]
    fn test_parse_toml_without_colors() {
        let stylesheet = Stylesheet::from_str("[metadata]\nname = \"bare\"\n").expect("Should parse");
        assert!(stylesheet.colors.is_empty());
    }

    #[test]
    fn test_invalid_toml_error() {
        assert!(Stylesheet::from_str("this is not valid toml {{{{").is_err());
    }
}
