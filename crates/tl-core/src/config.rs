//! Tunables for the viewport and the editor.
//!
//! Both structs deserialize from partial JSON: missing keys fall back to
//! the defaults below. `EditorConfig::from_json` validates the result, so a
//! parsed config always yields a non-degenerate viewport and node geometry.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

/// Viewport zoom and pan limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    pub min_scale: f32,
    pub max_scale: f32,
    pub scale_step: f32,
    pub pan_sensitivity: f32,
    /// Padding (canvas units) added around the content in `fit_view`.
    pub fit_padding: f32,
    /// Fraction of the viewport the fitted content may occupy.
    pub fit_margin: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 3.0,
            scale_step: 0.1,
            pan_sensitivity: 1.0,
            fit_padding: 100.0,
            fit_margin: 0.9,
        }
    }
}

impl CanvasConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("minScale", self.min_scale as f64)?;
        positive("maxScale", self.max_scale as f64)?;
        if self.min_scale > self.max_scale {
            return Err(ConfigError::ScaleRange {
                min: self.min_scale,
                max: self.max_scale,
            });
        }
        positive("scaleStep", self.scale_step as f64)?;
        positive("panSensitivity", self.pan_sensitivity as f64)?;
        positive("fitMargin", self.fit_margin as f64)?;
        if !self.fit_padding.is_finite() || self.fit_padding < 0.0 {
            return Err(ConfigError::NotPositive {
                field: "fitPadding",
                value: self.fit_padding as f64,
            });
        }
        Ok(())
    }
}

/// Graph and interaction tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub node_width: f32,
    pub node_height: f32,
    pub creation_ms: f64,
    pub deletion_ms: f64,
    /// Radius of the input/output dots for hit testing.
    pub point_radius: f32,
    /// Radius of the delete target at a connection's midpoint.
    pub delete_radius: f32,
    pub canvas: CanvasConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            node_width: 140.0,
            node_height: 86.0,
            creation_ms: 500.0,
            deletion_ms: 300.0,
            point_radius: 8.0,
            delete_radius: 8.0,
            canvas: CanvasConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Parse and validate a (possibly partial) JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("nodeWidth", self.node_width as f64)?;
        positive("nodeHeight", self.node_height as f64)?;
        positive("creationMs", self.creation_ms)?;
        positive("deletionMs", self.deletion_ms)?;
        positive("pointRadius", self.point_radius as f64)?;
        positive("deleteRadius", self.delete_radius as f64)?;
        self.canvas.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = EditorConfig::from_json(r#"{"deletionMs": 150, "canvas": {"maxScale": 5}}"#)
            .unwrap();
        assert_eq!(cfg.deletion_ms, 150.0);
        assert_eq!(cfg.creation_ms, 500.0);
        assert_eq!(cfg.canvas.max_scale, 5.0);
        assert_eq!(cfg.canvas.min_scale, 0.1);
    }

    #[test]
    fn inverted_scale_range_is_rejected() {
        let err = EditorConfig::from_json(r#"{"canvas": {"minScale": 5}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::ScaleRange { min, max } if min == 5.0 && max == 3.0));
    }

    #[test]
    fn degenerate_values_are_rejected() {
        for json in [
            r#"{"canvas": {"minScale": 0}}"#,
            r#"{"canvas": {"minScale": -1}}"#,
            r#"{"canvas": {"scaleStep": 0}}"#,
            r#"{"nodeWidth": 0}"#,
            r#"{"nodeHeight": -86}"#,
            r#"{"creationMs": 0}"#,
            r#"{"pointRadius": 0}"#,
        ] {
            assert!(
                matches!(EditorConfig::from_json(json), Err(ConfigError::NotPositive { .. })),
                "accepted {json}"
            );
        }
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        assert!(matches!(EditorConfig::from_json("{"), Err(ConfigError::Json(_))));
    }
}
