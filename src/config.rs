//! Clustering configuration.
//!
//! [`ClusterConfig`] holds every serializable option of a cluster index together
//! with its documented default. Callback options (identity accessor, map and
//! reduce) are not serializable and are supplied through
//! [`ClusterIndexBuilder`](crate::ClusterIndexBuilder) instead.

use crate::codec::MAX_ZOOM_LIMIT;
use crate::error::{ClusterError, Result};
use serde::de::Error;

/// Node capacity the level trees are compiled with.
pub(crate) const COMPILED_NODE_SIZE: usize = 9;

/// Clustering configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterConfig {
    /// Minimal zoom level to generate clusters on.
    #[serde(default)]
    pub min_zoom: u8,

    /// Maximal zoom level to cluster the points on.
    #[serde(default = "ClusterConfig::default_max_zoom")]
    pub max_zoom: u8,

    /// Minimum aggregated point count required to form a cluster.
    #[serde(default = "ClusterConfig::default_min_points")]
    pub min_points: usize,

    /// Cluster radius in pixels.
    #[serde(default = "ClusterConfig::default_radius")]
    pub radius: f64,

    /// Tile extent in pixels; the radius is expressed relative to it.
    #[serde(default = "ClusterConfig::default_extent")]
    pub extent: f64,

    /// Scale multiplier between consecutive zoom levels.
    #[serde(default = "ClusterConfig::default_zoom_factor")]
    pub zoom_factor: f64,

    /// Spatial index node capacity hint.
    #[serde(default = "ClusterConfig::default_node_size")]
    pub node_size: usize,

    /// Replace point ids in output with their position in the point store.
    #[serde(default)]
    pub generate_id: bool,
}

impl ClusterConfig {
    const fn default_max_zoom() -> u8 {
        16
    }

    const fn default_min_points() -> usize {
        2
    }

    const fn default_radius() -> f64 {
        40.0
    }

    const fn default_extent() -> f64 {
        512.0
    }

    const fn default_zoom_factor() -> f64 {
        2.0
    }

    const fn default_node_size() -> usize {
        COMPILED_NODE_SIZE
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_extent(mut self, extent: f64) -> Self {
        self.extent = extent;
        self
    }

    pub fn with_zoom_factor(mut self, zoom_factor: f64) -> Self {
        self.zoom_factor = zoom_factor;
        self
    }

    pub fn with_node_size(mut self, node_size: usize) -> Self {
        self.node_size = node_size;
        self
    }

    pub fn with_generate_id(mut self, generate_id: bool) -> Self {
        self.generate_id = generate_id;
        self
    }

    /// Clustering radius in projected units at `zoom`.
    pub(crate) fn radius_at(&self, zoom: i32) -> f64 {
        self.radius / (self.extent * self.zoom_factor.powi(zoom))
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_zoom > self.max_zoom {
            return Err(ClusterError::InvalidConfig(format!(
                "min_zoom ({}) must not exceed max_zoom ({})",
                self.min_zoom, self.max_zoom
            )));
        }

        if self.max_zoom > MAX_ZOOM_LIMIT {
            return Err(ClusterError::InvalidConfig(format!(
                "max_zoom must be at most {}, got {}",
                MAX_ZOOM_LIMIT, self.max_zoom
            )));
        }

        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ClusterError::InvalidConfig(
                "radius must be a positive finite number".to_string(),
            ));
        }

        if !(self.extent.is_finite() && self.extent > 0.0) {
            return Err(ClusterError::InvalidConfig(
                "extent must be a positive finite number".to_string(),
            ));
        }

        if !(self.zoom_factor.is_finite() && self.zoom_factor > 0.0) {
            return Err(ClusterError::InvalidConfig(
                "zoom_factor must be a positive finite number".to_string(),
            ));
        }

        if self.node_size < 4 {
            return Err(ClusterError::InvalidConfig(format!(
                "node_size must be at least 4, got {}",
                self.node_size
            )));
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let config: ClusterConfig = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        let config: ClusterConfig = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0,
            max_zoom: Self::default_max_zoom(),
            min_points: Self::default_min_points(),
            radius: Self::default_radius(),
            extent: Self::default_extent(),
            zoom_factor: Self::default_zoom_factor(),
            node_size: Self::default_node_size(),
            generate_id: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ClusterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_zoom, 16);
        assert_eq!(config.min_points, 2);
        assert_eq!(config.radius, 40.0);
        assert_eq!(config.extent, 512.0);
        assert_eq!(config.zoom_factor, 2.0);
    }

    #[test]
    fn test_rejects_inverted_zoom_range() {
        let config = ClusterConfig::default().with_zoom_range(5, 3);
        assert!(matches!(
            config.validate(),
            Err(ClusterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_max_zoom_beyond_codec_range() {
        let config = ClusterConfig::default().with_zoom_range(0, 31);
        assert!(config.validate().is_err());

        let config = ClusterConfig::default().with_zoom_range(0, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_radius() {
        assert!(ClusterConfig::default().with_radius(0.0).validate().is_err());
        assert!(
            ClusterConfig::default()
                .with_radius(f64::NAN)
                .validate()
                .is_err()
        );
        assert!(ClusterConfig::default().with_extent(-1.0).validate().is_err());
        assert!(ClusterConfig::default().with_node_size(2).validate().is_err());
    }

    #[test]
    fn test_radius_scales_with_zoom_factor() {
        let config = ClusterConfig::default();
        assert_eq!(config.radius_at(0), 40.0 / 512.0);
        assert_eq!(config.radius_at(3), 40.0 / (512.0 * 8.0));

        let config = config.with_zoom_factor(3.0);
        assert_eq!(config.radius_at(2), 40.0 / (512.0 * 9.0));
    }

    #[test]
    fn test_json_round_trip_with_partial_fields() {
        let config = ClusterConfig::from_json(r#"{"max_zoom": 4, "radius": 60.0}"#).unwrap();
        assert_eq!(config.max_zoom, 4);
        assert_eq!(config.radius, 60.0);
        assert_eq!(config.extent, 512.0);

        let json = config.to_json().unwrap();
        assert_eq!(ClusterConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_json_rejects_unknown_and_invalid() {
        assert!(ClusterConfig::from_json(r#"{"maxZoom": 4}"#).is_err());
        assert!(ClusterConfig::from_json(r#"{"max_zoom": 40}"#).is_err());
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_config() {
        let config = ClusterConfig::from_toml("max_zoom = 10\nmin_points = 5\n").unwrap();
        assert_eq!(config.max_zoom, 10);
        assert_eq!(config.min_points, 5);
        assert!(ClusterConfig::from_toml("min_zoom = 12\nmax_zoom = 10\n").is_err());
    }
}
