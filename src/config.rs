// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Engine configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration file looked up in the working directory by [`EngineConfig::load`]
pub const CONFIG_FILE: &str = "polyframe-csg.toml";

/// Settings of the OpenSCAD-backed engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// OpenSCAD executable; looked up on PATH when unset
    pub openscad_path: Option<PathBuf>,
    /// Directory receiving `View<n>.scad` files
    pub view_dir: PathBuf,
    /// Directory holding rendered cached units
    pub cache_dir: PathBuf,
    /// Render each 3D cached unit once and import it on later runs
    pub use_disk_cache: bool,
    /// Limit for a single OpenSCAD run
    pub timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            openscad_path: None,
            view_dir: PathBuf::from("OpenSCAD"),
            cache_dir: std::env::temp_dir().join("polyframe-csg-cache"),
            use_disk_cache: false,
            timeout: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: EngineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `polyframe-csg.toml` if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if Path::new(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `OPENSCAD_PATH`, `POLYFRAME_CSG_VIEW_DIR`,
    /// `POLYFRAME_CSG_CACHE_DIR` and `POLYFRAME_CSG_DISK_CACHE`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(openscad) = lookup("OPENSCAD_PATH") {
            self.openscad_path = Some(PathBuf::from(openscad));
        }

        if let Some(view_dir) = lookup("POLYFRAME_CSG_VIEW_DIR") {
            self.view_dir = PathBuf::from(view_dir);
        }

        if let Some(cache_dir) = lookup("POLYFRAME_CSG_CACHE_DIR") {
            self.cache_dir = PathBuf::from(cache_dir);
        }

        if let Some(flag) = lookup("POLYFRAME_CSG_DISK_CACHE") {
            self.use_disk_cache = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Executable to run
    pub fn openscad(&self) -> &Path {
        self.openscad_path
            .as_deref()
            .unwrap_or_else(|| Path::new("openscad"))
    }

    pub fn with_disk_cache(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self.use_disk_cache = true;
        self
    }

    pub fn with_view_dir(mut self, view_dir: impl Into<PathBuf>) -> Self {
        self.view_dir = view_dir.into();
        self
    }
}
