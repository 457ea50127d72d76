// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Sift filter service.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`SIFT_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use sift_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("view is owner-only: {}", config.filters.view_owner_only);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
	pub filters: FiltersConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`SIFT_SERVER_*`)
/// 2. Config file (`/etc/sift/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	];
	load_from(sources)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	];
	load_from(sources)
}

/// Merges `sources` in precedence order and resolves the result.
pub fn load_from(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let database = layer.database.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let filters = layer.filters.unwrap_or_default().finalize()?;

	info!(
		database = %database.url,
		log_level = %logging.level,
		log_format = %logging.format,
		view_owner_only = filters.view_owner_only,
		change_owner_only = filters.change_owner_only,
		delete_owner_only = filters.delete_owner_only,
		object_grants = filters.object_grants,
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		database,
		logging,
		filters,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_file_overrides_defaults() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
[database]
url = "sqlite:/tmp/sift-test.db"

[filters]
view_owner_only = false
object_grants = true
"#
		)
		.unwrap();

		let sources: Vec<Box<dyn ConfigSource>> = vec![
			Box::new(TomlSource::new(file.path())),
			Box::new(DefaultsSource),
		];
		let config = load_from(sources).unwrap();
		assert_eq!(config.database.url, "sqlite:/tmp/sift-test.db");
		assert!(!config.filters.view_owner_only);
		assert!(config.filters.change_owner_only);
		assert!(config.filters.object_grants);
		assert_eq!(config.logging.format, LogFormat::Pretty);
	}

	#[test]
	fn test_invalid_order_by_fails_load() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[filters]\norder_by = [\"name\", \"size\"]").unwrap();
		let sources: Vec<Box<dyn ConfigSource>> = vec![Box::new(TomlSource::new(file.path()))];
		let err = load_from(sources).unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { .. }));
	}

	#[test]
	fn test_defaults_only() {
		let sources: Vec<Box<dyn ConfigSource>> = vec![Box::new(DefaultsSource)];
		let config = load_from(sources).unwrap();
		assert_eq!(config.database.url, "sqlite:./sift.db");
		assert_eq!(config.filters, FiltersConfig::default());
	}
}
