// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracing subscriber setup.

use sift_server_config::{LogFormat, LoggingConfig};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directive used when `RUST_LOG` is unset.
pub fn default_directive(config: &LoggingConfig) -> String {
	format!("sift={}", config.level)
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
///
/// # Errors
/// Fails if a global subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TryInitError> {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(default_directive(config)));
	let registry = tracing_subscriber::registry().with(filter);

	match config.format {
		LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
		LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
		LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
	}
}
