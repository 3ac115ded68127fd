//! Implements storage of archives on a local (or mounted) file system using [Local].

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::Local as LocalTime;
use regex::Regex;

use crate::plugin::{Context, Endpoint, Plugin, PluginError, PluginFeatures, PluginInfo};

/// Keys look like `2024/05/17/2024-05-17-031500-123456789`.
static STORAGE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}/\d{2}/\d{2}/\d{4}-\d{2}-\d{2}-\d{6}-\d+$")
        .expect("storage key pattern should be a valid regex")
});

/// Store plugin keeping archives as files below `base_dir`.
pub struct Local;

impl Local {
    fn base_dir(endpoint: &Endpoint) -> Result<PathBuf, PluginError> {
        let base_dir = endpoint.string_value("base_dir")?;
        if base_dir.is_empty() {
            return Err(PluginError::Failure("base_dir must not be empty".to_string()));
        }
        Ok(PathBuf::from(base_dir))
    }

    fn generate_key() -> String {
        LocalTime::now()
            .format("%Y/%m/%d/%Y-%m-%d-%H%M%S-%f")
            .to_string()
    }

    /// Resolves `key` below `base_dir`, rejecting anything not generated by [Local].
    fn archive_path(base_dir: &Path, key: &str) -> Result<PathBuf, PluginError> {
        if !STORAGE_KEY.is_match(key) {
            return Err(PluginError::Failure(format!("Invalid storage key '{key}'")));
        }
        Ok(base_dir.join(key))
    }

    /// Streams `input` into a new archive and returns its key.
    fn store_from(
        ctx: &Context,
        base_dir: &Path,
        input: &mut impl Read,
    ) -> Result<String, PluginError> {
        let key = Self::generate_key();
        let path = Self::archive_path(base_dir, &key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        ctx.debug("backend::local", format_args!("Store archive at: {}", path.display()));
        let mut file = File::create_new(&path)?;
        let written = io::copy(input, &mut file).and_then(|written| {
            file.sync_all()?;
            Ok(written)
        });

        match written {
            Ok(bytes) => {
                log::info!(target: "backend::local", "Stored {bytes} bytes as {key}");
                Ok(key)
            }
            Err(e) => {
                if let Err(rm) = fs::remove_file(&path) {
                    log::warn!(
                        target: "backend::local",
                        "Unable to remove partial archive {}: {rm}",
                        path.display()
                    );
                }
                Err(e.into())
            }
        }
    }

    fn retrieve_to(
        ctx: &Context,
        base_dir: &Path,
        key: &str,
        output: &mut impl Write,
    ) -> Result<(), PluginError> {
        let path = Self::archive_path(base_dir, key)?;
        ctx.debug("backend::local", format_args!("Retrieve archive from: {}", path.display()));

        let mut file = File::open(&path)
            .map_err(|e| PluginError::Failure(format!("Unable to open archive '{key}': {e}")))?;
        io::copy(&mut file, output)?;
        output.flush()?;
        Ok(())
    }

    fn purge_key(ctx: &Context, base_dir: &Path, key: &str) -> Result<(), PluginError> {
        let path = Self::archive_path(base_dir, key)?;
        ctx.debug("backend::local", format_args!("Purge archive at: {}", path.display()));
        fs::remove_file(&path)
            .map_err(|e| PluginError::Failure(format!("Unable to purge archive '{key}': {e}")))?;
        log::info!(target: "backend::local", "Purged archive {key}");
        Ok(())
    }
}

impl Plugin for Local {
    fn meta(&self) -> PluginInfo {
        PluginInfo {
            name: "Local Storage Plugin".to_string(),
            author: "SHIELD Core Team".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            features: PluginFeatures {
                target: "no".to_string(),
                store: "yes".to_string(),
            },
            example: Some(
                r#"{
  "base_dir": "/var/lib/shield/archives"   # REQUIRED
}"#
                .to_string(),
            ),
            defaults: None,
        }
    }

    fn validate(&self, ctx: &Context, endpoint: &Endpoint) -> Result<(), PluginError> {
        let base_dir = Self::base_dir(endpoint)?;
        if base_dir.exists() && !base_dir.is_dir() {
            return Err(PluginError::Failure(format!(
                "base_dir {} is not a directory",
                base_dir.display()
            )));
        }
        ctx.debug("backend::local", format_args!("base_dir: {}", base_dir.display()));
        Ok(())
    }

    fn store(&self, ctx: &Context, endpoint: &Endpoint) -> Result<String, PluginError> {
        let base_dir = Self::base_dir(endpoint)?;
        Self::store_from(ctx, &base_dir, &mut io::stdin().lock())
    }

    fn retrieve(&self, ctx: &Context, endpoint: &Endpoint, key: &str) -> Result<(), PluginError> {
        let base_dir = Self::base_dir(endpoint)?;
        Self::retrieve_to(ctx, &base_dir, key, &mut io::stdout().lock())
    }

    fn purge(&self, ctx: &Context, endpoint: &Endpoint, key: &str) -> Result<(), PluginError> {
        let base_dir = Self::base_dir(endpoint)?;
        Self::purge_key(ctx, &base_dir, key)
    }
}
