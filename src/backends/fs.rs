//! Implements backup of a directory tree using [Fs].

use std::fs;

use crate::plugin::shellwords::quote;
use crate::plugin::{exec, Context, Endpoint, Plugin, PluginError, PluginFeatures, PluginInfo};

const DEFAULT_TAR: &str = "tar";

/// Target plugin archiving `base_dir` with `tar`.
///
/// The archive is written uncompressed to stdout on backup and read from
/// stdin on restore.
pub struct Fs;

#[derive(Debug, Clone, PartialEq)]
struct FsEndpoint {
    base_dir: String,
    exclude: Option<String>,
    tar: String,
}

impl FsEndpoint {
    fn from_endpoint(endpoint: &Endpoint) -> Result<Self, PluginError> {
        let base_dir = endpoint.string_value("base_dir")?;
        if base_dir.is_empty() {
            return Err(PluginError::Failure(
                "base_dir must not be empty".to_string(),
            ));
        }

        let exclude = Some(endpoint.string_value_default("exclude", "")?).filter(|e| !e.is_empty());
        let tar = endpoint.string_value_default("tar", DEFAULT_TAR)?;

        Ok(Self {
            base_dir,
            exclude,
            tar,
        })
    }

    fn backup_command(&self) -> String {
        let mut cmd = format!("{} -c -C {} -f -", quote(&self.tar), quote(&self.base_dir));
        if let Some(exclude) = &self.exclude {
            cmd.push_str(&format!(" --exclude {}", quote(exclude)));
        }
        cmd.push_str(" .");
        cmd
    }

    fn restore_command(&self) -> String {
        format!("{} -x -C {} -f -", quote(&self.tar), quote(&self.base_dir))
    }
}

impl Plugin for Fs {
    fn meta(&self) -> PluginInfo {
        PluginInfo {
            name: "Filesystem Backup Plugin".to_string(),
            author: "SHIELD Core Team".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            features: PluginFeatures {
                target: "yes".to_string(),
                store: "no".to_string(),
            },
            example: Some(
                r#"{
  "base_dir": "/path/to/backup",   # REQUIRED
  "exclude":  "*.tmp",             # Pattern of files to leave out
  "tar":      "/usr/bin/tar"       # tar binary to use
}"#
                .to_string(),
            ),
            defaults: Some(r#"{ "tar": "tar" }"#.to_string()),
        }
    }

    fn validate(&self, ctx: &Context, endpoint: &Endpoint) -> Result<(), PluginError> {
        let target = FsEndpoint::from_endpoint(endpoint)?;
        ctx.debug("backend::fs", format_args!("Validated endpoint: {target:?}"));
        Ok(())
    }

    fn backup(&self, ctx: &Context, endpoint: &Endpoint) -> Result<(), PluginError> {
        let target = FsEndpoint::from_endpoint(endpoint)?;
        log::info!(target: "backend::fs", "Create archive of {}", target.base_dir);

        exec(ctx, &target.backup_command())?;
        log::info!(target: "backend::fs", "Finished archive of {}", target.base_dir);
        Ok(())
    }

    fn restore(&self, ctx: &Context, endpoint: &Endpoint) -> Result<(), PluginError> {
        let target = FsEndpoint::from_endpoint(endpoint)?;
        log::info!(target: "backend::fs", "Restore archive into {}", target.base_dir);

        fs::create_dir_all(&target.base_dir)?;
        exec(ctx, &target.restore_command())?;
        log::info!(target: "backend::fs", "Finished restore into {}", target.base_dir);
        Ok(())
    }
}
