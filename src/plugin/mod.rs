//! The plugin contract and its command line dispatcher.
//!
//! A plugin is a standalone executable for one kind of target (a database, a
//! file system, ...) or store (a blobstore). It implements [Plugin] and hands
//! itself to [run_main], which parses the command line, builds the [Endpoint]
//! and invokes exactly one verb. Errors are reported as a one-line message on
//! stderr and an exit code taken from [error].
//!
//! Backup payloads travel over the plugin's stdin/stdout and never through
//! the JSON channel.

pub mod context;
pub mod endpoint;
pub mod error;
pub mod exec;
pub mod shellwords;

use std::ffi::OsString;
use std::io::{self, Write};

use clap::{CommandFactory, FromArgMatches};
use serde::{Deserialize, Serialize};

pub use context::{Context, Verbosity};
pub use endpoint::Endpoint;
pub use error::PluginError;
pub use exec::{exec, exec_with_options, ExecOptions};

use crate::cli::{Cli, Verb};

/// Which roles a plugin fills. Values are `"yes"` or `"no"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginFeatures {
    pub target: String,
    pub store: String,
}

/// Static metadata a plugin reports about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    pub author: String,
    pub version: String,
    pub features: PluginFeatures,

    /// Example endpoint configuration shown by `--help`.
    #[serde(skip)]
    pub example: Option<String>,

    /// Description of endpoint defaults shown by `--help`.
    #[serde(skip)]
    pub defaults: Option<String>,
}

/// Capabilities every plugin provides.
///
/// The verbs a plugin does not support keep the default implementation,
/// which reports [PluginError::UnsupportedAction].
pub trait Plugin {
    /// Metadata of the plugin. Must not depend on any configuration.
    fn meta(&self) -> PluginInfo;

    /// Checks the endpoint without touching the target or store.
    fn validate(&self, _ctx: &Context, _endpoint: &Endpoint) -> Result<(), PluginError> {
        Err(PluginError::unsupported())
    }

    /// Writes a raw backup to stdout. Nothing else may be written to stdout.
    fn backup(&self, _ctx: &Context, _endpoint: &Endpoint) -> Result<(), PluginError> {
        Err(PluginError::unsupported())
    }

    /// Reads a raw backup from stdin and replays it against the target.
    fn restore(&self, _ctx: &Context, _endpoint: &Endpoint) -> Result<(), PluginError> {
        Err(PluginError::unsupported())
    }

    /// Persists an archive read from stdin and returns its storage key.
    fn store(&self, _ctx: &Context, _endpoint: &Endpoint) -> Result<String, PluginError> {
        Err(PluginError::unsupported())
    }

    /// Writes the archive stored under `key` to stdout.
    fn retrieve(
        &self,
        _ctx: &Context,
        _endpoint: &Endpoint,
        _key: &str,
    ) -> Result<(), PluginError> {
        Err(PluginError::unsupported())
    }

    /// Deletes the archive stored under `key`.
    fn purge(&self, _ctx: &Context, _endpoint: &Endpoint, _key: &str) -> Result<(), PluginError> {
        Err(PluginError::unsupported())
    }
}

/// Runs `plugin` with the process arguments and exits with the resulting code.
pub fn run_main<P: Plugin + ?Sized>(plugin: &P) -> ! {
    let code = run(plugin, std::env::args_os(), &mut io::stdout(), &mut io::stderr());
    std::process::exit(code)
}

/// Runs one plugin invocation and returns its exit code.
///
/// `args` includes the program name. Only JSON output (`info`, `store`,
/// `--version`, `--help`) goes to `stdout`; payload streams are handled by
/// the plugin on the real process stdio.
pub fn run<P, I, T>(plugin: &P, args: I, stdout: &mut dyn Write, stderr: &mut dyn Write) -> i32
where
    P: Plugin + ?Sized,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let info = plugin.meta();
    let mut command = command(&info);

    let cli = match command
        .try_get_matches_from_mut(args)
        .and_then(|matches| Cli::from_arg_matches(&matches))
    {
        Ok(cli) => cli,
        Err(e) if e.kind() == clap::error::ErrorKind::DisplayHelp => {
            return report(stdout, &e.render().to_string(), error::SUCCESS);
        }
        Err(e) => {
            let mut message = e.render().to_string();
            if !message.contains("Usage:") {
                message.push_str(&format!("\n{}\n", command.render_usage()));
            }
            return report(stderr, &message, error::USAGE);
        }
    };

    let ctx = Context::new(if cli.debug {
        Verbosity::Debug
    } else {
        Verbosity::Normal
    });
    ctx.init_logger();

    if cli.version {
        let line = format!("{} v{} - {}\n", info.name, info.version, info.author);
        return report(stdout, &line, error::SUCCESS);
    }

    let result = match cli.verb {
        Some(verb) => {
            ctx.debug("plugin::dispatch", format_args!("Executing '{verb}' action"));
            dispatch(plugin, &ctx, verb, &cli, stdout).map_err(|e| fill_action(e, verb))
        }
        None => Err(PluginError::Usage("No action specified".to_string())),
    };

    let code = error::exit_code_for(&result);
    if let Err(e) = result {
        let mut message = format!("{e}\n");
        if matches!(e, PluginError::Usage(_)) {
            message.push_str(&format!("{}\n", command.render_usage()));
        }
        report(stderr, &message, code);
    }
    code
}

fn command(info: &PluginInfo) -> clap::Command {
    let mut after_help = String::new();
    if let Some(example) = &info.example {
        after_help.push_str(&format!("Example endpoint:\n{}\n", example.trim_end()));
    }
    if let Some(defaults) = &info.defaults {
        if !after_help.is_empty() {
            after_help.push('\n');
        }
        after_help.push_str(&format!("Defaults:\n{}\n", defaults.trim_end()));
    }

    let mut command = Cli::command()
        .name(info.name.clone())
        .about(format!("{} v{} - {}", info.name, info.version, info.author));
    if !after_help.is_empty() {
        command = command.after_help(after_help);
    }
    command
}

fn dispatch<P: Plugin + ?Sized>(
    plugin: &P,
    ctx: &Context,
    verb: Verb,
    cli: &Cli,
    stdout: &mut dyn Write,
) -> Result<(), PluginError> {
    let endpoint = || -> Result<Endpoint, PluginError> {
        let endpoint = Endpoint::parse(cli.endpoint.as_deref().unwrap_or_default())?;
        ctx.debug(
            "plugin::dispatch",
            format_args!("Endpoint keys: {:?}", endpoint.keys().collect::<Vec<_>>()),
        );
        Ok(endpoint)
    };

    match verb {
        Verb::Info => {
            let json = serde_json::to_string_pretty(&plugin.meta())?;
            writeln!(stdout, "{json}")?;
            Ok(())
        }
        Verb::Validate => plugin.validate(ctx, &endpoint()?),
        Verb::Backup => plugin.backup(ctx, &endpoint()?),
        Verb::Restore => plugin.restore(ctx, &endpoint()?),
        Verb::Store => {
            let key = plugin.store(ctx, &endpoint()?)?;
            writeln!(stdout, "{{\"key\": {}}}", serde_json::to_string(&key)?)?;
            Ok(())
        }
        Verb::Retrieve => {
            let endpoint = endpoint()?;
            plugin.retrieve(ctx, &endpoint, storage_key(cli)?)
        }
        Verb::Purge => {
            let endpoint = endpoint()?;
            plugin.purge(ctx, &endpoint, storage_key(cli)?)
        }
    }
}

fn storage_key(cli: &Cli) -> Result<&str, PluginError> {
    match cli.key.as_deref() {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(PluginError::MissingRestoreKey),
    }
}

fn fill_action(err: PluginError, verb: Verb) -> PluginError {
    match err {
        PluginError::UnsupportedAction { action } if action.is_empty() => {
            PluginError::UnsupportedAction {
                action: verb.to_string(),
            }
        }
        other => other,
    }
}

fn report(out: &mut dyn Write, message: &str, code: i32) -> i32 {
    if out.write_all(message.as_bytes()).and_then(|()| out.flush()).is_err() {
        log::warn!(target: "plugin::dispatch", "Unable to write to the console");
    }
    code
}
