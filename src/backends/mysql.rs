//! Implements backup of MySQL and MariaDB databases using [MySql].

use crate::plugin::shellwords::quote;
use crate::plugin::{exec, Context, Endpoint, Plugin, PluginError, PluginFeatures, PluginInfo};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "3306";
const DEFAULT_BINDIR: &str = "/usr/bin";

/// Target plugin dumping databases with `mysqldump` and replaying them with `mysql`.
pub struct MySql;

/// Connection settings read from the endpoint.
#[derive(Debug, Clone, PartialEq)]
struct MySqlEndpoint {
    user: String,
    password: String,
    host: String,
    port: String,
    /// All databases are dumped when `None`.
    database: Option<String>,
    /// Extra flags passed verbatim to `mysqldump`.
    options: String,
    bindir: String,
}

impl MySqlEndpoint {
    fn from_endpoint(endpoint: &Endpoint) -> Result<Self, PluginError> {
        let database = match endpoint.string_value("mysql_database") {
            Ok(database) if !database.is_empty() => Some(database),
            Ok(_) => None,
            Err(e) if e.is_missing_key() => None,
            Err(e) => return Err(e),
        };

        Ok(Self {
            user: endpoint.string_value("mysql_user")?,
            password: endpoint.string_value("mysql_password")?,
            host: endpoint.string_value_default("mysql_host", DEFAULT_HOST)?,
            port: endpoint.string_value_default("mysql_port", DEFAULT_PORT)?,
            database,
            options: endpoint.string_value_default("mysql_options", "")?,
            bindir: endpoint.string_value_default("mysql_bindir", DEFAULT_BINDIR)?,
        })
    }

    fn binary(&self, name: &str) -> String {
        quote(&format!("{}/{name}", self.bindir.trim_end_matches('/')))
    }

    fn connection_flags(&self) -> String {
        format!(
            "-h {} -P {} -u {} {}",
            quote(&self.host),
            quote(&self.port),
            quote(&self.user),
            quote(&format!("--password={}", self.password)),
        )
    }

    fn dump_command(&self) -> String {
        let databases = match &self.database {
            Some(database) => quote(database),
            None => "--all-databases".to_string(),
        };

        let mut cmd = self.binary("mysqldump");
        if !self.options.trim().is_empty() {
            cmd.push(' ');
            cmd.push_str(self.options.trim());
        }
        cmd.push_str(&format!(" {} {databases}", self.connection_flags()));
        cmd
    }

    fn restore_command(&self) -> String {
        let mut cmd = format!("{} {}", self.binary("mysql"), self.connection_flags());
        if let Some(database) = &self.database {
            cmd.push(' ');
            cmd.push_str(&quote(database));
        }
        cmd
    }
}

impl Plugin for MySql {
    fn meta(&self) -> PluginInfo {
        PluginInfo {
            name: "MySQL Backup Plugin".to_string(),
            author: "SHIELD Core Team".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            features: PluginFeatures {
                target: "yes".to_string(),
                store: "no".to_string(),
            },
            example: Some(
                r#"{
  "mysql_user":     "username-for-mysql",   # REQUIRED
  "mysql_password": "password-for-above",   # REQUIRED
  "mysql_host":     "10.0.0.1",             # IP address of mysql server
  "mysql_port":     "3306",                 # Port that mysql is listening on
  "mysql_database": "db",                   # Limit backup/restore to one database
  "mysql_options":  "--single-transaction", # Extra flags for mysqldump
  "mysql_bindir":   "/usr/bin"              # Where to find mysqldump and mysql
}"#
                .to_string(),
            ),
            defaults: Some(
                r#"{
  "mysql_host":   "127.0.0.1",
  "mysql_port":   "3306",
  "mysql_bindir": "/usr/bin"
}"#
                .to_string(),
            ),
        }
    }

    fn validate(&self, ctx: &Context, endpoint: &Endpoint) -> Result<(), PluginError> {
        let checks = [
            ("mysql_user", endpoint.string_value("mysql_user")),
            (
                "mysql_password",
                endpoint
                    .string_value("mysql_password")
                    .map(|_| "<redacted>".to_string()),
            ),
            ("mysql_host", endpoint.string_value_default("mysql_host", DEFAULT_HOST)),
            ("mysql_port", endpoint.string_value_default("mysql_port", DEFAULT_PORT)),
            ("mysql_database", endpoint.string_value_default("mysql_database", "")),
            ("mysql_options", endpoint.string_value_default("mysql_options", "")),
            ("mysql_bindir", endpoint.string_value_default("mysql_bindir", DEFAULT_BINDIR)),
        ];

        let mut first_error = None;
        for (key, check) in checks {
            match check {
                Ok(value) => {
                    ctx.debug("backend::mysql", format_args!("{key}: '{value}'"));
                }
                Err(e) => {
                    ctx.debug("backend::mysql", format_args!("{key}: {e}"));
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn backup(&self, ctx: &Context, endpoint: &Endpoint) -> Result<(), PluginError> {
        let mysql = MySqlEndpoint::from_endpoint(endpoint)?;
        log::info!(
            target: "backend::mysql",
            "Create database dump of {} on {}:{}",
            mysql.database.as_deref().unwrap_or("all databases"),
            mysql.host,
            mysql.port
        );

        exec(ctx, &mysql.dump_command())?;
        log::info!(target: "backend::mysql", "Finished database dump");
        Ok(())
    }

    fn restore(&self, ctx: &Context, endpoint: &Endpoint) -> Result<(), PluginError> {
        let mysql = MySqlEndpoint::from_endpoint(endpoint)?;
        log::info!(
            target: "backend::mysql",
            "Replay database dump on {}:{}",
            mysql.host,
            mysql.port
        );

        exec(ctx, &mysql.restore_command())?;
        log::info!(target: "backend::mysql", "Finished database restore");
        Ok(())
    }
}
