//! Plugins bundled with SHIELD.
//!
//! Currently the following plugins are implemented:
//!
//! - [Fs]: Archive of a directory tree using `tar` (target).
//! - [MySql]: Dump of MySQL/MariaDB databases using `mysqldump` (target).
//! - [Local]: Archives kept as files on a local file system (store).
//!
//! Each one is shipped as its own binary which hands the plugin to
//! [run_main](crate::plugin::run_main).

pub mod fs;
pub mod local;
pub mod mysql;

pub use fs::Fs;
pub use local::Local;
pub use mysql::MySql;
