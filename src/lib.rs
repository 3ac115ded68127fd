//! Toolkit for writing SHIELD backup plugins.
//!
//! A plugin is a small executable that knows how to back up and restore one
//! kind of data system, or how to keep archives in one kind of storage. The
//! scheduler runs it with a verb and a JSON endpoint and reads the outcome
//! from its exit code. The contract lives in [`plugin`], the shared command
//! line in [`cli`] and the plugins shipped with this crate in [`backends`].

#![forbid(unsafe_code)]

pub mod backends;
pub mod cli;
pub mod plugin;
