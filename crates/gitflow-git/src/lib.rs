//! # gitflow-git
//!
//! Git plumbing for gitflow. Every repository interaction goes through a
//! [`CommandRunner`], which executes one `git` command line and reports its
//! captured output. [`GitCli`] is the process-backed runner; [`Inspector`]
//! layers read-only repository queries on top of any runner.

mod error;
mod inspector;
mod runner;
mod traits;

pub use error::{Error, Result};
pub use inspector::{Divergence, Inspector};
pub use runner::{GitCli, GitTool};
pub use traits::{CommandOutput, CommandRunner};
