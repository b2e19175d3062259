//! Remote host provisioning for the cointick poller.
//!
//! This crate provides:
//! - A fixed-shape provisioning config record persisted as JSON
//! - A static registry of named provisioning tasks with explicit
//!   prerequisites, executed in topologically sorted order
//! - A command-runner seam with an SSH implementation
//! - A DigitalOcean droplet client for creating and tearing down the host
//!
//! The poller itself never touches this crate; provisioning is an operator
//! workflow driven from the CLI.

pub mod config;
pub mod digitalocean;
pub mod error;
pub mod graph;
pub mod runner;
pub mod tasks;

pub use config::ProvisionConfig;
pub use digitalocean::{CreateDropletRequest, Droplet, DropletClient};
pub use error::ProvisionError;
pub use graph::TaskGraph;
pub use runner::{CommandRunner, Provisioner, SshRunner};
pub use tasks::Task;
