//! Client library for the sextillion cluster API
//!
//! The API client, the cluster lifecycle orchestrator and the config and
//! session operations used by the `sxtln` CLI. Nothing in here terminates
//! the process; every failure comes back as an [`Error`].

pub mod api;
pub mod auth;
pub mod cluster;
pub mod config;
pub mod error;
pub mod transport;
pub mod value;

pub use api::{Api, ApiClient, ApiResponse, Credentials};
pub use cluster::{ClusterService, CreateCluster, PollConfig, READY_STAGE};
pub use config::{Config, ConfigStore, OutputFormat};
pub use error::{Error, Result};
pub use transport::{TransportConfig, DEFAULT_BASE_URL};
pub use value::{Document, Value, RAW_BODY_KEY};
