//! Outbound side of the executor: the scheduling center client and the
//! registration heartbeat.

mod client;
pub use client::AdminClient;

mod tasks;
pub use tasks::Registrar;

mod config;
pub use config::DiscoverConfig;

mod errors;
pub use errors::DiscoverError;
