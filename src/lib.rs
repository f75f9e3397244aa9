#[macro_use]
extern crate tracing;
extern crate nix;
#[macro_use]
extern crate serde;
extern crate snafu;

#[macro_use]
pub mod core;
pub mod command;
pub mod config;
pub mod device;
pub mod iovec;
pub mod logger;
pub mod ops;
pub mod registry;
pub mod router;
pub mod scsi;
pub mod status;
