#![deny(unsafe_code)]
//#![deny(warnings)]
#![deny(unused_must_use)]
#![deny(unexpected_cfgs)]

pub mod bootstrap;
pub mod config;
pub mod datasource;
pub mod domain;
pub mod logging;
pub mod metrics;
pub mod server;

pub use domain::{Collector, Producer};
pub use metrics::registry::{BusinessMetrics, GaugeDefinition};
