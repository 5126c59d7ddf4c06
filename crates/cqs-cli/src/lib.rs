//! Library half of the `cqs` binary: problem files, record sinks and the
//! backend registry, shared by the commands and the integration tests.

pub mod config;
pub mod record;

use cqs_adapter_sim::LocalSimulator;
use cqs_hal::BackendRegistry;

/// Name the local simulator is registered under.
pub const LOCAL_SIM: &str = "local-sim";

/// Registry of every backend compiled into the binary.
pub fn default_registry() -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    registry.register::<LocalSimulator>(LOCAL_SIM);
    registry.alias("simulator", LOCAL_SIM);
    registry.alias("sim", LOCAL_SIM);
    registry
}
