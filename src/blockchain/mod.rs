//! On-chain VASP registry lookups.

pub mod error;
pub mod registry;

pub use error::RegistryError;
pub use registry::{StaticRegistry, VaspContractInfo, VaspRegistry};
