//! Value objects shared by every protocol message.

pub mod error;
pub mod vaan;
pub mod vasp_code;
pub mod vasp_info;

pub use error::EntityError;
pub use vaan::{checksum8_modulo256, VirtualAssetsAccountNumber};
pub use vasp_code::VaspCode;
pub use vasp_info::{PostalAddress, VaspInformation};
