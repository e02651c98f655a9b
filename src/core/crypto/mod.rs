//! Key exchange and signing primitives for the session handshake.

pub mod ecdh;
pub mod error;
pub mod signing;

pub use ecdh::EcdhKey;
pub use error::CryptoError;
pub use signing::{signing_public_key, EcdsaSignService, SignService};
