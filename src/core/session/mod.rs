//! Post-handshake session state.

mod beneficiary;
mod callbacks;
mod error;
mod info;
mod poller;

pub use beneficiary::BeneficiarySession;
pub use callbacks::BeneficiaryCallbacks;
pub use error::SessionError;
pub use info::BeneficiarySessionInfo;
pub use poller::SessionPoller;
