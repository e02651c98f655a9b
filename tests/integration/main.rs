// tests/integration/main.rs
#[path = "../common/mod.rs"]
mod common;

mod dispatch_tests;
mod handshake_tests;
mod session_tests;
