//! Attack orchestration for dstar-rs
//!
//! Wires [`DhcpAction`](dstar_dhcp::DhcpAction) implementations to a network
//! interface: a raw socket for the send path, a receive loop for replies, and
//! an executor that runs the whole thing as a tracked tokio task.

pub mod config;
pub mod executor;
pub mod listener;
pub mod runner;
pub mod socket;

pub use config::StarvationConfig;
pub use executor::{stop_and_wait, wait_for_attack, AttackExecutor};
pub use listener::{run_receive_loop, Dispatcher, FrameSource};
pub use runner::ActionRunner;
pub use socket::{FrameSink, RawDhcpSocket};
