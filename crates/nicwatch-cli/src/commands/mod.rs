//! Command implementations.

pub mod list;
pub mod monitor;
pub mod simulate;
pub mod watch;

pub use list::run_list;
pub use monitor::run_monitor;
pub use simulate::run_simulate;
