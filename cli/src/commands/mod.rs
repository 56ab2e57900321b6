pub mod config;
pub mod kill;
pub mod scan;
pub mod watch;
