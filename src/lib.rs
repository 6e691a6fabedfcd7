pub mod config;
pub mod dump;
pub mod introspect;
pub mod memory;
pub mod target;
pub mod util;

#[macro_use]
extern crate log;
