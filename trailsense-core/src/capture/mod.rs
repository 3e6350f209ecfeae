//! Capture Loop (CL), Ring Buffer (RB), and Worker Pool (WP): spec §4.2,
//! §4.4, §5.

mod driver;
mod ring;
mod worker;

pub use driver::{open, run};
