mod constants;
mod dump_progress;
mod logging;

pub use self::constants::*;
pub use self::dump_progress::DumpProgress;
pub use self::logging::init_logging_with_progress;
