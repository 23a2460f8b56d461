pub mod format;
pub mod logging;
pub mod polling;
pub mod shutdown;
pub mod subprocess;
