//! Service layer separating file and encoding concerns from the editing core

pub mod format;
pub mod io;

pub use format::OutputFormatHandler;
pub use io::{ImageIOService, DEFAULT_DOWNLOAD_NAME};
