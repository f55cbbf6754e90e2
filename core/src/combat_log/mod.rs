mod error;
mod log_line;
mod parser;
mod reader;

pub use error::ReaderError;
pub use log_line::*;
pub use parser::LogParser;
pub use reader::{Batch, HEADER_LINES, Reader, TAIL_WINDOW_BYTES, TAIL_WINDOW_LINES};
