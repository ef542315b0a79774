pub mod commands;
pub mod stream;

pub use commands::{execute, Reply};
pub use stream::{print_events, EventPrinter};
