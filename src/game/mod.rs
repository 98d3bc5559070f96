pub mod core;
pub mod lobby;
pub mod messages;
pub mod ws;
mod ws_handler;

pub use ws_handler::handle_connection;
