pub mod handler;
mod msg_edit_handler;
mod msg_join_handler;
mod msg_leave_handler;
mod msg_ping_handler;

pub use handler::websocket_handler;
