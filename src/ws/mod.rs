pub mod gateway;
pub mod registry;
mod relay;

pub use gateway::{ConnId, GatewayError, Outbox, SessionGateway};
