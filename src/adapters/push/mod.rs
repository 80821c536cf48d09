//! Outbound notification adapters.

mod gateway;

pub use gateway::{NullDispatcher, PushGatewayDispatcher};
