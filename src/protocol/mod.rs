//! Wire codec, handshake FSM, and dispatch engine.

pub mod engine;
pub mod handshake;
pub mod jsonrpc;

pub use engine::{ConnectionHandle, ProtocolEngine};
pub use handshake::{ClientCapabilities, HandshakeEvent, HandshakeMachine, HandshakeState, ServerCapabilities};
pub use jsonrpc::Message;
