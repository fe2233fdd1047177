//! Handshake state machine, tracked per connection.
//!
//! This is a separate state space from `session::SessionState` — a
//! connection negotiates the protocol (`Uninitialized` ... `Ready`) whether
//! or not a `Session` has been created for it yet.

use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandshakeState {
    Uninitialized = 0,
    Initializing = 1,
    Initialized = 2,
    Ready = 3,
    Error = 4,
    Shutdown = 5,
}

impl HandshakeState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => HandshakeState::Uninitialized,
            1 => HandshakeState::Initializing,
            2 => HandshakeState::Initialized,
            3 => HandshakeState::Ready,
            4 => HandshakeState::Error,
            _ => HandshakeState::Shutdown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeEvent {
    InitializeRequest,
    InitializeResponseSent,
    InitializedNotification,
    AnyMessage,
    FatalError,
    Shutdown,
}

/// Thread-safe handshake tracker; `transition` is a no-op (stays put) for
/// events not listed from the current state, e.g. a second
/// `InitializeResponseSent` while already `Initialized`.
#[derive(Debug)]
pub struct HandshakeMachine {
    state: AtomicU8,
}

impl Default for HandshakeMachine {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(HandshakeState::Uninitialized as u8),
        }
    }
}

impl HandshakeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> HandshakeState {
        HandshakeState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set(&self, next: HandshakeState) {
        self.state.store(next as u8, Ordering::SeqCst);
    }

    pub fn transition(&self, event: HandshakeEvent) {
        use HandshakeEvent::*;
        use HandshakeState::*;

        let current = self.state();
        let next = match (current, event) {
            (Shutdown, _) => Shutdown,
            (_, Shutdown) => Shutdown,
            (_, FatalError) => Error,
            (Uninitialized, InitializeRequest) => Initializing,
            (Error, InitializeRequest) => Initializing,
            (Initializing, InitializeResponseSent) => Initialized,
            (Initialized, InitializedNotification) => Ready,
            (Ready, AnyMessage) => Ready,
            (same, _) => same,
        };
        self.set(next);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ServerCapabilities {
    pub tools: bool,
    pub resources: bool,
    pub prompts: bool,
    pub logging: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClientCapabilities {
    pub roots: bool,
    pub sampling: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_reaches_ready() {
        let m = HandshakeMachine::new();
        assert_eq!(m.state(), HandshakeState::Uninitialized);
        m.transition(HandshakeEvent::InitializeRequest);
        assert_eq!(m.state(), HandshakeState::Initializing);
        m.transition(HandshakeEvent::InitializeResponseSent);
        assert_eq!(m.state(), HandshakeState::Initialized);
        m.transition(HandshakeEvent::InitializedNotification);
        assert_eq!(m.state(), HandshakeState::Ready);
        m.transition(HandshakeEvent::AnyMessage);
        assert_eq!(m.state(), HandshakeState::Ready);
    }

    #[test]
    fn error_can_reinitialize() {
        let m = HandshakeMachine::new();
        m.transition(HandshakeEvent::FatalError);
        assert_eq!(m.state(), HandshakeState::Error);
        m.transition(HandshakeEvent::InitializeRequest);
        assert_eq!(m.state(), HandshakeState::Initializing);
    }

    #[test]
    fn shutdown_is_terminal() {
        let m = HandshakeMachine::new();
        m.transition(HandshakeEvent::Shutdown);
        assert_eq!(m.state(), HandshakeState::Shutdown);
        m.transition(HandshakeEvent::InitializeRequest);
        assert_eq!(m.state(), HandshakeState::Shutdown);
    }
}
