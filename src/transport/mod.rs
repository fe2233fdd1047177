//! Transport layer: stdio and HTTP bindings over the protocol engine.

pub mod http;
pub mod stdio;

use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TransportState {
    Stopped = 0,
    Starting = 1,
    Running = 2,
    Stopping = 3,
    Error = 4,
}

impl TransportState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => TransportState::Stopped,
            1 => TransportState::Starting,
            2 => TransportState::Running,
            3 => TransportState::Stopping,
            _ => TransportState::Error,
        }
    }
}

/// `Stopped -> Starting -> Running -> Stopping -> Stopped`, with `Error`
/// reachable from any state. `start` only moves out of `Stopped`; `stop` is
/// a no-op (not an error) from `Stopped`.
#[derive(Debug, Default)]
pub struct TransportStateMachine {
    state: AtomicU8,
}

impl TransportStateMachine {
    pub fn state(&self) -> TransportState {
        TransportState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set(&self, next: TransportState) {
        self.state.store(next as u8, Ordering::SeqCst);
    }

    pub fn begin_start(&self) -> bool {
        if self.state() == TransportState::Stopped {
            self.set(TransportState::Starting);
            true
        } else {
            false
        }
    }

    pub fn mark_running(&self) {
        self.set(TransportState::Running);
    }

    pub fn begin_stop(&self) -> bool {
        match self.state() {
            TransportState::Running => {
                self.set(TransportState::Stopping);
                true
            }
            TransportState::Stopped => false,
            _ => {
                self.set(TransportState::Stopping);
                true
            }
        }
    }

    pub fn mark_stopped(&self) {
        self.set(TransportState::Stopped);
    }

    pub fn mark_error(&self) {
        self.set(TransportState::Error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_is_idempotent_only_from_stopped() {
        let fsm = TransportStateMachine::default();
        assert!(fsm.begin_start());
        fsm.mark_running();
        assert!(!fsm.begin_start());
    }

    #[test]
    fn stop_from_stopped_is_a_noop_not_an_error() {
        let fsm = TransportStateMachine::default();
        assert!(!fsm.begin_stop());
        assert_eq!(fsm.state(), TransportState::Stopped);
    }
}
