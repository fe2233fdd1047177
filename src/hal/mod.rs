//! Platform abstraction layer.
//!
//! Rust's ownership model and `tokio`'s `Mutex`/`RwLock`/`spawn` are already
//! the language-native replacement for a `memory`/`thread`/`sync` indirection
//! layer, so this crate does not introduce one. What's kept behind a trait is
//! the part that's genuinely worth swapping in tests or on a future
//! non-`tokio` host: wall/monotonic time and task spawning. `actix-web` is
//! called directly by the HTTP transport rather than through a HAL
//! indirection that would have no second implementation.

use std::future::Future;
use std::pin::Pin;
use std::time::{Instant, SystemTime};

/// Time source and task spawner, the only platform primitives this crate
/// treats as swappable.
pub trait Hal: Send + Sync + std::fmt::Debug {
    fn now(&self) -> SystemTime;
    fn monotonic_now(&self) -> Instant;
    fn spawn(&self, fut: Pin<Box<dyn Future<Output = ()> + Send>>);
}

/// Default `Hal` for hosted operating systems, backed directly by `tokio`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHal;

impl Hal for SystemHal {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    fn monotonic_now(&self) -> Instant {
        Instant::now()
    }

    fn spawn(&self, fut: Pin<Box<dyn Future<Output = ()> + Send>>) {
        tokio::spawn(fut);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn system_hal_spawns_and_reports_time() {
        let hal = SystemHal;
        let before = hal.monotonic_now();
        let (tx, rx) = tokio::sync::oneshot::channel();
        hal.spawn(Box::pin(async move {
            let _ = tx.send(());
        }));
        rx.await.unwrap();
        assert!(hal.monotonic_now() >= before);
        assert!(hal.now().elapsed().is_ok());
    }
}
