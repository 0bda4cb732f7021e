use tokio::sync::watch;

/// One-shot stop flag owned by a room. Raising it again is a no-op.
#[derive(Debug)]
pub struct StopSignal(watch::Sender<bool>);

/// Listener side, one per background task.
#[derive(Debug, Clone)]
pub struct StopListener(watch::Receiver<bool>);

impl StopSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self(tx)
    }

    /// Returns `true` only for the call that actually flipped the flag.
    pub fn raise(&self) -> bool {
        !self.0.send_replace(true)
    }

    pub fn is_raised(&self) -> bool {
        *self.0.borrow()
    }

    pub fn listener(&self) -> StopListener {
        StopListener(self.0.subscribe())
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopListener {
    pub async fn stopped(&mut self) {
        while !*self.0.borrow_and_update() {
            if self.0.changed().await.is_err() {
                return;
            }
        }
    }

    pub fn is_stopped(&self) -> bool {
        *self.0.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn raise_is_idempotent() {
        let signal = StopSignal::new();
        assert!(!signal.is_raised());
        assert!(signal.raise());
        assert!(!signal.raise());
        assert!(signal.is_raised());
    }

    #[test]
    fn listener_created_after_raise_sees_stop() {
        let signal = StopSignal::new();
        signal.raise();
        assert!(signal.listener().is_stopped());
    }

    #[tokio::test]
    async fn stopped_resolves_after_raise() {
        let signal = StopSignal::new();
        let mut listener = signal.listener();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            signal.raise();
            signal.raise();
        });
        tokio::time::timeout(Duration::from_secs(1), listener.stopped())
            .await
            .expect("listener should observe the stop");
        assert!(listener.is_stopped());
    }
}
