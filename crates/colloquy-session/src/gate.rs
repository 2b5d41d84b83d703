use tokio::sync::watch;

/// Level-triggered pause flag shared by the turn loop and control requests.
///
/// Checkpoints wait while the flag is set; clearing it wakes every waiter
/// at once. Setting or clearing an already-set state is a no-op.
#[derive(Debug)]
pub struct PauseGate {
    paused: watch::Sender<bool>,
}

impl PauseGate {
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self { paused }
    }

    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    /// Resolve immediately when open, otherwise once the gate is resumed.
    pub async fn wait_open(&self) {
        let mut rx = self.paused.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|paused| !*paused).await;
    }
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_open_gate_does_not_block() {
        let gate = PauseGate::new();
        assert!(!gate.is_paused());
        tokio::time::timeout(Duration::from_millis(50), gate.wait_open())
            .await
            .unwrap_or_else(|_| panic!("open gate blocked"));
    }

    #[tokio::test]
    async fn test_pause_is_idempotent() {
        let gate = PauseGate::new();
        gate.pause();
        gate.pause();
        assert!(gate.is_paused());
        gate.resume();
        assert!(!gate.is_paused());
        gate.resume();
        assert!(!gate.is_paused());
    }

    #[tokio::test]
    async fn test_resume_releases_all_waiters() {
        let gate = Arc::new(PauseGate::new());
        gate.pause();

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let gate = gate.clone();
                tokio::spawn(async move { gate.wait_open().await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(waiters.iter().all(|w| !w.is_finished()));

        gate.resume();
        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .unwrap_or_else(|_| panic!("waiter not released"))
                .unwrap_or_else(|e| panic!("waiter panicked: {e}"));
        }
    }
}
