//! Replay-last observable values

use tokio::sync::watch;

/// A value that notifies subscribers on every publish.
///
/// New subscribers see the latest value immediately. Slow subscribers only
/// observe the most recent value, never a reordered one.
#[derive(Debug)]
pub struct Observable<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> Observable<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Replace the value and wake every subscriber, even if it is unchanged
    pub fn publish(&self, value: T) {
        // send_replace succeeds with zero receivers attached
        self.tx.send_replace(value);
    }

    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Attach a subscriber; the current value is readable right away
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn late_subscriber_sees_last_value() {
        let value = Observable::new(1u64);
        value.publish(2);
        value.publish(3);

        let rx = value.subscribe();
        assert_eq!(*rx.borrow(), 3);
        assert_eq!(value.get(), 3);
    }

    #[tokio::test]
    async fn republishing_same_value_notifies() {
        let value = Observable::new(5u64);
        let mut rx = value.subscribe();

        value.publish(5);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 5);
    }

    #[test]
    fn subscribers_can_detach() {
        let value = Observable::new("idle");
        let rx = value.subscribe();
        assert_eq!(value.subscriber_count(), 1);
        drop(rx);
        assert_eq!(value.subscriber_count(), 0);
        value.publish("running");
        assert_eq!(value.get(), "running");
    }
}
