use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

/// Deduplicates concurrent cache misses for the same fingerprint within one
/// process: the first caller to arrive for a key becomes the leader and
/// evaluates; later callers for the same key await the leader's result
/// instead of re-evaluating (§4.4 "single-flight"). Generic over the
/// evaluation result type so the decision service can carry its own
/// `degraded` flag alongside the cacheable decision.
#[derive(Clone)]
pub struct SingleFlightGroup<T: Clone + Send + 'static> {
    in_flight: Arc<Mutex<HashMap<String, broadcast::Sender<T>>>>,
}

impl<T: Clone + Send + 'static> Default for SingleFlightGroup<T> {
    fn default() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// What a caller should do for a given key.
pub enum FlightRole<T: Clone + Send + 'static> {
    /// No evaluation is in flight for this key; the caller must evaluate
    /// and call [`SingleFlightGroup::finish`] when done.
    Leader,
    /// Another caller is already evaluating this key; await its result.
    Follower(broadcast::Receiver<T>),
}

impl<T: Clone + Send + 'static> SingleFlightGroup<T> {
    /// Joins the flight for `key`, returning whether the caller leads or
    /// follows.
    #[must_use]
    pub fn join(&self, key: &str) -> FlightRole<T> {
        let mut in_flight = self.in_flight.lock();
        if let Some(sender) = in_flight.get(key) {
            return FlightRole::Follower(sender.subscribe());
        }
        let (sender, _receiver) = broadcast::channel(1);
        in_flight.insert(key.to_owned(), sender);
        FlightRole::Leader
    }

    /// Called by the leader once evaluation completes: broadcasts the
    /// result to any followers and clears the in-flight entry.
    pub fn finish(&self, key: &str, value: T) {
        let sender = self.in_flight.lock().remove(key);
        if let Some(sender) = sender {
            let _ = sender.send(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_joiner_for_same_key_follows_instead_of_leading() {
        let group: SingleFlightGroup<u32> = SingleFlightGroup::default();
        assert!(matches!(group.join("k1"), FlightRole::Leader));

        let follower = group.join("k1");
        let FlightRole::Follower(mut receiver) = follower else {
            panic!("expected follower role for second joiner");
        };

        group.finish("k1", 42);
        let received = receiver.recv().await.unwrap_or_else(|_| unreachable!());
        assert_eq!(received, 42);
    }

    #[tokio::test]
    async fn a_new_join_after_finish_leads_again() {
        let group: SingleFlightGroup<u32> = SingleFlightGroup::default();
        assert!(matches!(group.join("k1"), FlightRole::Leader));
        group.finish("k1", 1);
        assert!(matches!(group.join("k1"), FlightRole::Leader));
    }
}
