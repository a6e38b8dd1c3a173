use super::SerializedSubscription;

/// Holds the most recent browser subscription.
///
/// There is a single slot per process and it is not persisted, so every
/// restart forgets it. Clients pass their subscription along with each
/// send request to work around that.
#[derive(Debug, Default)]
pub struct SubscriptionStore {
    current: Option<SerializedSubscription>,
}

impl SubscriptionStore {
    /// Replace the stored subscription. Last writer wins.
    pub fn subscribe(&mut self, subscription: SerializedSubscription) {
        tracing::info!(
            "Storing push subscription for {}",
            subscription.short_endpoint()
        );
        self.current = Some(subscription);
    }

    pub fn unsubscribe(&mut self) -> Option<SerializedSubscription> {
        self.current.take()
    }

    pub fn current(&self) -> Option<&SerializedSubscription> {
        self.current.as_ref()
    }

    /// The explicit subscription if one was given, the stored one
    /// otherwise.
    pub fn resolve(
        &self,
        explicit: Option<SerializedSubscription>,
    ) -> Option<SerializedSubscription> {
        explicit.or_else(|| self.current.clone())
    }
}
