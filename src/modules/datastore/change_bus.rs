use tokio::sync::broadcast;

/// Collections exposed by the data-access layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Reports,
    Users,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Reports, Collection::Users];

    /// Remote table name
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Reports => "reports",
            Collection::Users => "users",
        }
    }

    /// Local storage key
    pub fn storage_key(&self) -> &'static str {
        match self {
            Collection::Reports => "atm_reports_data",
            Collection::Users => "atm_users_data",
        }
    }

    /// Postgres notification channel raised by the collection triggers
    pub fn channel(&self) -> &'static str {
        match self {
            Collection::Reports => "atm_reports_changed",
            Collection::Users => "atm_users_changed",
        }
    }

    pub fn from_channel(channel: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.channel() == channel)
    }
}

/// In-process publish/subscribe channel for collection changes.
///
/// Every subscriber sees every publish, including the publisher's own writes.
#[derive(Debug, Clone)]
pub struct ChangeBus {
    tx: broadcast::Sender<Collection>,
}

impl ChangeBus {
    const CAPACITY: usize = 64;

    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(Self::CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, collection: Collection) {
        // No receivers is fine: nobody is watching yet
        let receivers = self.tx.send(collection).unwrap_or(0);
        tracing::trace!(
            "Published {} change to {} subscriber(s)",
            collection.name(),
            receivers
        );
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Collection> {
        self.tx.subscribe()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}
