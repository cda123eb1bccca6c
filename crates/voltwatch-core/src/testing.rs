// ── Shared test doubles ──

use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::CoreError;
use crate::events::Notifier;
use crate::model::SubscriberId;

/// Notifier that records every send and can be told to fail for
/// specific subscribers.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    sent: Mutex<Vec<(SubscriberId, String)>>,
    failing: Mutex<BTreeSet<SubscriberId>>,
}

impl RecordingNotifier {
    pub(crate) fn sent(&self) -> Vec<(SubscriberId, String)> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn fail_for(&self, id: SubscriberId) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: SubscriberId, text: &str) -> Result<(), CoreError> {
        if self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&to)
        {
            return Err(CoreError::DeliveryFailed {
                subscriber: to,
                reason: "simulated transport failure".into(),
            });
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((to, text.to_owned()));
        Ok(())
    }
}
