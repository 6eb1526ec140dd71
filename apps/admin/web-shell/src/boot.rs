/// Where the shell is in its boot sequence, as seen by script callers of `AdminTabs`.
#[derive(Debug)]
pub enum BootSlot<T> {
    /// `open` calls made before the containers exist, replayed in order after boot.
    Pending(Vec<(String, String)>),
    Ready(T),
    /// Mount failed. Nothing is queued from here on.
    Failed,
}

/// What happened to an `open` call that arrived before the shell was ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EarlyOpen {
    Queued,
    /// The shell will never boot, so the caller should fall back to plain navigation.
    BootFailed,
}

impl<T> Default for BootSlot<T> {
    fn default() -> Self {
        Self::Pending(Vec::new())
    }
}

impl<T> BootSlot<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(shell) => Some(shell),
            Self::Pending(_) | Self::Failed => None,
        }
    }

    /// Records an `open` made while the shell is not ready.
    pub fn defer_open(&mut self, href: String, label: String) -> EarlyOpen {
        match self {
            Self::Pending(queued) => {
                queued.push((href, label));
                EarlyOpen::Queued
            }
            Self::Ready(_) | Self::Failed => EarlyOpen::BootFailed,
        }
    }

    /// Installs the mounted shell and hands back the queued opens for replay.
    pub fn mark_ready(&mut self, shell: T) -> Vec<(String, String)> {
        match std::mem::replace(self, Self::Ready(shell)) {
            Self::Pending(queued) => queued,
            Self::Ready(_) | Self::Failed => Vec::new(),
        }
    }

    /// Drops the queue and returns how many opens were discarded.
    pub fn mark_failed(&mut self) -> usize {
        match std::mem::replace(self, Self::Failed) {
            Self::Pending(queued) => queued.len(),
            Self::Ready(_) | Self::Failed => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_opens_replay_in_order_once_ready() {
        let mut slot = BootSlot::<&str>::default();
        assert_eq!(
            slot.defer_open("/pages/admin/produtos".into(), "Produtos".into()),
            EarlyOpen::Queued
        );
        assert_eq!(
            slot.defer_open("/pages/admin/icms".into(), String::new()),
            EarlyOpen::Queued
        );
        assert!(slot.ready().is_none());

        let replay = slot.mark_ready("shell");
        assert_eq!(
            replay,
            vec![
                ("/pages/admin/produtos".to_string(), "Produtos".to_string()),
                ("/pages/admin/icms".to_string(), String::new()),
            ]
        );
        assert_eq!(slot.ready(), Some(&"shell"));
    }

    #[test]
    fn failed_boot_drops_the_queue_and_stops_queueing() {
        let mut slot = BootSlot::<&str>::default();
        slot.defer_open("/pages/admin/produtos".into(), "Produtos".into());
        slot.defer_open("/pages/admin/icms".into(), "ICMS".into());

        assert_eq!(slot.mark_failed(), 2);
        assert!(matches!(slot, BootSlot::Failed));

        for _ in 0..100 {
            assert_eq!(
                slot.defer_open("/pages/admin/produtos".into(), String::new()),
                EarlyOpen::BootFailed
            );
        }
        assert!(matches!(slot, BootSlot::Failed));
        assert!(slot.ready().is_none());
        assert_eq!(slot.mark_failed(), 0);
    }
}
