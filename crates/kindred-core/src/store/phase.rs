use parking_lot::RwLock;
use std::sync::Arc;

use crate::models::{AppPhase, Notification, NotificationType};

/// Kinds that only make sense during public discovery.
pub fn is_phase_restricted(kind: &NotificationType) -> bool {
    matches!(kind, NotificationType::CrossedPaths | NotificationType::Nearby)
}

/// Shared handle to the current application phase.
///
/// The intake pipeline and every feed hold a clone, so a phase change is
/// seen by the next emit and the next view recomputation alike.
#[derive(Clone, Debug, Default)]
pub struct PhaseGate {
    phase: Arc<RwLock<AppPhase>>,
}

impl PhaseGate {
    pub fn new(phase: AppPhase) -> Self {
        Self {
            phase: Arc::new(RwLock::new(phase)),
        }
    }

    pub fn current(&self) -> AppPhase {
        *self.phase.read()
    }

    pub fn set(&self, phase: AppPhase) {
        let mut current = self.phase.write();
        if *current != phase {
            tracing::debug!("phase: {} -> {}", current.label(), phase.label());
            *current = phase;
        }
    }

    /// Whether `kind` may be created or shown right now
    pub fn allows(&self, kind: &NotificationType) -> bool {
        !(self.current().is_restricted() && is_phase_restricted(kind))
    }

    /// Read-path filter: drops entries hidden by the current phase
    pub fn filter(&self, entries: Vec<Notification>) -> Vec<Notification> {
        if !self.current().is_restricted() {
            return entries;
        }
        entries
            .into_iter()
            .filter(|n| !is_phase_restricted(&n.kind))
            .collect()
    }
}
