use std::time::Instant;

use crate::dom::{NodeId, Page};

/// A cancellable subscription to DOM mutations under `scope` (the whole
/// document when `None`), optionally bounded by a deadline.
///
/// The owner feeds it mutation targets and the current time; once
/// disconnected it observes nothing.
#[derive(Debug, Clone)]
pub struct Watch {
    scope: Option<NodeId>,
    deadline: Option<Instant>,
    connected: bool,
}

impl Watch {
    pub fn document(deadline: Instant) -> Self {
        Self {
            scope: None,
            deadline: Some(deadline),
            connected: true,
        }
    }

    pub fn subtree(scope: NodeId) -> Self {
        Self {
            scope: Some(scope),
            deadline: None,
            connected: true,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Whether any of `targets` falls inside the observed subtree.
    pub fn observes(&self, page: &dyn Page, targets: &[NodeId]) -> bool {
        if !self.connected || targets.is_empty() {
            return false;
        }
        match self.scope {
            None => true,
            Some(scope) => targets.iter().any(|&target| page.contains(scope, target)),
        }
    }

    pub fn expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    pub fn disconnect(&mut self) {
        self.connected = false;
    }
}
