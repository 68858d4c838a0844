//! Sandbox lifecycle state machine.
//!
//! `ensure()` drives the single shared instance through these states; every
//! operation re-checks health and falls back to `Uninitialized` if the
//! backing container has gone missing, forcing a re-`ensure()` on next use.

/// Lifecycle state of the single shared sandbox instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxState {
    Uninitialized,
    Starting,
    Ready,
    Degraded,
    Stopped,
}

impl SandboxState {
    pub fn is_ready(self) -> bool {
        matches!(self, SandboxState::Ready)
    }
}
