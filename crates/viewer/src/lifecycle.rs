//! Explicit lifecycle of the engine instance.
//!
//! ```text
//! Uninitialized --Mount--> Initializing --Loaded--> Ready
//! Ready --StyleRequested--> StyleSwapping --StyleLoaded--> Ready
//! StyleSwapping --StyleRequested--> StyleSwapping
//! any --Destroy--> Destroyed
//! ```

use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Ready,
    StyleSwapping,
    Destroyed,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Mount,
    Loaded,
    StyleRequested,
    StyleLoaded,
    Destroy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleError {
    pub from: LifecycleState,
    pub event: LifecycleEvent,
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal lifecycle transition: {:?} in {:?}", self.event, self.from)
    }
}

impl std::error::Error for LifecycleError {}

#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: LifecycleState,
    /// Incremented each time a style finishes loading.
    generation: u64,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Uninitialized,
            generation: 0,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_ready(&self) -> bool {
        self.state == LifecycleState::Ready
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == LifecycleState::Destroyed
    }

    pub fn apply(&mut self, event: LifecycleEvent) -> Result<LifecycleState, LifecycleError> {
        use LifecycleEvent as E;
        use LifecycleState as S;

        let next = match (self.state, event) {
            (_, E::Destroy) => S::Destroyed,
            (S::Uninitialized, E::Mount) => S::Initializing,
            (S::Initializing, E::Loaded) => S::Ready,
            (S::Ready | S::StyleSwapping, E::StyleRequested) => S::StyleSwapping,
            (S::StyleSwapping, E::StyleLoaded) => S::Ready,
            (from, event) => return Err(LifecycleError { from, event }),
        };
        if matches!(event, E::Loaded | E::StyleLoaded) {
            self.generation += 1;
        }
        if next != self.state {
            tracing::info!(from = ?self.state, to = ?next, generation = self.generation, "lifecycle");
        }
        self.state = next;
        Ok(next)
    }
}
