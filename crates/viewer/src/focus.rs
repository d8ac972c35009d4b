//! Bounded wait for a searched feature to show up in the local tile cache.
//!
//! A pending focus owns two engine-event listeners (idle, source data) and
//! one timer. They are always retired together, whether the feature
//! resolves, the wait times out, a newer focus supersedes it, or the
//! selection is cleared.

use foundation::bounds::{LngLat, LngLatBounds};
use foundation::ids::FeatureId;
use foundation::time::Time;
use runtime::event_bus::{EventBus, ListenerId};
use runtime::timers::{TimerId, TimerQueue};
use search::TrailHit;

use crate::events::EngineEventKind;

pub const FOCUS_TIMEOUT_SECS: f64 = 7.0;
pub const FOCUS_PADDING_PX: f64 = 40.0;
pub const FOCUS_DURATION_MS: u32 = 800;
pub const FOCUS_MIN_ZOOM: f64 = 8.0;

/// Owner tag for adapter-registered listeners.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ListenerTag {
    Focus,
}

/// Where to move the camera for a search hit.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum CameraTarget {
    Fit(LngLatBounds),
    Fly { center: LngLat, zoom: f64 },
}

/// Bounding box first, then center, then midpoint.
pub fn camera_target(hit: &TrailHit, current_zoom: f64) -> Option<CameraTarget> {
    if let Some(b) = hit.bounds() {
        return Some(CameraTarget::Fit(b));
    }
    hit.anchor().map(|center| CameraTarget::Fly {
        center,
        zoom: current_zoom.max(FOCUS_MIN_ZOOM),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingFocus {
    pub id: FeatureId,
    pub listeners: [ListenerId; 2],
    pub timer: TimerId,
    pub deadline: Time,
}

#[derive(Debug, Default)]
pub struct FocusResolver {
    pending: Option<PendingFocus>,
}

impl FocusResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<&PendingFocus> {
        self.pending.as_ref()
    }

    pub fn owns_timer(&self, timer: TimerId) -> bool {
        self.pending.as_ref().is_some_and(|p| p.timer == timer)
    }

    /// Starts waiting for `id`. Any earlier wait is retired first and
    /// returned.
    pub fn begin(
        &mut self,
        id: FeatureId,
        now: Time,
        bus: &mut EventBus<EngineEventKind, ListenerTag>,
        timers: &mut TimerQueue,
    ) -> Option<PendingFocus> {
        let superseded = self.retire(bus, timers);
        let deadline = now.after(FOCUS_TIMEOUT_SECS);
        self.pending = Some(PendingFocus {
            id,
            listeners: [
                bus.listen(EngineEventKind::Idle, ListenerTag::Focus),
                bus.listen(EngineEventKind::SourceData, ListenerTag::Focus),
            ],
            timer: timers.schedule(deadline),
            deadline,
        });
        superseded
    }

    /// Clears the flag, both listeners and the timer in one step.
    pub fn retire(
        &mut self,
        bus: &mut EventBus<EngineEventKind, ListenerTag>,
        timers: &mut TimerQueue,
    ) -> Option<PendingFocus> {
        let pending = self.pending.take()?;
        for l in pending.listeners {
            bus.unlisten(l);
        }
        timers.cancel(pending.timer);
        Some(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn camera_target_priority() {
        let mut hit = TrailHit::new(1);
        hit.center = Some(json!([-73.0, 41.0]));
        hit.bbox = Some(vec![-74.1, 40.6, -73.9, 40.8]);
        assert!(matches!(camera_target(&hit, 3.0), Some(CameraTarget::Fit(_))));

        hit.bbox = None;
        assert_eq!(
            camera_target(&hit, 3.0),
            Some(CameraTarget::Fly { center: LngLat::new(-73.0, 41.0), zoom: 8.0 })
        );
        assert_eq!(
            camera_target(&hit, 11.5),
            Some(CameraTarget::Fly { center: LngLat::new(-73.0, 41.0), zoom: 11.5 })
        );
        hit.center = None;
        assert_eq!(camera_target(&hit, 3.0), None);
    }

    #[test]
    fn begin_and_retire_move_together() {
        let mut bus = EventBus::new();
        let mut timers = TimerQueue::new();
        let mut focus = FocusResolver::new();

        assert!(focus.begin(FeatureId::Number(1), Time(0.0), &mut bus, &mut timers).is_none());
        assert_eq!(bus.len(), 2);
        assert_eq!(timers.len(), 1);

        let old = focus
            .begin(FeatureId::Number(2), Time(1.0), &mut bus, &mut timers)
            .unwrap();
        assert_eq!(old.id, FeatureId::Number(1));
        assert!(!timers.is_armed(old.timer));
        assert_eq!(bus.len(), 2);
        assert_eq!(timers.len(), 1);
        assert_eq!(focus.pending().map(|p| p.deadline), Some(Time(8.0)));

        let p = focus.retire(&mut bus, &mut timers).unwrap();
        assert!(bus.is_empty());
        assert!(timers.is_empty());
        assert!(!focus.owns_timer(p.timer));
        assert!(focus.retire(&mut bus, &mut timers).is_none());
    }
}
