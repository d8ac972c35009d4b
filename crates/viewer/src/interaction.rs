//! Pointer and keyboard handling, independent of any engine.

use foundation::bounds::LngLat;
use foundation::ids::FeatureId;
use layers::trails::TrailSource;

use crate::engine::RenderedFeature;
use crate::trail::TrailSummary;

pub const CLICK_EASE_ZOOM: f64 = 10.0;
pub const CLICK_EASE_DURATION_MS: u32 = 800;
pub const POINTER_CURSOR: &str = "pointer";

/// Which feature each hover layer currently outlines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoverState {
    pub ways: Option<FeatureId>,
    pub routes: Option<FeatureId>,
}

impl HoverState {
    pub fn get(&self, source: TrailSource) -> Option<&FeatureId> {
        match source {
            TrailSource::Ways => self.ways.as_ref(),
            TrailSource::Routes => self.routes.as_ref(),
        }
    }

    pub fn slot(&mut self, source: TrailSource) -> &mut Option<FeatureId> {
        match source {
            TrailSource::Ways => &mut self.ways,
            TrailSource::Routes => &mut self.routes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ways.is_none() && self.routes.is_none()
    }

    /// Hover target for the topmost feature under the pointer. Only one
    /// layer is outlined at a time.
    pub fn from_features(features: &[RenderedFeature]) -> Self {
        let Some(f) = features.first() else {
            return Self::default();
        };
        let Some(id) = f.feature_id() else {
            return Self::default();
        };
        let mut out = Self::default();
        *out.slot(TrailSource::from_layer_id(&f.layer_id)) = Some(id);
        out
    }
}

/// Result of a click on the trail layers.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Off-trail, or the feature has no id.
    Clear,
    Select {
        summary: TrailSummary,
        /// Center of the clicked geometry's extent.
        ease_to: Option<LngLat>,
    },
}

pub fn click_outcome(features: &[RenderedFeature]) -> ClickOutcome {
    let Some(f) = features.first() else {
        return ClickOutcome::Clear;
    };
    match TrailSummary::from_rendered(f) {
        Some(summary) => ClickOutcome::Select {
            summary,
            ease_to: f.bounds().map(|b| b.center()),
        },
        None => ClickOutcome::Clear,
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KeyIntent {
    ClearSelection,
}

pub fn key_intent(key: &str) -> Option<KeyIntent> {
    (key == "Escape").then_some(KeyIntent::ClearSelection)
}
