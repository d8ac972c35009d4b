use crate::engine::ScreenPoint;

/// Engine notifications delivered by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// First style and resources loaded.
    Load,
    /// A style (initial or swapped) finished loading.
    StyleLoad,
    Idle,
    SourceData { source_id: Option<String> },
    Zoom,
    MoveEnd,
    ZoomEnd,
    RotateEnd,
    PitchEnd,
    MouseMove(ScreenPoint),
    /// The pointer left the named layer.
    MouseLeave { layer: String },
    Click(ScreenPoint),
    Error(String),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EngineEventKind {
    Load,
    StyleLoad,
    Idle,
    SourceData,
    Zoom,
    MoveEnd,
    ZoomEnd,
    RotateEnd,
    PitchEnd,
    MouseMove,
    MouseLeave,
    Click,
    Error,
}

impl EngineEventKind {
    /// Engine event names, as the engine's `on(...)` API spells them.
    pub fn name(self) -> &'static str {
        match self {
            EngineEventKind::Load => "load",
            EngineEventKind::StyleLoad => "style.load",
            EngineEventKind::Idle => "idle",
            EngineEventKind::SourceData => "sourcedata",
            EngineEventKind::Zoom => "zoom",
            EngineEventKind::MoveEnd => "moveend",
            EngineEventKind::ZoomEnd => "zoomend",
            EngineEventKind::RotateEnd => "rotateend",
            EngineEventKind::PitchEnd => "pitchend",
            EngineEventKind::MouseMove => "mousemove",
            EngineEventKind::MouseLeave => "mouseleave",
            EngineEventKind::Click => "click",
            EngineEventKind::Error => "error",
        }
    }
}

impl EngineEvent {
    pub fn kind(&self) -> EngineEventKind {
        match self {
            EngineEvent::Load => EngineEventKind::Load,
            EngineEvent::StyleLoad => EngineEventKind::StyleLoad,
            EngineEvent::Idle => EngineEventKind::Idle,
            EngineEvent::SourceData { .. } => EngineEventKind::SourceData,
            EngineEvent::Zoom => EngineEventKind::Zoom,
            EngineEvent::MoveEnd => EngineEventKind::MoveEnd,
            EngineEvent::ZoomEnd => EngineEventKind::ZoomEnd,
            EngineEvent::RotateEnd => EngineEventKind::RotateEnd,
            EngineEvent::PitchEnd => EngineEventKind::PitchEnd,
            EngineEvent::MouseMove(_) => EngineEventKind::MouseMove,
            EngineEvent::MouseLeave { .. } => EngineEventKind::MouseLeave,
            EngineEvent::Click(_) => EngineEventKind::Click,
            EngineEvent::Error(_) => EngineEventKind::Error,
        }
    }

    /// Camera gestures that end a movement and trigger persistence.
    pub fn is_camera_settle(&self) -> bool {
        matches!(
            self,
            EngineEvent::MoveEnd | EngineEvent::ZoomEnd | EngineEvent::RotateEnd | EngineEvent::PitchEnd
        )
    }
}
