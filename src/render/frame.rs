use anyhow::Result;

use crate::error::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FramePhase {
    Uninitialized,
    DeviceReady,
    SurfaceConfigured,
    Rendering,
    Resizing,
    Terminated,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FrameEvent {
    DeviceAcquired,
    SurfaceConfigured,
    FrameStarted,
    ResizeRequested,
    ResizeCompleted,
    Shutdown,
}

impl FramePhase {
    pub fn transition(self, event: FrameEvent) -> Result<FramePhase> {
        let next = match (self, event) {
            (FramePhase::Terminated, _) => None,
            (_, FrameEvent::Shutdown) => Some(FramePhase::Terminated),
            (FramePhase::Uninitialized, FrameEvent::DeviceAcquired) => Some(FramePhase::DeviceReady),
            (FramePhase::DeviceReady, FrameEvent::SurfaceConfigured) => {
                Some(FramePhase::SurfaceConfigured)
            }
            (FramePhase::SurfaceConfigured | FramePhase::Rendering, FrameEvent::FrameStarted) => {
                Some(FramePhase::Rendering)
            }
            (
                FramePhase::SurfaceConfigured | FramePhase::Rendering,
                FrameEvent::ResizeRequested,
            ) => Some(FramePhase::Resizing),
            (FramePhase::Resizing, FrameEvent::ResizeCompleted) => Some(FramePhase::Rendering),
            _ => None,
        };

        match next {
            Some(next) => {
                if next != self {
                    log::debug!("Frame phase {self:?} -> {next:?} on {event:?}");
                }
                Ok(next)
            }
            None => Err(Error::new(format!(
                "Invalid frame phase transition from {self:?} on {event:?}"
            ))
            .into()),
        }
    }

    pub fn can_render(&self) -> bool {
        matches!(self, FramePhase::SurfaceConfigured | FramePhase::Rendering)
    }

    /// Window events arriving after shutdown must be dropped instead of driving the phase.
    pub fn is_terminated(&self) -> bool {
        *self == FramePhase::Terminated
    }
}
