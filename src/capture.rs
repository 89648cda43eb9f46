use tracing::{debug, info, warn};

use crate::events::{SessionId, WriteStage};
use crate::host::Renderer;
use crate::layout::STAGE_COUNT;

/// Field of view forced while a capture is running; 90° makes the six faces meet.
pub const CAPTURE_FOV_DEGREES: f32 = 90.0;

/// Camera rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl Orientation {
    pub const fn new(yaw: f32, pitch: f32, roll: f32) -> Self {
        Self { yaw, pitch, roll }
    }
}

/// Cube faces in stage order: front, right, back, left, up, down.
pub const STAGE_ORIENTATIONS: [Orientation; STAGE_COUNT] = [
    Orientation::new(0.0, 0.0, 0.0),
    Orientation::new(90.0, 0.0, 0.0),
    Orientation::new(180.0, 0.0, 0.0),
    Orientation::new(-90.0, 0.0, 0.0),
    Orientation::new(0.0, -90.0, 0.0),
    Orientation::new(0.0, 90.0, 0.0),
];

/// Receives captured frames; must return without waiting on the write.
pub trait CaptureSink {
    fn submit(&self, request: WriteStage);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Capturing { stage: usize, session: SessionId },
}

/// Camera settings the host applies while a capture is running.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraOverride {
    pub orientation: Orientation,
    pub fov_degrees: f32,
}

/// Drives one six-stage capture, one stage per rendered frame.
#[derive(Debug)]
pub struct CaptureStateMachine {
    state: CaptureState,
    orientations: [Orientation; STAGE_COUNT],
}

impl Default for CaptureStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureStateMachine {
    pub fn new() -> Self {
        Self {
            state: CaptureState::Idle,
            orientations: STAGE_ORIENTATIONS,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.state, CaptureState::Capturing { .. })
    }

    /// Begins a session keyed by `session` and hides the GUI.
    ///
    /// Returns `false` and changes nothing if a session is already running.
    pub fn start<R>(&mut self, session: SessionId, renderer: &mut R) -> bool
    where
        R: Renderer + ?Sized,
    {
        if self.is_capturing() {
            debug!(session = %session, "capture already running; ignoring trigger");
            return false;
        }
        self.state = CaptureState::Capturing { stage: 0, session };
        renderer.set_gui_hidden(true);
        info!(session = %session, "panorama capture started");
        true
    }

    /// Override for the stage about to be captured, if any.
    pub fn camera_override(&self) -> Option<CameraOverride> {
        match self.state {
            CaptureState::Idle => None,
            CaptureState::Capturing { stage, .. } => Some(CameraOverride {
                orientation: self.orientations[stage],
                fov_degrees: CAPTURE_FOV_DEGREES,
            }),
        }
    }

    /// Handles one rendered frame. Returns the stage captured on this frame.
    ///
    /// A framebuffer that cannot be read leaves a hole in the set; the session
    /// still advances.
    pub fn tick<R, S>(&mut self, renderer: &mut R, sink: &S) -> Option<usize>
    where
        R: Renderer + ?Sized,
        S: CaptureSink + ?Sized,
    {
        let CaptureState::Capturing { stage, session } = self.state else {
            return None;
        };
        if !renderer.scene_loaded() {
            debug!(session = %session, stage, "no scene loaded; capture waiting");
            return None;
        }

        renderer.set_camera_orientation(self.orientations[stage]);
        renderer.set_fov_override(CAPTURE_FOV_DEGREES);
        match renderer.capture_framebuffer() {
            Ok(frame) => sink.submit(WriteStage {
                frame,
                session,
                stage,
            }),
            Err(err) => warn!(session = %session, stage, "framebuffer capture failed: {err:#}"),
        }

        let next = stage + 1;
        if next == STAGE_COUNT {
            self.state = CaptureState::Idle;
            renderer.set_gui_hidden(false);
            info!(session = %session, "panorama capture finished");
        } else {
            self.state = CaptureState::Capturing {
                stage: next,
                session,
            };
        }
        Some(stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RawFrame;
    use anyhow::anyhow;
    use image::{Rgba, RgbaImage};
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeRenderer {
        scene: bool,
        fail_capture: bool,
        orientations: Vec<Orientation>,
        fovs: Vec<f32>,
        gui_hidden: Vec<bool>,
    }

    impl Renderer for FakeRenderer {
        fn scene_loaded(&self) -> bool {
            self.scene
        }

        fn capture_framebuffer(&mut self) -> anyhow::Result<RawFrame> {
            if self.fail_capture {
                return Err(anyhow!("framebuffer unavailable"));
            }
            Ok(RawFrame::from(RgbaImage::from_pixel(4, 2, Rgba([0; 4]))))
        }

        fn set_camera_orientation(&mut self, orientation: Orientation) {
            self.orientations.push(orientation);
        }

        fn set_fov_override(&mut self, degrees: f32) {
            self.fovs.push(degrees);
        }

        fn set_gui_hidden(&mut self, hidden: bool) {
            self.gui_hidden.push(hidden);
        }
    }

    #[derive(Default)]
    struct RecordingSink(RefCell<Vec<(SessionId, usize)>>);

    impl CaptureSink for RecordingSink {
        fn submit(&self, request: WriteStage) {
            self.0.borrow_mut().push((request.session, request.stage));
        }
    }

    fn renderer() -> FakeRenderer {
        FakeRenderer {
            scene: true,
            ..FakeRenderer::default()
        }
    }

    #[test]
    fn idle_tick_does_nothing() {
        let mut machine = CaptureStateMachine::new();
        let mut r = renderer();
        let sink = RecordingSink::default();
        assert_eq!(machine.tick(&mut r, &sink), None);
        assert!(sink.0.borrow().is_empty());
        assert!(r.orientations.is_empty());
        assert_eq!(machine.camera_override(), None);
    }

    #[test]
    fn session_captures_each_stage_once_in_order() {
        let mut machine = CaptureStateMachine::new();
        let mut r = renderer();
        let sink = RecordingSink::default();
        let session = SessionId(1000);
        assert!(machine.start(session, &mut r));

        for frame in 0..STAGE_COUNT {
            let ov = machine.camera_override().unwrap();
            assert_eq!(ov.orientation, STAGE_ORIENTATIONS[frame]);
            assert_eq!(ov.fov_degrees, 90.0);
            assert_eq!(machine.tick(&mut r, &sink), Some(frame));
        }

        let expected: Vec<_> = (0..STAGE_COUNT).map(|s| (session, s)).collect();
        assert_eq!(*sink.0.borrow(), expected);
        assert_eq!(r.orientations, STAGE_ORIENTATIONS.to_vec());
        assert!(r.fovs.iter().all(|f| *f == CAPTURE_FOV_DEGREES));
        assert_eq!(machine.state(), CaptureState::Idle);
        assert_eq!(r.gui_hidden, vec![true, false]);

        // Further frames are ignored once the set is done.
        assert_eq!(machine.tick(&mut r, &sink), None);
        assert_eq!(sink.0.borrow().len(), STAGE_COUNT);
    }

    #[test]
    fn retrigger_while_capturing_is_ignored() {
        let mut machine = CaptureStateMachine::new();
        let mut r = renderer();
        let sink = RecordingSink::default();
        machine.start(SessionId(1), &mut r);
        machine.tick(&mut r, &sink);
        machine.tick(&mut r, &sink);

        assert!(!machine.start(SessionId(2), &mut r));
        assert_eq!(
            machine.state(),
            CaptureState::Capturing {
                stage: 2,
                session: SessionId(1)
            }
        );
        assert_eq!(r.gui_hidden, vec![true]);
    }

    #[test]
    fn new_session_allowed_after_completion() {
        let mut machine = CaptureStateMachine::new();
        let mut r = renderer();
        let sink = RecordingSink::default();
        machine.start(SessionId(1), &mut r);
        for _ in 0..STAGE_COUNT {
            machine.tick(&mut r, &sink);
        }
        assert!(machine.start(SessionId(2), &mut r));
        assert_eq!(
            machine.state(),
            CaptureState::Capturing {
                stage: 0,
                session: SessionId(2)
            }
        );
    }

    #[test]
    fn waits_while_no_scene_is_loaded() {
        let mut machine = CaptureStateMachine::new();
        let mut r = FakeRenderer::default();
        let sink = RecordingSink::default();
        machine.start(SessionId(5), &mut r);
        assert_eq!(machine.tick(&mut r, &sink), None);
        assert!(sink.0.borrow().is_empty());

        r.scene = true;
        assert_eq!(machine.tick(&mut r, &sink), Some(0));
    }

    #[test]
    fn failed_capture_still_advances() {
        let mut machine = CaptureStateMachine::new();
        let mut r = renderer();
        r.fail_capture = true;
        let sink = RecordingSink::default();
        machine.start(SessionId(9), &mut r);
        for _ in 0..STAGE_COUNT {
            machine.tick(&mut r, &sink);
        }
        assert!(sink.0.borrow().is_empty());
        assert_eq!(machine.state(), CaptureState::Idle);
        assert_eq!(r.gui_hidden, vec![true, false]);
    }
}
