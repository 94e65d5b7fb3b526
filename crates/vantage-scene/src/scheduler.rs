//! On-demand render scheduling
//!
//! The host calls `tick` once per presented frame with a monotonic
//! timestamp. A frame is drawn only when the camera moved or someone asked
//! for a redraw since the last draw; otherwise the tick is skipped.

use tracing::{error, trace};

use crate::render::RenderError;

/// What the last tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Drew the scene and overlay; tick again next frame
    Redrawn,
    /// Nothing changed; tick again next frame
    Skipped,
    /// Scheduler stopped; do not tick again
    Stopped,
}

impl FrameOutcome {
    pub fn keep_running(self) -> bool {
        !matches!(self, FrameOutcome::Stopped)
    }
}

/// The pieces a tick drives
pub trait FrameTarget {
    /// Advance the camera by `delta_seconds`; true when it moved
    fn advance(&mut self, delta_seconds: f32) -> bool;

    /// Draw scene and overlay, then declutter labels
    fn redraw(&mut self) -> Result<(), RenderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchedulerState {
    Running,
    Stopped,
    Faulted,
}

#[derive(Debug)]
pub struct RenderScheduler {
    last_tick: Option<f64>,
    redraw_requested: bool,
    state: SchedulerState,
    frames_drawn: u64,
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderScheduler {
    /// New scheduler, armed with a pending redraw so the first frame draws
    pub fn new() -> Self {
        Self {
            last_tick: None,
            redraw_requested: true,
            state: SchedulerState::Running,
            frames_drawn: 0,
        }
    }

    pub fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }

    pub fn redraw_requested(&self) -> bool {
        self.redraw_requested
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    pub fn is_faulted(&self) -> bool {
        self.state == SchedulerState::Faulted
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn stop(&mut self) {
        if self.state == SchedulerState::Running {
            self.state = SchedulerState::Stopped;
        }
    }

    /// Run one frame
    ///
    /// A render error faults the scheduler: it is returned from this tick
    /// and every later tick reports `Stopped`.
    pub fn tick<T: FrameTarget + ?Sized>(
        &mut self,
        now_seconds: f64,
        target: &mut T,
    ) -> Result<FrameOutcome, RenderError> {
        if self.state != SchedulerState::Running {
            return Ok(FrameOutcome::Stopped);
        }

        let delta = match self.last_tick {
            Some(last) => (now_seconds - last).max(0.0) as f32,
            None => 0.0,
        };
        self.last_tick = Some(now_seconds);

        let camera_changed = target.advance(delta);
        if !camera_changed && !self.redraw_requested {
            return Ok(FrameOutcome::Skipped);
        }

        if let Err(e) = target.redraw() {
            error!(error = %e, "Render failed, stopping frame loop");
            self.state = SchedulerState::Faulted;
            return Err(e);
        }
        self.redraw_requested = false;
        self.frames_drawn += 1;
        trace!(frame = self.frames_drawn, delta, camera_changed, "Redrew frame");
        Ok(FrameOutcome::Redrawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        deltas: Vec<f32>,
        moving: bool,
        redraws: usize,
        fail: bool,
    }

    impl FrameTarget for Recorder {
        fn advance(&mut self, delta_seconds: f32) -> bool {
            self.deltas.push(delta_seconds);
            self.moving
        }

        fn redraw(&mut self) -> Result<(), RenderError> {
            if self.fail {
                return Err(RenderError::SurfaceLost("gone".to_string()));
            }
            self.redraws += 1;
            Ok(())
        }
    }

    #[test]
    fn test_first_tick_draws_then_idles() {
        let mut scheduler = RenderScheduler::new();
        let mut target = Recorder::default();

        assert_eq!(scheduler.tick(1.0, &mut target).unwrap(), FrameOutcome::Redrawn);
        assert!(!scheduler.redraw_requested());
        assert_eq!(scheduler.tick(1.016, &mut target).unwrap(), FrameOutcome::Skipped);
        assert_eq!(scheduler.tick(1.032, &mut target).unwrap(), FrameOutcome::Skipped);
        assert_eq!(target.redraws, 1);

        assert_eq!(target.deltas[0], 0.0);
        assert!((target.deltas[1] - 0.016).abs() < 1e-5);
    }

    #[test]
    fn test_request_redraw_draws_once() {
        let mut scheduler = RenderScheduler::new();
        let mut target = Recorder::default();
        scheduler.tick(0.0, &mut target).unwrap();

        scheduler.request_redraw();
        assert_eq!(scheduler.tick(0.1, &mut target).unwrap(), FrameOutcome::Redrawn);
        assert_eq!(scheduler.tick(0.2, &mut target).unwrap(), FrameOutcome::Skipped);
        assert_eq!(target.redraws, 2);
    }

    #[test]
    fn test_camera_motion_draws_every_frame() {
        let mut scheduler = RenderScheduler::new();
        let mut target = Recorder {
            moving: true,
            ..Recorder::default()
        };
        for i in 0..5 {
            assert_eq!(
                scheduler.tick(f64::from(i) * 0.016, &mut target).unwrap(),
                FrameOutcome::Redrawn
            );
        }
        assert_eq!(scheduler.frames_drawn(), 5);
    }

    #[test]
    fn test_clock_going_backwards_clamps() {
        let mut scheduler = RenderScheduler::new();
        let mut target = Recorder::default();
        scheduler.tick(5.0, &mut target).unwrap();
        scheduler.tick(4.0, &mut target).unwrap();
        assert_eq!(target.deltas[1], 0.0);
    }

    #[test]
    fn test_stopped_scheduler_skips_target() {
        let mut scheduler = RenderScheduler::new();
        let mut target = Recorder::default();
        scheduler.stop();
        assert_eq!(scheduler.tick(0.0, &mut target).unwrap(), FrameOutcome::Stopped);
        assert!(target.deltas.is_empty());
        assert!(!FrameOutcome::Stopped.keep_running());
    }

    #[test]
    fn test_render_fault_is_fatal() {
        let mut scheduler = RenderScheduler::new();
        let mut target = Recorder {
            fail: true,
            ..Recorder::default()
        };
        assert!(scheduler.tick(0.0, &mut target).is_err());
        assert!(scheduler.is_faulted());
        assert_eq!(scheduler.tick(0.1, &mut target).unwrap(), FrameOutcome::Stopped);

        // A faulted scheduler stays faulted
        scheduler.stop();
        assert!(scheduler.is_faulted());
    }
}
