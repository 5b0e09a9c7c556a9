//! Time-based rectangle interpolation for window transitions.
//!
//! The animator never sleeps or spawns threads.  The main loop calls
//! [`WindowAnimator::tick`] roughly every [`TICK_INTERVAL`] and the animator
//! pushes interpolated rectangles through the [`WindowSystem`].

use crate::easing::Easing;
use crate::geometry::Rect;
use crate::traits::{notify, LayoutEvent, WindowSystem};
use crate::window::WindowHandle;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// Interval between two ticks (about 60 Hz).
pub const TICK_INTERVAL: Duration = Duration::from_millis(16);
pub const DEFAULT_DURATION: Duration = Duration::from_millis(300);
pub const MIN_DURATION: Duration = Duration::from_millis(50);
pub const MAX_DURATION: Duration = Duration::from_millis(1000);
/// Start offset between consecutive windows of a staggered batch.
pub const DEFAULT_STAGGER: Duration = Duration::from_millis(30);

/// One window's transition.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationJob {
    pub handle: WindowHandle,
    pub start_rect: Rect,
    pub end_rect: Rect,
    pub start_time: Instant,
    pub duration: Duration,
}

impl AnimationJob {
    /// Linear progress in `[0, 1]`; zero before the job has started.
    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start_time);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    fn rect_at(&self, now: Instant, easing: &Easing) -> Rect {
        let progress = self.progress(now);
        if progress >= 1.0 {
            return self.end_rect;
        }
        self.start_rect.lerp(&self.end_rect, easing.apply(progress))
    }
}

/// Fixed-tick scheduler of [`AnimationJob`]s, at most one per window.
#[derive(Debug)]
pub struct WindowAnimator {
    jobs: BTreeMap<WindowHandle, AnimationJob>,
    easing: Easing,
    default_duration: Duration,
    stagger: Duration,
    events: Option<mpsc::Sender<LayoutEvent>>,
}

impl Default for WindowAnimator {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowAnimator {
    pub fn new() -> Self {
        Self {
            jobs: BTreeMap::new(),
            easing: Easing::default(),
            default_duration: DEFAULT_DURATION,
            stagger: DEFAULT_STAGGER,
            events: None,
        }
    }

    /// Attach a channel that receives [`LayoutEvent::AnimationCompleted`].
    pub fn set_event_sink(&mut self, tx: mpsc::Sender<LayoutEvent>) {
        self.events = Some(tx);
    }

    pub fn set_easing(&mut self, easing: Easing) {
        self.easing = easing;
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    /// Set the duration used when none is given, clamped to 50–1000 ms.
    pub fn set_default_duration(&mut self, duration: Duration) {
        self.default_duration = duration.clamp(MIN_DURATION, MAX_DURATION);
    }

    pub fn default_duration(&self) -> Duration {
        self.default_duration
    }

    /// Set the offset between windows of a staggered batch, at most
    /// 1000 ms.
    pub fn set_stagger(&mut self, stagger: Duration) {
        self.stagger = stagger.min(MAX_DURATION);
    }

    pub fn stagger(&self) -> Duration {
        self.stagger
    }

    /// Start moving `handle` from where it is now to `target`.
    ///
    /// Returns `false` only when the window cannot be found.  A window that
    /// is already at `target` is a successful no-op; a zero `duration`
    /// moves it immediately.  Any running job for the window is replaced.
    pub fn animate<W: WindowSystem>(
        &mut self,
        wm: &W,
        handle: WindowHandle,
        target: Rect,
        duration: Option<Duration>,
        now: Instant,
    ) -> bool {
        self.start_job(wm, handle, target, duration, now)
    }

    /// Animate several windows at once.  With `staggered`, the n-th window
    /// starts `n × stagger` after `now`.  Returns how many were started.
    pub fn animate_many<W: WindowSystem>(
        &mut self,
        wm: &W,
        targets: &[(WindowHandle, Rect)],
        duration: Option<Duration>,
        staggered: bool,
        now: Instant,
    ) -> usize {
        let mut started = 0;
        for (i, (handle, target)) in targets.iter().enumerate() {
            let start = if staggered {
                let offset = self.stagger.saturating_mul(u32::try_from(i).unwrap_or(u32::MAX));
                now.checked_add(offset).unwrap_or(now)
            } else {
                now
            };
            if self.start_job(wm, *handle, *target, duration, start) {
                started += 1;
            }
        }
        started
    }

    fn start_job<W: WindowSystem>(
        &mut self,
        wm: &W,
        handle: WindowHandle,
        target: Rect,
        duration: Option<Duration>,
        start_time: Instant,
    ) -> bool {
        let current = match wm.window(handle) {
            Ok(Some(w)) => w.rect,
            Ok(None) => {
                debug!("animate {}: window is gone", handle);
                self.jobs.remove(&handle);
                return false;
            }
            Err(e) => {
                warn!("animate {}: {}", handle, e);
                return false;
            }
        };

        // A running job may have moved the window part way already; start
        // from wherever it is now.
        self.jobs.remove(&handle);

        if current.approx_eq(&target) {
            return true;
        }

        let duration = duration.unwrap_or(self.default_duration);
        if duration.is_zero() {
            return wm.set_rect(handle, &target);
        }

        debug!("animate {}: {:?} -> {:?} over {:?}", handle, current, target, duration);
        self.jobs.insert(
            handle,
            AnimationJob {
                handle,
                start_rect: current,
                end_rect: target,
                start_time,
                duration,
            },
        );
        true
    }

    /// Advance every started job to `now`.
    ///
    /// Returns the handles whose jobs completed during this tick.  A job
    /// completes when its progress reaches 1 or when its window is no
    /// longer valid; each completion is announced exactly once.
    pub fn tick<W: WindowSystem>(&mut self, wm: &W, now: Instant) -> Vec<WindowHandle> {
        let mut completed = Vec::new();

        for job in self.jobs.values() {
            if now < job.start_time {
                continue;
            }
            if !wm.is_valid(job.handle) {
                debug!("animation {}: window closed", job.handle);
                completed.push(job.handle);
                continue;
            }
            let rect = job.rect_at(now, &self.easing);
            if !wm.set_rect(job.handle, &rect) {
                debug!("animation {}: set_rect failed", job.handle);
            }
            if job.progress(now) >= 1.0 {
                completed.push(job.handle);
            }
        }

        for handle in &completed {
            self.jobs.remove(handle);
            notify(&self.events, LayoutEvent::AnimationCompleted(*handle));
        }
        completed
    }

    /// Drop the job for `handle`, leaving the window where it is.
    pub fn stop(&mut self, handle: WindowHandle) -> bool {
        self.jobs.remove(&handle).is_some()
    }

    pub fn stop_all(&mut self) {
        self.jobs.clear();
    }

    pub fn is_animating(&self, handle: WindowHandle) -> bool {
        self.jobs.contains_key(&handle)
    }

    pub fn is_idle(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn job(&self, handle: WindowHandle) -> Option<&AnimationJob> {
        self.jobs.get(&handle)
    }

    /// The rectangle `handle` should have at `now`, if it is animating.
    pub fn state(&self, handle: WindowHandle, now: Instant) -> Option<Rect> {
        self.jobs.get(&handle).map(|job| job.rect_at(now, &self.easing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{monitor, MockWs};

    fn ws() -> MockWs {
        let ws = MockWs::new(vec![monitor("DP-1", 0.0, 1920.0, 1080.0)]);
        ws.add_window(1, "a", "app", Rect::new(0.0, 0.0, 100.0, 100.0));
        ws.add_window(2, "b", "app", Rect::new(500.0, 0.0, 100.0, 100.0));
        ws.add_window(3, "c", "app", Rect::new(900.0, 0.0, 100.0, 100.0));
        ws
    }

    fn linear() -> WindowAnimator {
        let mut a = WindowAnimator::new();
        a.set_easing(Easing::Linear);
        a
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn oversized_stagger_is_clamped() {
        let wm = ws();
        let mut a = linear();
        a.set_stagger(Duration::from_millis(u64::MAX));
        assert_eq!(a.stagger(), MAX_DURATION);

        let now = Instant::now();
        let targets = [
            (WindowHandle(1), Rect::new(0.0, 500.0, 100.0, 100.0)),
            (WindowHandle(2), Rect::new(500.0, 500.0, 100.0, 100.0)),
            (WindowHandle(3), Rect::new(900.0, 500.0, 100.0, 100.0)),
        ];
        assert_eq!(a.animate_many(&wm, &targets, None, true, now), 3);
        assert_eq!(a.job(WindowHandle(3)).map(|j| j.start_time), Some(now + ms(2000)));
    }

    #[test]
    fn animate_to_current_rect_is_noop() {
        let wm = ws();
        let mut a = linear();
        let now = Instant::now();
        assert!(a.animate(&wm, WindowHandle(1), Rect::new(0.0, 0.0, 100.0, 100.0), None, now));
        assert!(a.is_idle());
        assert!(wm.rect_calls().is_empty());
    }

    #[test]
    fn zero_duration_moves_immediately() {
        let wm = ws();
        let mut a = linear();
        let target = Rect::new(10.0, 20.0, 300.0, 400.0);
        assert!(a.animate(&wm, WindowHandle(1), target, Some(Duration::ZERO), Instant::now()));
        assert!(a.is_idle());
        assert_eq!(wm.rect_of(1), Some(target));
    }

    #[test]
    fn missing_window_fails() {
        let wm = ws();
        let mut a = linear();
        assert!(!a.animate(&wm, WindowHandle(42), Rect::default(), None, Instant::now()));
    }

    #[test]
    fn tick_interpolates_then_completes_once() {
        let wm = ws();
        let mut a = linear();
        let (tx, rx) = mpsc::channel();
        a.set_event_sink(tx);

        let t0 = Instant::now();
        let target = Rect::new(200.0, 100.0, 300.0, 100.0);
        assert!(a.animate(&wm, WindowHandle(1), target, Some(ms(100)), t0));

        assert!(a.tick(&wm, t0 + ms(50)).is_empty());
        assert_eq!(wm.rect_of(1), Some(Rect::new(100.0, 50.0, 200.0, 100.0)));
        assert_eq!(a.state(WindowHandle(1), t0 + ms(50)), wm.rect_of(1));

        assert_eq!(a.tick(&wm, t0 + ms(100)), vec![WindowHandle(1)]);
        assert_eq!(wm.rect_of(1), Some(target));
        assert!(a.tick(&wm, t0 + ms(200)).is_empty());

        let events: Vec<LayoutEvent> = rx.try_iter().collect();
        assert_eq!(events, vec![LayoutEvent::AnimationCompleted(WindowHandle(1))]);
    }

    #[test]
    fn closed_window_completes_job() {
        let wm = ws();
        let mut a = linear();
        let t0 = Instant::now();
        a.animate(&wm, WindowHandle(2), Rect::new(0.0, 0.0, 10.0, 10.0), Some(ms(300)), t0);
        wm.close(2);
        assert_eq!(a.tick(&wm, t0 + ms(16)), vec![WindowHandle(2)]);
        assert!(!a.is_animating(WindowHandle(2)));
        assert!(wm.rect_calls().is_empty());
    }

    #[test]
    fn staggered_batch_delays_start_times() {
        let wm = ws();
        let mut a = linear();
        let t0 = Instant::now();
        let target = Rect::new(0.0, 500.0, 50.0, 50.0);
        let targets: Vec<_> = [1, 2, 3].map(|i| (WindowHandle(i), target)).to_vec();
        assert_eq!(a.animate_many(&wm, &targets, Some(ms(100)), true, t0), 3);

        assert_eq!(a.job(WindowHandle(2)).map(|j| j.start_time), Some(t0 + ms(30)));
        assert_eq!(a.job(WindowHandle(3)).map(|j| j.start_time), Some(t0 + ms(60)));

        a.tick(&wm, t0 + ms(20));
        let moved: Vec<WindowHandle> = wm.rect_calls().iter().map(|(h, _)| *h).collect();
        assert_eq!(moved, vec![WindowHandle(1)]);

        assert_eq!(a.tick(&wm, t0 + ms(130)), vec![WindowHandle(1), WindowHandle(2)]);
        assert_eq!(a.tick(&wm, t0 + ms(160)), vec![WindowHandle(3)]);
        assert!(a.is_idle());
    }

    #[test]
    fn retargeting_replaces_running_job() {
        let wm = ws();
        let mut a = linear();
        let t0 = Instant::now();
        a.animate(&wm, WindowHandle(1), Rect::new(1000.0, 0.0, 100.0, 100.0), Some(ms(100)), t0);
        a.tick(&wm, t0 + ms(50));
        let midway = wm.rect_of(1).unwrap();

        a.animate(&wm, WindowHandle(1), Rect::new(0.0, 0.0, 100.0, 100.0), Some(ms(100)), t0 + ms(50));
        let job = a.job(WindowHandle(1)).unwrap();
        assert_eq!(job.start_rect, midway);
        assert_eq!(job.end_rect, Rect::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn default_duration_is_clamped() {
        let mut a = WindowAnimator::new();
        assert_eq!(a.default_duration(), ms(300));
        a.set_default_duration(ms(5));
        assert_eq!(a.default_duration(), ms(50));
        a.set_default_duration(ms(5000));
        assert_eq!(a.default_duration(), ms(1000));
    }

    #[test]
    fn stop_leaves_window_in_place() {
        let wm = ws();
        let mut a = linear();
        let t0 = Instant::now();
        a.animate(&wm, WindowHandle(1), Rect::new(1000.0, 0.0, 100.0, 100.0), None, t0);
        assert!(a.stop(WindowHandle(1)));
        assert!(!a.stop(WindowHandle(1)));
        assert!(a.tick(&wm, t0 + ms(500)).is_empty());
        assert_eq!(wm.rect_of(1), Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
    }
}
