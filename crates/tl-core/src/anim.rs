//! Connection enter/exit tweens.
//!
//! Progress lives on the `Connection` itself, because a deleting connection
//! must stay in the graph until its exit tween reaches zero. The animator only
//! tracks timing; `Graph::tick` applies the samples it produces.
//!
//! Time comes from the host's frame callback. A tween latches its start time
//! on the first tick after it was registered, like a frame callback that reads
//! the clock on its first run.

use crate::id::ConnectionId;
use std::collections::HashMap;

/// Frame source injected by the host (e.g. `requestAnimationFrame`).
///
/// The core calls `request_frame` whenever a tween is pending. The host must
/// answer with one `tick(now_ms)` on the next frame.
pub trait FrameScheduler {
    fn request_frame(&mut self);
}

/// A scheduler that drops every request. Useful for headless sessions
/// that drive `tick` on their own clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopScheduler;

impl FrameScheduler for NoopScheduler {
    fn request_frame(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenKind {
    /// Progress 0 → 1, cubic ease-out.
    Creation,
    /// Progress 1 → 0, linear.
    Deletion,
}

#[derive(Debug, Clone, Copy)]
struct Tween {
    kind: TweenKind,
    duration_ms: f64,
    started_at: Option<f64>,
}

/// One tween's state at a given frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenSample {
    pub id: ConnectionId,
    pub kind: TweenKind,
    pub progress: f32,
    pub finished: bool,
}

pub fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

#[derive(Debug, Clone)]
pub struct Animator {
    tweens: HashMap<ConnectionId, Tween>,
    creation_ms: f64,
    deletion_ms: f64,
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(500.0, 300.0)
    }
}

impl Animator {
    pub fn new(creation_ms: f64, deletion_ms: f64) -> Self {
        Self {
            tweens: HashMap::new(),
            creation_ms,
            deletion_ms,
        }
    }

    /// Track a tween for `id`, replacing whatever was tracked before.
    pub fn start(&mut self, id: ConnectionId, kind: TweenKind) {
        let duration_ms = match kind {
            TweenKind::Creation => self.creation_ms,
            TweenKind::Deletion => self.deletion_ms,
        };
        self.tweens.insert(
            id,
            Tween {
                kind,
                duration_ms,
                started_at: None,
            },
        );
    }

    pub fn cancel(&mut self, id: ConnectionId) {
        self.tweens.remove(&id);
    }

    pub fn is_idle(&self) -> bool {
        self.tweens.is_empty()
    }

    #[cfg(test)]
    fn kind_of(&self, id: ConnectionId) -> Option<TweenKind> {
        self.tweens.get(&id).map(|t| t.kind)
    }

    /// Sample every tween at `now_ms`. Finished tweens are dropped.
    pub fn advance(&mut self, now_ms: f64) -> Vec<TweenSample> {
        let mut samples = Vec::with_capacity(self.tweens.len());
        for (&id, tween) in self.tweens.iter_mut() {
            let started = *tween.started_at.get_or_insert(now_ms);
            let t = if tween.duration_ms > 0.0 {
                ((now_ms - started) / tween.duration_ms).clamp(0.0, 1.0)
            } else {
                1.0
            };
            let progress = match tween.kind {
                TweenKind::Creation => ease_out_cubic(t),
                TweenKind::Deletion => 1.0 - t,
            };
            samples.push(TweenSample {
                id,
                kind: tween.kind,
                progress: progress as f32,
                finished: t >= 1.0,
            });
        }
        self.tweens.retain(|_, t| {
            let elapsed = t.started_at.map_or(0.0, |s| now_ms - s);
            elapsed < t.duration_ms
        });
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_for(samples: &[TweenSample], id: ConnectionId) -> TweenSample {
        *samples.iter().find(|s| s.id == id).unwrap()
    }

    #[test]
    fn creation_eases_out_and_finishes() {
        let id = ConnectionId::intern("anim-create");
        let mut anim = Animator::default();
        anim.start(id, TweenKind::Creation);

        let first = sample_for(&anim.advance(1000.0), id);
        assert_eq!(first.progress, 0.0);
        assert!(!first.finished);

        let mid = sample_for(&anim.advance(1250.0), id);
        assert!((mid.progress - 0.875).abs() < 1e-6, "{}", mid.progress);

        let last = sample_for(&anim.advance(1600.0), id);
        assert_eq!(last.progress, 1.0);
        assert!(last.finished);
        assert!(anim.is_idle());
    }

    #[test]
    fn deletion_is_linear_reverse() {
        let id = ConnectionId::intern("anim-delete");
        let mut anim = Animator::default();
        anim.start(id, TweenKind::Deletion);
        anim.advance(0.0);
        let mid = sample_for(&anim.advance(150.0), id);
        assert!((mid.progress - 0.5).abs() < 1e-6);
        let end = sample_for(&anim.advance(300.0), id);
        assert_eq!(end.progress, 0.0);
        assert!(end.finished);
    }

    #[test]
    fn restarting_overwrites_the_tracked_tween() {
        let id = ConnectionId::intern("anim-overwrite");
        let mut anim = Animator::default();
        anim.start(id, TweenKind::Creation);
        anim.advance(0.0);
        anim.start(id, TweenKind::Deletion);
        assert_eq!(anim.kind_of(id), Some(TweenKind::Deletion));
        let s = sample_for(&anim.advance(100.0), id);
        assert_eq!(s.kind, TweenKind::Deletion);
        assert_eq!(s.progress, 1.0);
    }
}
