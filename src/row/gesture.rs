//! Pointer gesture classification (tap / hold / double-tap)
//!
//! Timers are only armed for buttons whose affordances ask for them: a
//! button without hold or double-tap actions gets an immediate tap on
//! release. Time is passed in so the classifier stays deterministic.

use std::time::{Duration, Instant};

use super::Affordances;
use crate::action::ActionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gesture {
    pub target: usize,
    pub kind: ActionKind,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    target: usize,
    started: Instant,
    affordances: Affordances,
}

#[derive(Debug, Clone, Copy)]
struct PendingTap {
    target: usize,
    released: Instant,
}

#[derive(Debug)]
pub struct GestureClassifier {
    hold_after: Duration,
    double_tap_within: Duration,
    press: Option<Press>,
    pending_tap: Option<PendingTap>,
}

impl GestureClassifier {
    pub fn new(hold_after: Duration, double_tap_within: Duration) -> Self {
        Self {
            hold_after,
            double_tap_within,
            press: None,
            pending_tap: None,
        }
    }

    /// Pointer down on a button. A tap still waiting on another button, or
    /// one whose double-tap window has already closed, is flushed and returned.
    pub fn press(&mut self, now: Instant, target: usize, affordances: Affordances) -> Option<Gesture> {
        let flushed = match self.pending_tap {
            Some(p) if p.target != target || self.expired(p, now) => {
                self.pending_tap = None;
                Some(Gesture {
                    target: p.target,
                    kind: ActionKind::Tap,
                })
            }
            _ => None,
        };

        self.press = Some(Press {
            target,
            started: now,
            affordances,
        });
        flushed
    }

    /// Pointer up. Returns the classified gestures in the order they
    /// happened; empty while a double-tap window is open. An earlier tap
    /// that can no longer pair up is emitted ahead of the new gesture.
    pub fn release(&mut self, now: Instant) -> Vec<Gesture> {
        let Some(press) = self.press.take() else {
            return Vec::new();
        };
        let target = press.target;

        if press.affordances.hold && now.duration_since(press.started) >= self.hold_after {
            let mut gestures = self.take_pending_tap();
            gestures.push(Gesture {
                target,
                kind: ActionKind::Hold,
            });
            return gestures;
        }

        if !press.affordances.double_tap {
            let mut gestures = self.take_pending_tap();
            gestures.push(Gesture {
                target,
                kind: ActionKind::Tap,
            });
            return gestures;
        }

        match self.pending_tap {
            Some(p) if p.target == target && !self.expired(p, now) => {
                self.pending_tap = None;
                vec![Gesture {
                    target,
                    kind: ActionKind::DoubleTap,
                }]
            }
            _ => {
                let gestures = self.take_pending_tap();
                self.pending_tap = Some(PendingTap {
                    target,
                    released: now,
                });
                gestures
            }
        }
    }

    fn expired(&self, pending: PendingTap, now: Instant) -> bool {
        now.duration_since(pending.released) > self.double_tap_within
    }

    fn take_pending_tap(&mut self) -> Vec<Gesture> {
        self.pending_tap
            .take()
            .map(|p| Gesture {
                target: p.target,
                kind: ActionKind::Tap,
            })
            .into_iter()
            .collect()
    }

    /// Flush a pending tap whose double-tap window has closed
    pub fn poll(&mut self, now: Instant) -> Option<Gesture> {
        let pending = self.pending_tap?;
        if self.expired(pending, now) {
            self.pending_tap = None;
            return Some(Gesture {
                target: pending.target,
                kind: ActionKind::Tap,
            });
        }
        None
    }

    pub fn cancel(&mut self) {
        self.press = None;
        self.pending_tap = None;
    }

    /// True while any timer-backed state is outstanding
    pub fn is_armed(&self) -> bool {
        self.pending_tap.is_some()
            || self
                .press
                .is_some_and(|p| p.affordances.hold || p.affordances.double_tap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLD: Duration = Duration::from_millis(500);
    const DOUBLE: Duration = Duration::from_millis(250);

    fn classifier() -> GestureClassifier {
        GestureClassifier::new(HOLD, DOUBLE)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_inert_button_taps_immediately() {
        let mut g = classifier();
        let t0 = Instant::now();

        assert_eq!(g.press(t0, 0, Affordances::default()), None);
        assert!(!g.is_armed());
        // Even a long press is a tap when hold is not armed
        assert_eq!(
            g.release(t0 + ms(900)),
            vec![Gesture { target: 0, kind: ActionKind::Tap }]
        );
        assert!(!g.is_armed());
        assert_eq!(g.poll(t0 + ms(2000)), None);
    }

    #[test]
    fn test_hold() {
        let mut g = classifier();
        let t0 = Instant::now();
        let hold_only = Affordances { hold: true, double_tap: false };

        g.press(t0, 2, hold_only);
        assert!(g.is_armed());
        assert_eq!(
            g.release(t0 + ms(600)),
            vec![Gesture { target: 2, kind: ActionKind::Hold }]
        );

        g.press(t0 + ms(1000), 2, hold_only);
        assert_eq!(
            g.release(t0 + ms(1100)),
            vec![Gesture { target: 2, kind: ActionKind::Tap }]
        );
    }

    #[test]
    fn test_double_tap() {
        let mut g = classifier();
        let t0 = Instant::now();
        let double = Affordances { hold: false, double_tap: true };

        g.press(t0, 1, double);
        assert!(g.release(t0 + ms(50)).is_empty());
        g.press(t0 + ms(120), 1, double);
        assert_eq!(
            g.release(t0 + ms(200)),
            vec![Gesture { target: 1, kind: ActionKind::DoubleTap }]
        );
        assert_eq!(g.poll(t0 + ms(1000)), None);
    }

    #[test]
    fn test_single_tap_waits_for_window() {
        let mut g = classifier();
        let t0 = Instant::now();
        let double = Affordances { hold: false, double_tap: true };

        g.press(t0, 1, double);
        assert!(g.release(t0 + ms(50)).is_empty());
        assert_eq!(g.poll(t0 + ms(200)), None);
        assert_eq!(
            g.poll(t0 + ms(400)),
            Some(Gesture { target: 1, kind: ActionKind::Tap })
        );
        assert!(!g.is_armed());
    }

    #[test]
    fn test_press_elsewhere_flushes_pending_tap() {
        let mut g = classifier();
        let t0 = Instant::now();
        let double = Affordances { hold: false, double_tap: true };

        g.press(t0, 1, double);
        g.release(t0 + ms(20));
        assert_eq!(
            g.press(t0 + ms(60), 4, Affordances::default()),
            Some(Gesture { target: 1, kind: ActionKind::Tap })
        );
        assert_eq!(
            g.release(t0 + ms(80)),
            vec![Gesture { target: 4, kind: ActionKind::Tap }]
        );
    }

    #[test]
    fn test_release_without_press_is_ignored() {
        let mut g = classifier();
        assert!(g.release(Instant::now()).is_empty());
    }

    #[test]
    fn test_slow_second_tap_keeps_both_taps() {
        let mut g = classifier();
        let t0 = Instant::now();
        let double = Affordances { hold: false, double_tap: true };
        let mut taps = Vec::new();

        g.press(t0, 1, double);
        taps.extend(g.release(t0 + ms(50)));
        // Window closed before the second press, so the first tap goes out now
        taps.extend(g.press(t0 + ms(400), 1, double));
        taps.extend(g.release(t0 + ms(450)));
        taps.extend(g.poll(t0 + ms(2000)));

        assert_eq!(
            taps,
            vec![
                Gesture { target: 1, kind: ActionKind::Tap },
                Gesture { target: 1, kind: ActionKind::Tap },
            ]
        );
        assert!(!g.is_armed());
    }

    #[test]
    fn test_second_press_released_after_window_keeps_first_tap() {
        let mut g = classifier();
        let t0 = Instant::now();
        let double = Affordances { hold: false, double_tap: true };

        g.press(t0, 1, double);
        assert!(g.release(t0 + ms(50)).is_empty());
        assert_eq!(g.press(t0 + ms(200), 1, double), None);
        assert_eq!(
            g.release(t0 + ms(350)),
            vec![Gesture { target: 1, kind: ActionKind::Tap }]
        );
        assert_eq!(
            g.poll(t0 + ms(700)),
            Some(Gesture { target: 1, kind: ActionKind::Tap })
        );
    }

    #[test]
    fn test_tap_then_hold_emits_both() {
        let mut g = classifier();
        let t0 = Instant::now();
        let both = Affordances { hold: true, double_tap: true };

        g.press(t0, 3, both);
        assert!(g.release(t0 + ms(50)).is_empty());
        assert_eq!(g.press(t0 + ms(100), 3, both), None);
        assert_eq!(
            g.release(t0 + ms(700)),
            vec![
                Gesture { target: 3, kind: ActionKind::Tap },
                Gesture { target: 3, kind: ActionKind::Hold },
            ]
        );
        assert!(!g.is_armed());
        assert_eq!(g.poll(t0 + ms(2000)), None);
    }
}
