use chrono::NaiveDate;
use tracing::{debug, trace};

use crate::models::price::PriceRecord;
use crate::models::zoom::{YDomain, ZoomEvent, ZoomFrame, ZoomHistory, ZoomState};

/// Outcome of feeding one event to the zoom state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub state: ZoomState,
    /// Frame to append to the history, if the event committed a zoom.
    pub commit: Option<ZoomFrame>,
}

/// Pure transition function of the drag-to-zoom state machine.
///
/// `resting` is the state the navigator falls back to when a drag is
/// discarded (`Idle` or `Zoomed`, whichever held before the press).
/// `series` is the windowed series the chart currently shows.
pub fn transition(
    state: ZoomState,
    event: ZoomEvent,
    resting: ZoomState,
    series: &[PriceRecord],
) -> Transition {
    let unchanged = Transition {
        state,
        commit: None,
    };

    match (state, event) {
        (_, ZoomEvent::Press(anchor)) => Transition {
            state: ZoomState::Dragging {
                anchor,
                current: None,
            },
            commit: None,
        },
        (ZoomState::Dragging { anchor, .. }, ZoomEvent::Move(date)) => Transition {
            state: ZoomState::Dragging {
                anchor,
                current: Some(date),
            },
            commit: None,
        },
        (ZoomState::Dragging { anchor, current }, ZoomEvent::Release) => match current {
            Some(other) if other != anchor => {
                let frame = ZoomFrame::between(anchor, other, YDomain::default());
                let (left, right) = (frame.x_left.unwrap_or(anchor), frame.x_right.unwrap_or(other));
                let y = selection_y_domain(series, left, right)
                    .unwrap_or_else(|| full_y_domain(series));
                Transition {
                    state: ZoomState::Zoomed,
                    commit: Some(ZoomFrame { y, ..frame }),
                }
            }
            _ => Transition {
                state: resting,
                commit: None,
            },
        },
        _ => unchanged,
    }
}

/// `[0, ceil(1.1 × tallest price)]` over records dated within `[left, right]`,
/// or `None` when no record there carries a valid price.
pub fn selection_y_domain(
    series: &[PriceRecord],
    left: NaiveDate,
    right: NaiveDate,
) -> Option<YDomain> {
    let peak = series
        .iter()
        .filter(|r| left <= r.date && r.date <= right)
        .filter_map(PriceRecord::peak_price)
        .reduce(f64::max)?;
    Some(headroom_domain(peak))
}

/// Y-domain of the whole windowed series; `[0, 0]` when it has no valid price.
pub fn full_y_domain(series: &[PriceRecord]) -> YDomain {
    series
        .iter()
        .filter_map(PriceRecord::peak_price)
        .reduce(f64::max)
        .map(headroom_domain)
        .unwrap_or_default()
}

fn headroom_domain(peak: f64) -> YDomain {
    // ×11/10 rather than ×1.1 keeps integer prices exact before the ceil.
    YDomain::new(0.0, (peak * 11.0 / 10.0).ceil())
}

/// Interactive sub-range selection over the windowed series, with linear
/// undo/redo.
///
/// The navigator never holds the series itself; every call that needs
/// prices takes the currently windowed slice.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomNavigator {
    state: ZoomState,
    history: ZoomHistory,
}

impl ZoomNavigator {
    pub fn new() -> Self {
        Self {
            state: ZoomState::Idle,
            history: ZoomHistory::new(),
        }
    }

    pub fn state(&self) -> ZoomState {
        self.state
    }

    pub fn history(&self) -> &ZoomHistory {
        &self.history
    }

    /// Start a drag at `date`. A press while already dragging restarts the anchor.
    pub fn press(&mut self, date: NaiveDate) {
        self.apply(ZoomEvent::Press(date), &[]);
    }

    /// Update the provisional second anchor. Ignored unless dragging.
    pub fn move_to(&mut self, date: NaiveDate) {
        self.apply(ZoomEvent::Move(date), &[]);
    }

    /// Finish the drag. Returns `true` when a new frame was committed;
    /// degenerate drags (no move, or released on the anchor) are discarded.
    pub fn release(&mut self, series: &[PriceRecord]) -> bool {
        self.apply(ZoomEvent::Release, series)
    }

    fn apply(&mut self, event: ZoomEvent, series: &[PriceRecord]) -> bool {
        let resting = self.resting_state();
        let Transition { state, commit } = transition(self.state, event, resting, series);
        trace!(?event, from = ?self.state, to = ?state, "zoom transition");
        self.state = state;

        match commit {
            Some(frame) => {
                self.history.commit(frame, ZoomFrame::full(full_y_domain(series)));
                debug!(
                    left = ?frame.x_left,
                    right = ?frame.x_right,
                    y_max = frame.y.max,
                    depth = self.history.len(),
                    "zoom frame committed"
                );
                true
            }
            None => false,
        }
    }

    /// Step back to the previous frame. Cancels an in-progress drag.
    pub fn undo(&mut self) -> bool {
        let moved = self.history.undo();
        self.state = self.resting_state();
        moved
    }

    /// Step forward to the next frame. Cancels an in-progress drag.
    pub fn redo(&mut self) -> bool {
        let moved = self.history.redo();
        self.state = self.resting_state();
        moved
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Return to the full window as a new history entry, so the reset
    /// itself can be undone. On an empty history the base frame is seeded
    /// first, as for any commit.
    pub fn reset(&mut self, series: &[PriceRecord]) {
        let full = ZoomFrame::full(full_y_domain(series));
        self.history.commit(full, full);
        self.state = ZoomState::Idle;
        debug!(depth = self.history.len(), "zoom reset");
    }

    /// Forget all frames (new series loaded).
    pub fn clear(&mut self) {
        self.history.clear();
        self.state = ZoomState::Idle;
    }

    /// The committed frame in effect, if it narrows the window.
    pub fn active_frame(&self) -> Option<&ZoomFrame> {
        self.history.current().filter(|f| !f.is_full())
    }

    /// Records of `series` inside the active frame (all of them when idle).
    pub fn visible<'a>(&self, series: &'a [PriceRecord]) -> Vec<&'a PriceRecord> {
        match self.active_frame() {
            Some(frame) => series.iter().filter(|r| frame.contains(r.date)).collect(),
            None => series.iter().collect(),
        }
    }

    /// Y-domain to draw with: the active frame's, else computed from `series`.
    pub fn y_domain(&self, series: &[PriceRecord]) -> YDomain {
        match self.active_frame() {
            Some(frame) => frame.y,
            None => full_y_domain(series),
        }
    }

    fn resting_state(&self) -> ZoomState {
        if self.active_frame().is_some() {
            ZoomState::Zoomed
        } else {
            ZoomState::Idle
        }
    }
}

impl Default for ZoomNavigator {
    fn default() -> Self {
        Self::new()
    }
}
