use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Vertical axis bounds of the price chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct YDomain {
    pub min: f64,
    pub max: f64,
}

impl YDomain {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// One state in the zoom history.
///
/// `None` x-bounds mean "use the full window". When both are set,
/// `x_left <= x_right` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomFrame {
    pub x_left: Option<NaiveDate>,
    pub x_right: Option<NaiveDate>,
    pub y: YDomain,
}

impl ZoomFrame {
    /// A frame over the two given dates, ordered ascending.
    pub fn between(a: NaiveDate, b: NaiveDate, y: YDomain) -> Self {
        let (x_left, x_right) = if a <= b { (a, b) } else { (b, a) };
        Self {
            x_left: Some(x_left),
            x_right: Some(x_right),
            y,
        }
    }

    /// A frame showing the whole window.
    pub fn full(y: YDomain) -> Self {
        Self {
            x_left: None,
            x_right: None,
            y,
        }
    }

    pub fn is_full(&self) -> bool {
        self.x_left.is_none() && self.x_right.is_none()
    }

    /// Whether `date` falls inside this frame's x-range (inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.x_left.map_or(true, |l| l <= date) && self.x_right.map_or(true, |r| date <= r)
    }
}

/// Linear undo/redo history of zoom frames.
///
/// Position 0 is the implicit full-window frame pushed on the first commit,
/// so a cursor of 0 means "no zoom active". Committing after an undo drops
/// every frame ahead of the cursor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoomHistory {
    frames: Vec<ZoomFrame>,
    cursor: usize,
}

impl ZoomHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame after the cursor, discarding any redo tail.
    /// `base` seeds position 0 when the history is still empty.
    pub fn commit(&mut self, frame: ZoomFrame, base: ZoomFrame) {
        if self.frames.is_empty() {
            self.frames.push(base);
            self.cursor = 0;
        }
        self.frames.truncate(self.cursor + 1);
        self.frames.push(frame);
        self.cursor = self.frames.len() - 1;
    }

    /// Step back one frame. Returns `false` at the earliest position.
    pub fn undo(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Step forward one frame. Returns `false` at the latest position.
    pub fn redo(&mut self) -> bool {
        if self.cursor + 1 < self.frames.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.frames.len()
    }

    /// The frame at the cursor, if any frame was ever committed.
    pub fn current(&self) -> Option<&ZoomFrame> {
        self.frames.get(self.cursor)
    }

    pub fn frames(&self) -> &[ZoomFrame] {
        &self.frames
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.cursor = 0;
    }
}

/// Drag-to-zoom interaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoomState {
    /// No committed zoom; the full window is shown.
    Idle,
    /// A selection is being dragged but not yet released.
    Dragging {
        anchor: NaiveDate,
        current: Option<NaiveDate>,
    },
    /// A committed frame narrower than the window is active.
    Zoomed,
}

/// Pointer events fed to the zoom state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomEvent {
    Press(NaiveDate),
    Move(NaiveDate),
    Release,
}
