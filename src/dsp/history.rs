/*
History Buffer
==============

A circular store of past scalar values, addressed by lag from the most recent
write. It backs every time-domain memory in the engine: the history-read node,
feedback delays, the biquad taps and the binaural panner.

  lag 0   the value pushed this tick
  lag 1   the value pushed one tick ago
  lag k   the value pushed k ticks ago, or 0 if nothing was recorded there

The buffer starts with a single zero slot and grows lazily. Reading a lag
that does not fit inserts zeros just after the write cursor, which is where
the oldest entries live:

    before  [a b c]        cursor on c, len 3
    read(4) [a b c 0 0]    cursor still on c, len 5

Every value that was reachable before the growth is still at the same lag
afterwards, and the new slots read as silence. A delay line therefore only
costs as much memory as the longest lag ever requested.

Values pushed while the buffer was shorter than a later-requested lag are
not recovered: growth never invents history, it only makes room for it.
*/

/// Largest lag any history read may request (about 95 s at 44.1 kHz).
pub const MAX_HISTORY_LAG: usize = 1 << 22;

#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    buffer: Vec<f64>,
    cursor: usize,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self {
            buffer: vec![0.0],
            cursor: 0,
        }
    }

    /// Pre-size the buffer so lags up to `lag` never allocate.
    pub fn with_lag(lag: usize) -> Self {
        let mut history = Self::new();
        history.reserve_lag(lag);
        history
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Record `value` as lag 0, shifting everything else one lag back.
    pub fn push(&mut self, value: f64) {
        self.cursor = (self.cursor + 1) % self.buffer.len();
        self.buffer[self.cursor] = value;
    }

    /// Read the value recorded `lag` pushes ago, growing the buffer if needed.
    pub fn get(&mut self, lag: usize) -> f64 {
        self.reserve_lag(lag);
        let len = self.buffer.len();
        self.buffer[(self.cursor + len - lag) % len]
    }

    /// Read without growing; lags past the current length are silence.
    pub fn peek(&self, lag: usize) -> f64 {
        let len = self.buffer.len();
        if lag >= len {
            return 0.0;
        }
        self.buffer[(self.cursor + len - lag) % len]
    }

    fn reserve_lag(&mut self, lag: usize) {
        let len = self.buffer.len();
        if lag < len {
            return;
        }
        let extra = lag - len + 1;
        let at = self.cursor + 1;
        self.buffer.splice(at..at, std::iter::repeat_n(0.0, extra));
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}
