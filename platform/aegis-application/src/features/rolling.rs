use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RollingSma {
    window: usize,
    buf: VecDeque<f64>,
    sum: f64,
}

impl RollingSma {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            buf: VecDeque::with_capacity(window + 1),
            sum: 0.0,
        }
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        if self.window == 0 {
            return None;
        }

        self.buf.push_back(value);
        self.sum += value;
        while self.buf.len() > self.window {
            if let Some(front) = self.buf.pop_front() {
                self.sum -= front;
            }
        }

        (self.buf.len() == self.window).then(|| self.sum / self.window as f64)
    }
}

/// Rolling population standard deviation.
#[derive(Debug, Clone)]
pub struct RollingStd {
    window: usize,
    buf: VecDeque<f64>,
    sum: f64,
    sum_sq: f64,
}

impl RollingStd {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            buf: VecDeque::with_capacity(window + 1),
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        if self.window == 0 {
            return None;
        }

        self.buf.push_back(value);
        self.sum += value;
        self.sum_sq += value * value;
        while self.buf.len() > self.window {
            if let Some(front) = self.buf.pop_front() {
                self.sum -= front;
                self.sum_sq -= front * front;
            }
        }

        if self.buf.len() == self.window {
            let n = self.window as f64;
            let mean = self.sum / n;
            let var = (self.sum_sq / n) - mean * mean;
            Some(var.max(0.0).sqrt())
        } else {
            None
        }
    }
}

/// Relative strength index on close-to-close changes, scaled to `[0, 1]`.
#[derive(Debug, Clone)]
pub struct RollingRsi {
    window: usize,
    prev_close: Option<f64>,
    diffs: VecDeque<f64>,
    sum_gains: f64,
    sum_losses: f64,
}

impl RollingRsi {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            prev_close: None,
            diffs: VecDeque::with_capacity(window + 1),
            sum_gains: 0.0,
            sum_losses: 0.0,
        }
    }

    pub fn update(&mut self, close: f64) -> Option<f64> {
        let prev = self.prev_close.replace(close)?;
        if self.window == 0 || prev <= 0.0 || !prev.is_finite() || !close.is_finite() {
            return None;
        }

        let diff = close / prev - 1.0;
        self.diffs.push_back(diff);
        if diff > 0.0 {
            self.sum_gains += diff;
        } else {
            self.sum_losses -= diff;
        }

        while self.diffs.len() > self.window {
            if let Some(front) = self.diffs.pop_front() {
                if front > 0.0 {
                    self.sum_gains -= front;
                } else {
                    self.sum_losses += front;
                }
            }
        }

        if self.diffs.len() < self.window {
            return None;
        }

        let gains = self.sum_gains.max(0.0);
        let losses = self.sum_losses.max(0.0);
        if gains + losses == 0.0 {
            return Some(0.5);
        }
        Some(gains / (gains + losses))
    }
}

/// Average true range over `window` bars, in price units.
#[derive(Debug, Clone)]
pub struct RollingAtr {
    prev_close: Option<f64>,
    ranges: RollingSma,
}

impl RollingAtr {
    pub fn new(window: usize) -> Self {
        Self {
            prev_close: None,
            ranges: RollingSma::new(window),
        }
    }

    pub fn update(&mut self, high: f64, low: f64, close: f64) -> Option<f64> {
        let range = high - low;
        let true_range = match self.prev_close.replace(close) {
            Some(prev) => range.max((high - prev).abs()).max((low - prev).abs()),
            None => range,
        };
        self.ranges.update(true_range)
    }
}
