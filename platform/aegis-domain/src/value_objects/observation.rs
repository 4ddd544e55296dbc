use serde::{Deserialize, Serialize};

/// Number of account-state values appended after the feature window.
pub const ACCOUNT_FEATURES: usize = 3;

/// Fixed-shape input handed to a policy.
///
/// Layout: `window * n_features` feature values, oldest bar first, followed by
/// position exposure, unrealized P&L and cash, each as a fraction of equity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub values: Vec<f64>,
    pub window: usize,
    pub n_features: usize,
}

impl Observation {
    pub fn expected_len(window: usize, n_features: usize) -> usize {
        window * n_features + ACCOUNT_FEATURES
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.window, self.n_features)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Feature values of the bar at `offset` within the window (0 = oldest).
    pub fn row(&self, offset: usize) -> Option<&[f64]> {
        if offset >= self.window {
            return None;
        }
        let start = offset * self.n_features;
        self.values.get(start..start + self.n_features)
    }

    /// Feature values of the newest bar in the window.
    pub fn latest_row(&self) -> Option<&[f64]> {
        self.window.checked_sub(1).and_then(|idx| self.row(idx))
    }

    pub fn account(&self) -> &[f64] {
        let start = self.values.len().saturating_sub(ACCOUNT_FEATURES);
        &self.values[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::Observation;

    #[test]
    fn rows_and_account_slice_follow_layout() {
        let obs = Observation {
            values: vec![1.0, 2.0, 3.0, 4.0, 0.5, 0.0, 0.5],
            window: 2,
            n_features: 2,
        };
        assert_eq!(obs.len(), Observation::expected_len(2, 2));
        assert_eq!(obs.row(0), Some(&[1.0, 2.0][..]));
        assert_eq!(obs.latest_row(), Some(&[3.0, 4.0][..]));
        assert_eq!(obs.account(), &[0.5, 0.0, 0.5]);
        assert!(obs.row(2).is_none());
    }
}
