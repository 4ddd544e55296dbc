use crate::value_objects::action::Action;
use crate::value_objects::observation::Observation;
use std::collections::VecDeque;

/// Anything that turns an observation into an action.
///
/// Implementations may keep internal state (a model, an RNG, a script cursor);
/// the environment and risk manager never look inside.
pub trait Policy {
    fn name(&self) -> &str;

    fn predict(&mut self, observation: &Observation) -> Action;

    /// Called at the start of every episode.
    fn reset(&mut self) {}
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn predict(&mut self, observation: &Observation) -> Action {
        (**self).predict(observation)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HoldPolicy;

impl Policy for HoldPolicy {
    fn name(&self) -> &str {
        "hold"
    }

    fn predict(&mut self, _observation: &Observation) -> Action {
        Action::hold()
    }
}

/// Replays a fixed list of actions, then emits `fallback`.
#[derive(Debug, Clone)]
pub struct ScriptedPolicy {
    script: Vec<Action>,
    pending: VecDeque<Action>,
    fallback: Action,
}

impl ScriptedPolicy {
    pub fn new(script: Vec<Action>) -> Self {
        Self {
            pending: script.iter().copied().collect(),
            script,
            fallback: Action::hold(),
        }
    }

    pub fn with_fallback(mut self, fallback: Action) -> Self {
        self.fallback = fallback;
        self
    }
}

impl Policy for ScriptedPolicy {
    fn name(&self) -> &str {
        "scripted"
    }

    fn predict(&mut self, _observation: &Observation) -> Action {
        self.pending.pop_front().unwrap_or(self.fallback)
    }

    fn reset(&mut self) {
        self.pending = self.script.iter().copied().collect();
    }
}

/// Goes long when a feature of the newest bar is above `threshold`, short when
/// it is below `-threshold`, and holds otherwise.
#[derive(Debug, Clone)]
pub struct MomentumPolicy {
    feature_index: usize,
    threshold: f64,
}

impl MomentumPolicy {
    pub fn new(feature_index: usize, threshold: f64) -> Self {
        Self {
            feature_index,
            threshold: threshold.abs(),
        }
    }
}

impl Policy for MomentumPolicy {
    fn name(&self) -> &str {
        "momentum"
    }

    fn predict(&mut self, observation: &Observation) -> Action {
        let signal = observation
            .latest_row()
            .and_then(|row| row.get(self.feature_index))
            .copied()
            .unwrap_or(0.0);
        if signal > self.threshold {
            Action::long()
        } else if signal < -self.threshold {
            Action::short()
        } else {
            Action::hold()
        }
    }
}
