use crate::error::EnvError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiscreteAction {
    Hold,
    Long,
    Short,
    Flat,
}

impl DiscreteAction {
    pub const COUNT: usize = 4;

    pub fn index(self) -> usize {
        match self {
            DiscreteAction::Hold => 0,
            DiscreteAction::Long => 1,
            DiscreteAction::Short => 2,
            DiscreteAction::Flat => 3,
        }
    }
}

/// A raw decision emitted by a policy, before sizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Action {
    Discrete(DiscreteAction),
    /// Target position as a signed fraction of the risk-sized quantity.
    Target(f64),
}

impl Action {
    pub fn hold() -> Self {
        Action::Discrete(DiscreteAction::Hold)
    }

    pub fn long() -> Self {
        Action::Discrete(DiscreteAction::Long)
    }

    pub fn short() -> Self {
        Action::Discrete(DiscreteAction::Short)
    }

    pub fn flat() -> Self {
        Action::Discrete(DiscreteAction::Flat)
    }

    /// Integer encoding used by index-based policies: 0 hold, 1 long, 2 short, 3 flat.
    pub fn from_index(index: usize) -> Result<Self, EnvError> {
        let action = match index {
            0 => DiscreteAction::Hold,
            1 => DiscreteAction::Long,
            2 => DiscreteAction::Short,
            3 => DiscreteAction::Flat,
            _ => {
                return Err(EnvError::InvalidAction(format!(
                    "discrete action index {index} out of range 0..{}",
                    DiscreteAction::COUNT
                )))
            }
        };
        Ok(Action::Discrete(action))
    }

    pub fn is_hold_like(&self) -> bool {
        matches!(
            self,
            Action::Discrete(DiscreteAction::Hold) | Action::Discrete(DiscreteAction::Flat)
        )
    }
}

/// The action space an environment declares to its policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionSpace {
    #[default]
    Discrete,
    Continuous { low: f64, high: f64 },
}

impl ActionSpace {
    pub fn continuous() -> Self {
        ActionSpace::Continuous {
            low: -1.0,
            high: 1.0,
        }
    }

    /// The neutral action for this space.
    pub fn hold(&self) -> Action {
        match self {
            ActionSpace::Discrete => Action::hold(),
            ActionSpace::Continuous { .. } => Action::Target(0.0),
        }
    }

    pub fn validate(&self, action: &Action) -> Result<(), EnvError> {
        match (self, action) {
            (ActionSpace::Discrete, Action::Discrete(_)) => Ok(()),
            (ActionSpace::Continuous { low, high }, Action::Target(value)) => {
                if !value.is_finite() {
                    return Err(EnvError::InvalidAction(format!(
                        "target {value} is not finite"
                    )));
                }
                if *value < *low || *value > *high {
                    return Err(EnvError::InvalidAction(format!(
                        "target {value} outside [{low}, {high}]"
                    )));
                }
                Ok(())
            }
            (ActionSpace::Discrete, Action::Target(_)) => Err(EnvError::InvalidAction(
                "continuous target sent to a discrete action space".to_string(),
            )),
            (ActionSpace::Continuous { .. }, Action::Discrete(_)) => Err(EnvError::InvalidAction(
                "discrete action sent to a continuous action space".to_string(),
            )),
        }
    }
}
