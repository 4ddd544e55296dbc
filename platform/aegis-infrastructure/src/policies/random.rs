use aegis_domain::services::policy::Policy;
use aegis_domain::value_objects::action::{Action, ActionSpace, DiscreteAction};
use aegis_domain::value_objects::observation::Observation;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Uniformly random actions from an injected random source.
#[derive(Debug, Clone)]
pub struct RandomPolicy<R: RngCore> {
    space: ActionSpace,
    rng: R,
    seed: Option<u64>,
}

impl<R: RngCore> RandomPolicy<R> {
    pub fn new(space: ActionSpace, rng: R) -> Self {
        Self {
            space,
            rng,
            seed: None,
        }
    }
}

impl RandomPolicy<ChaCha8Rng> {
    /// Reproducible policy; `reset` rewinds the stream to the start of `seed`.
    pub fn seeded(space: ActionSpace, seed: u64) -> Self {
        Self::from_seed(space, seed)
    }
}

impl<R: RngCore + SeedableRng> RandomPolicy<R> {
    pub fn from_seed(space: ActionSpace, seed: u64) -> Self {
        Self {
            space,
            rng: R::seed_from_u64(seed),
            seed: Some(seed),
        }
    }
}

impl<R: RngCore> RandomPolicy<R> {
    fn sample(&mut self) -> Action {
        match self.space {
            ActionSpace::Discrete => {
                let index = self.rng.gen_range(0..DiscreteAction::COUNT);
                Action::from_index(index).unwrap_or_else(|_| Action::hold())
            }
            ActionSpace::Continuous { low, high } => {
                if high > low {
                    Action::Target(self.rng.gen_range(low..=high))
                } else {
                    Action::Target(low)
                }
            }
        }
    }
}

impl<R: RngCore + SeedableRng> Policy for RandomPolicy<R> {
    fn name(&self) -> &str {
        "random"
    }

    fn predict(&mut self, _observation: &Observation) -> Action {
        self.sample()
    }

    fn reset(&mut self) {
        if let Some(seed) = self.seed {
            self.rng = R::seed_from_u64(seed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RandomPolicy;
    use aegis_domain::services::policy::Policy;
    use aegis_domain::value_objects::action::{Action, ActionSpace};
    use aegis_domain::value_objects::observation::Observation;

    fn observation() -> Observation {
        Observation {
            values: vec![0.0; 4],
            window: 1,
            n_features: 1,
        }
    }

    fn draw(policy: &mut RandomPolicy<rand_chacha::ChaCha8Rng>, n: usize) -> Vec<Action> {
        let obs = observation();
        (0..n).map(|_| policy.predict(&obs)).collect()
    }

    #[test]
    fn same_seed_same_actions() {
        let mut a = RandomPolicy::seeded(ActionSpace::Discrete, 42);
        let mut b = RandomPolicy::seeded(ActionSpace::Discrete, 42);
        assert_eq!(draw(&mut a, 64), draw(&mut b, 64));
    }

    #[test]
    fn reset_replays_the_stream() {
        let mut policy = RandomPolicy::seeded(ActionSpace::Discrete, 7);
        let first = draw(&mut policy, 16);
        policy.reset();
        assert_eq!(draw(&mut policy, 16), first);
    }

    #[test]
    fn discrete_draws_cover_every_action() {
        let mut policy = RandomPolicy::seeded(ActionSpace::Discrete, 1);
        let actions = draw(&mut policy, 400);
        for expected in [Action::hold(), Action::long(), Action::short(), Action::flat()] {
            assert!(actions.contains(&expected), "missing {expected:?}");
        }
    }

    #[test]
    fn discrete_draws_follow_the_index_encoding() {
        use aegis_domain::value_objects::action::DiscreteAction;
        use rand::{Rng, SeedableRng};

        let mut policy = RandomPolicy::seeded(ActionSpace::Discrete, 11);
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(11);
        for action in draw(&mut policy, 64) {
            let index = rng.gen_range(0..DiscreteAction::COUNT);
            assert_eq!(Action::from_index(index).expect("index in range"), action);
        }
    }

    #[test]
    fn continuous_targets_stay_in_bounds() {
        let space = ActionSpace::continuous();
        let mut policy = RandomPolicy::seeded(space, 3);
        for action in draw(&mut policy, 200) {
            match action {
                Action::Target(f) => assert!((-1.0..=1.0).contains(&f)),
                other => panic!("unexpected {other:?}"),
            }
            assert!(space.validate(&action).is_ok());
        }
    }
}
