use crate::entities::account::AccountState;
use crate::error::EnvError;
use crate::services::environment::{StepOutcome, TradingEnvironment};
use crate::services::policy::Policy;
use crate::value_objects::action::Action;
use crate::value_objects::observation::Observation;
use crate::value_objects::step_info::{StepInfo, TerminationReason};

/// Hooks into an episode as it runs.
pub trait EpisodeObserver {
    fn on_reset(&mut self, _observation: &Observation) {}

    fn on_step(&mut self, _action: &Action, _outcome: &StepOutcome) {}
}

impl EpisodeObserver for () {}

#[derive(Debug, Clone)]
pub struct EpisodeOutcome {
    pub total_reward: f64,
    pub steps: usize,
    pub termination: Option<TerminationReason>,
    pub account: AccountState,
    pub rewards: Vec<f64>,
    pub infos: Vec<StepInfo>,
}

pub fn run_episode<P: Policy + ?Sized>(
    env: &mut TradingEnvironment,
    policy: &mut P,
) -> Result<EpisodeOutcome, EnvError> {
    run_episode_with(env, policy, &mut ())
}

/// Resets `env` and `policy`, then alternates predict and step until done.
///
/// Invalid actions are replaced by hold; fatal environment errors end the run.
pub fn run_episode_with<P, O>(
    env: &mut TradingEnvironment,
    policy: &mut P,
    observer: &mut O,
) -> Result<EpisodeOutcome, EnvError>
where
    P: Policy + ?Sized,
    O: EpisodeObserver + ?Sized,
{
    let mut observation = env.reset()?;
    policy.reset();
    observer.on_reset(&observation);

    let mut rewards = Vec::with_capacity(env.remaining_bars());
    let mut infos = Vec::with_capacity(env.remaining_bars());

    while !env.is_done() {
        let action = policy.predict(&observation);
        let outcome = env.step_or_hold(action)?;
        observer.on_step(&action, &outcome);

        rewards.push(outcome.reward);
        infos.push(outcome.info);
        observation = outcome.observation;
    }

    Ok(EpisodeOutcome {
        total_reward: rewards.iter().sum(),
        steps: env.steps_taken(),
        termination: env.termination(),
        account: env.account().clone(),
        rewards,
        infos,
    })
}

#[cfg(test)]
mod tests {
    use super::{run_episode, run_episode_with, EpisodeObserver};
    use crate::services::environment::{EnvConfig, StepOutcome, TradingEnvironment};
    use crate::services::policy::{HoldPolicy, ScriptedPolicy};
    use crate::value_objects::action::Action;
    use crate::value_objects::bar::Bar;
    use crate::value_objects::market_series::MarketSeries;
    use crate::value_objects::observation::Observation;
    use crate::value_objects::step_info::TerminationReason;

    fn env(n: usize) -> TradingEnvironment {
        let bars = (0..n)
            .map(|i| {
                let c = 100.0 + i as f64;
                Bar::new(i as i64 * 60, c, c, c, c, 1.0).with_features(vec![1.0])
            })
            .collect();
        let series = MarketSeries::new("TEST", vec!["one".to_string()], bars).unwrap();
        TradingEnvironment::new(
            series,
            EnvConfig {
                observation_window_size: 2,
                ..EnvConfig::default()
            },
        )
        .unwrap()
    }

    #[derive(Default)]
    struct Counter {
        resets: usize,
        steps: usize,
    }

    impl EpisodeObserver for Counter {
        fn on_reset(&mut self, _observation: &Observation) {
            self.resets += 1;
        }

        fn on_step(&mut self, _action: &Action, _outcome: &StepOutcome) {
            self.steps += 1;
        }
    }

    #[test]
    fn hold_episode_runs_to_end_of_data() {
        let mut env = env(8);
        let outcome = run_episode(&mut env, &mut HoldPolicy).unwrap();
        assert_eq!(outcome.steps, 6);
        assert_eq!(outcome.termination, Some(TerminationReason::EndOfData));
        assert_eq!(outcome.account.equity_history.len(), outcome.steps + 1);
        assert_eq!(outcome.total_reward, 0.0);
    }

    #[test]
    fn observer_sees_every_step() {
        let mut env = env(6);
        let mut counter = Counter::default();
        let mut policy = ScriptedPolicy::new(vec![Action::long()]);
        let outcome = run_episode_with(&mut env, &mut policy, &mut counter).unwrap();
        assert_eq!(counter.resets, 1);
        assert_eq!(counter.steps, outcome.steps);
        assert!(outcome.total_reward > 0.0);
    }

    #[test]
    fn episodes_are_repeatable() {
        let mut env = env(10);
        let mut policy = ScriptedPolicy::new(vec![Action::long(), Action::hold(), Action::short()]);
        let first = run_episode(&mut env, &mut policy).unwrap();
        let second = run_episode(&mut env, &mut policy).unwrap();
        assert_eq!(first.rewards, second.rewards);
        assert_eq!(first.account, second.account);
    }
}
