use crate::config::{PolicyConfig, PolicyKind};
use aegis_domain::services::policy::{HoldPolicy, MomentumPolicy, Policy, ScriptedPolicy};
use aegis_domain::value_objects::action::{Action, ActionSpace};
use aegis_domain::value_objects::market_series::MarketSeries;

pub type PolicyFactoryResult = Result<Box<dyn Policy + Send>, String>;

/// Builds the policy for one episode; `episode` lets callers derive per-episode seeds.
pub type PolicyFactory<'a> =
    dyn Fn(&PolicyConfig, &MarketSeries, usize) -> PolicyFactoryResult + Sync + 'a;

/// Builds the rule-based policies that need no external random source.
pub fn build_rule_policy(
    config: &PolicyConfig,
    series: &MarketSeries,
    space: ActionSpace,
) -> PolicyFactoryResult {
    match config.kind {
        PolicyKind::Hold => Ok(Box::new(HoldPolicy)),
        PolicyKind::Momentum => {
            let feature = config.feature.as_deref().unwrap_or("ret");
            let index = series
                .feature_index(feature)
                .ok_or_else(|| format!("policy.feature '{feature}' is not a feature column"))?;
            let threshold = config.threshold.unwrap_or(0.0);
            if !threshold.is_finite() {
                return Err("policy.threshold must be finite".to_string());
            }
            Ok(Box::new(MomentumPolicy::new(index, threshold)))
        }
        PolicyKind::Scripted => {
            let raw = config
                .actions
                .as_ref()
                .ok_or_else(|| "policy.kind=scripted requires policy.actions".to_string())?;
            let script = raw
                .iter()
                .map(|token| parse_action(token, space))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Box::new(
                ScriptedPolicy::new(script).with_fallback(space.hold()),
            ))
        }
        PolicyKind::Random => {
            Err("policy.kind=random needs a random source from the caller".to_string())
        }
    }
}

/// Parses `hold`/`long`/`short`/`flat` (discrete) or a number (continuous target).
pub fn parse_action(token: &str, space: ActionSpace) -> Result<Action, String> {
    let action = match token.trim().to_lowercase().as_str() {
        "hold" => Action::hold(),
        "long" | "buy" => Action::long(),
        "short" | "sell" => Action::short(),
        "flat" => Action::flat(),
        other => other
            .parse::<f64>()
            .map(Action::Target)
            .map_err(|_| format!("invalid action '{token}'"))?,
    };
    space.validate(&action).map_err(|err| err.to_string())?;
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::{build_rule_policy, parse_action};
    use crate::config::{PolicyConfig, PolicyKind};
    use crate::features::{FeatureConfig, FeaturePipeline};
    use crate::synthetic::synthetic_bars;
    use aegis_domain::value_objects::action::{Action, ActionSpace};

    fn policy_config(kind: PolicyKind) -> PolicyConfig {
        PolicyConfig {
            kind,
            feature: None,
            threshold: None,
            actions: None,
        }
    }

    #[test]
    fn parses_discrete_and_continuous_tokens() {
        assert_eq!(parse_action("LONG", ActionSpace::Discrete).unwrap(), Action::long());
        assert_eq!(
            parse_action("-0.5", ActionSpace::continuous()).unwrap(),
            Action::Target(-0.5)
        );
        assert!(parse_action("0.5", ActionSpace::Discrete).is_err());
        assert!(parse_action("jump", ActionSpace::Discrete).is_err());
    }

    #[test]
    fn builds_rule_policies_against_the_schema() {
        let pipeline = FeaturePipeline::new(FeatureConfig::default()).unwrap();
        let series = pipeline
            .build_series("BTCUSD", &synthetic_bars(50, 1), None)
            .unwrap();

        let hold = build_rule_policy(&policy_config(PolicyKind::Hold), &series, ActionSpace::Discrete)
            .unwrap();
        assert_eq!(hold.name(), "hold");

        let momentum = build_rule_policy(
            &policy_config(PolicyKind::Momentum),
            &series,
            ActionSpace::Discrete,
        )
        .unwrap();
        assert_eq!(momentum.name(), "momentum");

        let mut missing = policy_config(PolicyKind::Momentum);
        missing.feature = Some("nope".to_string());
        assert!(build_rule_policy(&missing, &series, ActionSpace::Discrete).is_err());

        assert!(
            build_rule_policy(&policy_config(PolicyKind::Random), &series, ActionSpace::Discrete)
                .is_err()
        );
    }
}
