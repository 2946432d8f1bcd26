use async_trait::async_trait;
use regex::Regex;
use tessera_application::PolicyEngine;
use tessera_core::{AppError, AppResult, CallerIdentity};
use tessera_domain::{IamAction, PolicyDecision};

use crate::PolicyRule;

/// Policy engine evaluating a fixed list of wildcard rules.
///
/// An explicit deny wins over any allow; no matching rule means deny.
#[derive(Debug, Clone)]
pub struct StaticPolicyEngine {
    rules: Vec<CompiledRule>,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    effect: PolicyDecision,
    principals: Vec<Regex>,
    actions: Vec<Regex>,
    resources: Vec<Regex>,
}

impl StaticPolicyEngine {
    /// Compiles the rules into matchers.
    pub fn new(rules: Vec<PolicyRule>) -> AppResult<Self> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                Ok(CompiledRule {
                    effect: rule.effect,
                    principals: compile_patterns(rule.principals.as_slice())?,
                    actions: compile_patterns(rule.actions.as_slice())?,
                    resources: compile_patterns(rule.resources.as_slice())?,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self { rules })
    }
}

#[async_trait]
impl PolicyEngine for StaticPolicyEngine {
    async fn evaluate(
        &self,
        caller: &CallerIdentity,
        action: IamAction,
        resource_arn: &str,
    ) -> AppResult<PolicyDecision> {
        let principal = caller.principal_arn();
        let mut decision = PolicyDecision::Deny;

        for rule in self.rules.iter().filter(|rule| {
            matches_any(&rule.principals, principal.as_str())
                && matches_any(&rule.actions, action.as_str())
                && matches_any(&rule.resources, resource_arn)
        }) {
            match rule.effect {
                PolicyDecision::Deny => return Ok(PolicyDecision::Deny),
                PolicyDecision::Allow => decision = PolicyDecision::Allow,
            }
        }

        Ok(decision)
    }
}

fn compile_patterns(patterns: &[String]) -> AppResult<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| compile_pattern(pattern.as_str()))
        .collect()
}

fn compile_pattern(pattern: &str) -> AppResult<Regex> {
    let mut expression = String::with_capacity(pattern.len() + 2);
    expression.push('^');
    for character in pattern.chars() {
        match character {
            '*' => expression.push_str(".*"),
            '?' => expression.push('.'),
            other => expression.push_str(regex::escape(other.encode_utf8(&mut [0; 4])).as_str()),
        }
    }
    expression.push('$');

    Regex::new(expression.as_str()).map_err(|error| {
        AppError::InvalidInput(format!("invalid policy pattern '{pattern}': {error}"))
    })
}

fn matches_any(patterns: &[Regex], value: &str) -> bool {
    patterns.iter().any(|pattern| pattern.is_match(value))
}

#[cfg(test)]
mod tests {
    use tessera_application::PolicyEngine;
    use tessera_core::{CallerIdentity, TenantName};
    use tessera_domain::{IamAction, PolicyDecision};

    use crate::PolicyRule;

    use super::StaticPolicyEngine;

    fn rule(effect: PolicyDecision, actions: &[&str], resources: &[&str]) -> PolicyRule {
        PolicyRule {
            effect,
            principals: vec!["arn:aws:iam::acme:user/*".to_owned()],
            actions: actions.iter().map(|value| (*value).to_owned()).collect(),
            resources: resources.iter().map(|value| (*value).to_owned()).collect(),
        }
    }

    fn caller(tenant: &str) -> CallerIdentity {
        CallerIdentity::new(
            "alice",
            TenantName::new(tenant).unwrap_or_else(|_| unreachable!()),
        )
    }

    fn engine() -> StaticPolicyEngine {
        StaticPolicyEngine::new(vec![
            rule(PolicyDecision::Allow, &["iam:*"], &["arn:aws:iam::acme:role/*"]),
            rule(
                PolicyDecision::Deny,
                &["iam:DeleteRole"],
                &["arn:aws:iam::acme:role/protected/*"],
            ),
        ])
        .unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn matching_allow_allows() {
        let decision = engine()
            .evaluate(
                &caller("acme"),
                IamAction::GetRole,
                "arn:aws:iam::acme:role/deployer",
            )
            .await;

        assert_eq!(decision, Ok(PolicyDecision::Allow));
    }

    #[tokio::test]
    async fn explicit_deny_wins() {
        let decision = engine()
            .evaluate(
                &caller("acme"),
                IamAction::DeleteRole,
                "arn:aws:iam::acme:role/protected/root",
            )
            .await;

        assert_eq!(decision, Ok(PolicyDecision::Deny));
    }

    #[tokio::test]
    async fn unmatched_principal_is_implicitly_denied() {
        let decision = engine()
            .evaluate(
                &caller("other"),
                IamAction::GetRole,
                "arn:aws:iam::acme:role/deployer",
            )
            .await;

        assert_eq!(decision, Ok(PolicyDecision::Deny));
    }

    #[tokio::test]
    async fn question_mark_matches_one_character() {
        let engine = StaticPolicyEngine::new(vec![rule(
            PolicyDecision::Allow,
            &["iam:GetRole"],
            &["arn:aws:iam::acme:role/app?"],
        )])
        .unwrap_or_else(|_| unreachable!());

        let single = engine
            .evaluate(&caller("acme"), IamAction::GetRole, "arn:aws:iam::acme:role/app1")
            .await;
        let double = engine
            .evaluate(&caller("acme"), IamAction::GetRole, "arn:aws:iam::acme:role/app12")
            .await;

        assert_eq!(single, Ok(PolicyDecision::Allow));
        assert_eq!(double, Ok(PolicyDecision::Deny));
    }
}
