use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use tessera_core::{AppError, AppResult, CallerIdentity, TenantName};
use tessera_domain::{CapabilityLevel, CapabilitySet, IamAction, PolicyDecision};

use crate::AuthorizationService;
use crate::role_ports::{
    CapabilityProvider, PolicyEngine, RoleOperationKind, RoleOutcome, RoleParams, RoleStore,
};
use crate::role_repository::RoleRepository;

use super::RoleService;

const TRUST_POLICY: &str = r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Principal":{"Service":"s3"},"Action":"sts:AssumeRole"}]}"#;
const PERMISSION_POLICY: &str =
    r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Action":"s3:GetObject","Resource":"*"}]}"#;

#[derive(Default)]
struct FakeRoleStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

#[async_trait]
impl RoleStore for FakeRoleStore {
    async fn get(&self, key: &str) -> AppResult<Vec<u8>> {
        self.entries
            .lock()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::NotFound(key.to_owned()))
    }

    async fn put(&self, key: &str, value: Vec<u8>, exclusive: bool) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        if exclusive && entries.contains_key(key) {
            return Err(AppError::AlreadyExists(key.to_owned()));
        }
        entries.insert(key.to_owned(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries
            .lock()
            .await
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(key.to_owned()))
    }

    async fn scan(&self, prefix: &str) -> AppResult<Vec<String>> {
        Ok(self
            .entries
            .lock()
            .await
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

struct FakeCapabilityProvider {
    capabilities: CapabilitySet,
}

#[async_trait]
impl CapabilityProvider for FakeCapabilityProvider {
    async fn has_capability(
        &self,
        _caller: &CallerIdentity,
        level: CapabilityLevel,
    ) -> AppResult<bool> {
        Ok(self.capabilities.allows(level))
    }
}

#[derive(Default)]
struct FakePolicyEngine {
    denied_resources: BTreeSet<String>,
    evaluated: Mutex<Vec<(IamAction, String)>>,
}

#[async_trait]
impl PolicyEngine for FakePolicyEngine {
    async fn evaluate(
        &self,
        _caller: &CallerIdentity,
        action: IamAction,
        resource_arn: &str,
    ) -> AppResult<PolicyDecision> {
        self.evaluated
            .lock()
            .await
            .push((action, resource_arn.to_owned()));

        if self.denied_resources.contains(resource_arn) || self.denied_resources.contains("*") {
            return Ok(PolicyDecision::Deny);
        }
        Ok(PolicyDecision::Allow)
    }
}

struct Harness {
    service: RoleService,
    store: Arc<FakeRoleStore>,
    policy_engine: Arc<FakePolicyEngine>,
}

fn harness(capabilities: &str, denied_resources: &[&str]) -> Harness {
    harness_over(Arc::new(FakeRoleStore::default()), capabilities, denied_resources)
}

fn harness_over(
    store: Arc<FakeRoleStore>,
    capabilities: &str,
    denied_resources: &[&str],
) -> Harness {
    let policy_engine = Arc::new(FakePolicyEngine {
        denied_resources: denied_resources
            .iter()
            .map(|value| (*value).to_owned())
            .collect(),
        ..FakePolicyEngine::default()
    });
    let authorization = AuthorizationService::new(
        Arc::new(FakeCapabilityProvider {
            capabilities: capabilities.parse().unwrap_or_else(|_| unreachable!()),
        }),
        policy_engine.clone(),
    );
    let service = RoleService::new(RoleRepository::new(store.clone()), authorization);

    Harness {
        service,
        store,
        policy_engine,
    }
}

fn caller() -> CallerIdentity {
    CallerIdentity::new(
        "alice",
        TenantName::new("acme").unwrap_or_else(|_| unreachable!()),
    )
}

fn create_params(name: &str, path: &str) -> RoleParams {
    RoleParams {
        role_name: Some(name.to_owned()),
        path: Some(path.to_owned()),
        trust_policy: Some(TRUST_POLICY.to_owned()),
        ..RoleParams::default()
    }
}

fn name_params(name: &str) -> RoleParams {
    RoleParams {
        role_name: Some(name.to_owned()),
        ..RoleParams::default()
    }
}

fn policy_params(role_name: &str, policy_name: &str) -> RoleParams {
    RoleParams {
        role_name: Some(role_name.to_owned()),
        policy_name: Some(policy_name.to_owned()),
        policy_document: Some(PERMISSION_POLICY.to_owned()),
        ..RoleParams::default()
    }
}

async fn create(harness: &Harness, name: &str, path: &str) -> AppResult<RoleOutcome> {
    harness
        .service
        .execute(
            &caller(),
            RoleOperationKind::CreateRole,
            &create_params(name, path),
        )
        .await
}

#[tokio::test]
async fn created_role_reads_back_with_stable_identity() {
    let harness = harness("roles=*", &[]);

    let created = create(&harness, "deployer", "/ops/").await;
    let Ok(RoleOutcome::Created(created)) = created else {
        unreachable!();
    };

    for _ in 0..2 {
        let read = harness
            .service
            .execute(&caller(), RoleOperationKind::GetRole, &name_params("deployer"))
            .await;
        let Ok(RoleOutcome::Role(read)) = read else {
            unreachable!();
        };
        assert_eq!(read.id(), created.id());
        assert_eq!(read.arn(), "arn:aws:iam::acme:role/ops/deployer");
        assert_eq!(read.name(), "deployer");
        assert_eq!(read.path(), "/ops/");
        assert_eq!(read.tenant().as_str(), "acme");
        assert_eq!(read.max_session_duration(), 3600);
    }
}

#[tokio::test]
async fn create_without_write_capability_touches_nothing() {
    let harness = harness("roles=read", &[]);

    let result = create(&harness, "deployer", "/").await;

    assert!(matches!(result, Err(AppError::AccessDenied(_))));
    assert!(harness.store.entries.lock().await.is_empty());
    assert!(harness.policy_engine.evaluated.lock().await.is_empty());
}

#[tokio::test]
async fn create_denied_by_policy_touches_nothing() {
    let harness = harness("roles=*", &["arn:aws:iam::acme:role/deployer"]);

    let result = create(&harness, "deployer", "/").await;

    assert!(matches!(result, Err(AppError::AccessDenied(_))));
    assert!(harness.store.entries.lock().await.is_empty());
}

#[tokio::test]
async fn duplicate_create_reports_already_exists() {
    let harness = harness("roles=*", &[]);
    let first = create(&harness, "deployer", "/").await;
    assert!(first.is_ok());

    let second = create(&harness, "deployer", "/").await;

    assert!(matches!(second, Err(AppError::AlreadyExists(_))));
    assert_eq!(harness.store.entries.lock().await.len(), 3);
}

#[tokio::test]
async fn invalid_session_duration_is_rejected_before_store() {
    let harness = harness("roles=*", &[]);
    let params = RoleParams {
        max_session_duration: Some("43201".to_owned()),
        ..create_params("deployer", "/")
    };

    let result = harness
        .service
        .execute(&caller(), RoleOperationKind::CreateRole, &params)
        .await;

    assert!(matches!(result, Err(AppError::InvalidInput(_))));
    assert!(harness.store.entries.lock().await.is_empty());
}

#[tokio::test]
async fn get_role_rechecks_resolved_arn() {
    let seeded = harness("roles=*", &[]);
    let created = create(&seeded, "deployer", "/secret/").await;
    assert!(created.is_ok());
    let harness = harness_over(
        seeded.store.clone(),
        "roles=*",
        &["arn:aws:iam::acme:role/secret/deployer"],
    );

    let result = harness
        .service
        .execute(&caller(), RoleOperationKind::GetRole, &name_params("deployer"))
        .await;

    assert!(matches!(result, Err(AppError::AccessDenied(_))));
    let evaluated = harness.policy_engine.evaluated.lock().await;
    assert_eq!(
        *evaluated,
        vec![
            (
                IamAction::GetRole,
                "arn:aws:iam::acme:role/deployer".to_owned()
            ),
            (
                IamAction::GetRole,
                "arn:aws:iam::acme:role/secret/deployer".to_owned()
            ),
        ]
    );
}

#[tokio::test]
async fn operation_kind_selects_capability_and_action() {
    let seeded = harness("roles=*", &[]);
    let created = create(&seeded, "deployer", "/").await;
    assert!(created.is_ok());
    let reader = harness_over(seeded.store.clone(), "roles=read", &[]);
    let params = RoleParams {
        trust_policy: Some(TRUST_POLICY.to_owned()),
        ..policy_params("deployer", "reader")
    };

    for kind in RoleOperationKind::all().iter().copied() {
        reader.policy_engine.evaluated.lock().await.clear();

        let result = reader.service.execute(&caller(), kind, &params).await;

        let evaluated = reader.policy_engine.evaluated.lock().await;
        match kind.required_capability() {
            CapabilityLevel::Write => {
                assert!(matches!(result, Err(AppError::AccessDenied(_))), "{kind:?}");
                assert!(evaluated.is_empty(), "{kind:?}");
            }
            CapabilityLevel::Read => {
                assert!(!evaluated.is_empty(), "{kind:?}");
                assert!(
                    evaluated
                        .iter()
                        .all(|(action, _)| *action == kind.iam_action()),
                    "{kind:?}"
                );
            }
        }
    }
    assert_eq!(seeded.store.entries.lock().await.len(), 3);
}

#[tokio::test]
async fn get_role_by_id_resolves_role() {
    let harness = harness("roles=*", &[]);
    let Ok(RoleOutcome::Created(created)) = create(&harness, "deployer", "/").await else {
        unreachable!();
    };
    let params = RoleParams {
        role_id: Some(created.id().to_owned()),
        ..RoleParams::default()
    };

    let result = harness
        .service
        .execute(&caller(), RoleOperationKind::GetRole, &params)
        .await;

    assert_eq!(result, Ok(RoleOutcome::Role(created)));
}

#[tokio::test]
async fn deleted_role_is_gone() {
    let harness = harness("roles=*", &[]);
    let created = create(&harness, "deployer", "/").await;
    assert!(created.is_ok());

    let deleted = harness
        .service
        .execute(&caller(), RoleOperationKind::DeleteRole, &name_params("deployer"))
        .await;
    let read = harness
        .service
        .execute(&caller(), RoleOperationKind::GetRole, &name_params("deployer"))
        .await;

    assert_eq!(deleted, Ok(RoleOutcome::Deleted));
    assert!(matches!(read, Err(AppError::NotFound(_))));
    assert!(harness.store.entries.lock().await.is_empty());
}

#[tokio::test]
async fn delete_of_missing_role_reports_not_found() {
    let harness = harness("roles=*", &[]);

    let result = harness
        .service
        .execute(&caller(), RoleOperationKind::DeleteRole, &name_params("ghost"))
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn failed_read_is_reported_before_permission_check() {
    let harness = harness("roles=*", &["*"]);

    let result = harness
        .service
        .execute(
            &caller(),
            RoleOperationKind::GetRolePolicy,
            &policy_params("ghost", "reader"),
        )
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(harness.policy_engine.evaluated.lock().await.is_empty());
}

#[tokio::test]
async fn read_capability_cannot_modify_role() {
    let harness = harness("roles=read", &[]);
    let params = RoleParams {
        trust_policy: Some(TRUST_POLICY.to_owned()),
        ..name_params("deployer")
    };

    let result = harness
        .service
        .execute(&caller(), RoleOperationKind::ModifyRole, &params)
        .await;

    assert!(matches!(result, Err(AppError::AccessDenied(_))));
}

#[tokio::test]
async fn modify_role_replaces_trust_policy() {
    let harness = harness("roles=*", &[]);
    let created = create(&harness, "deployer", "/").await;
    assert!(created.is_ok());
    let replacement = r#"{"Statement":[]}"#;
    let params = RoleParams {
        trust_policy: Some(replacement.to_owned()),
        ..name_params("deployer")
    };

    let modified = harness
        .service
        .execute(&caller(), RoleOperationKind::ModifyRole, &params)
        .await;
    let read = harness
        .service
        .execute(&caller(), RoleOperationKind::GetRole, &name_params("deployer"))
        .await;

    assert_eq!(modified, Ok(RoleOutcome::Modified));
    let Ok(RoleOutcome::Role(read)) = read else {
        unreachable!();
    };
    assert_eq!(read.trust_policy(), replacement);
}

#[tokio::test]
async fn malformed_trust_policy_is_rejected() {
    let harness = harness("roles=*", &[]);
    let params = RoleParams {
        trust_policy: Some("not json".to_owned()),
        ..create_params("deployer", "/")
    };

    let result = harness
        .service
        .execute(&caller(), RoleOperationKind::CreateRole, &params)
        .await;

    assert!(matches!(result, Err(AppError::InvalidInput(_))));
}

#[tokio::test]
async fn permission_policy_lifecycle() {
    let harness = harness("roles=*", &[]);
    let created = create(&harness, "deployer", "/").await;
    assert!(created.is_ok());

    for policy_name in ["reader", "writer", "reader"] {
        let result = harness
            .service
            .execute(
                &caller(),
                RoleOperationKind::PutRolePolicy,
                &policy_params("deployer", policy_name),
            )
            .await;
        assert_eq!(result, Ok(RoleOutcome::PolicyPut));
    }

    let names = harness
        .service
        .execute(
            &caller(),
            RoleOperationKind::ListRolePolicies,
            &name_params("deployer"),
        )
        .await;
    assert_eq!(
        names,
        Ok(RoleOutcome::PolicyNames(vec![
            "reader".to_owned(),
            "writer".to_owned()
        ]))
    );

    let policy = harness
        .service
        .execute(
            &caller(),
            RoleOperationKind::GetRolePolicy,
            &policy_params("deployer", "reader"),
        )
        .await;
    let Ok(RoleOutcome::Policy(policy)) = policy else {
        unreachable!();
    };
    assert_eq!(policy.role_name, "deployer");
    assert_eq!(policy.policy_document, PERMISSION_POLICY);

    let deleted = harness
        .service
        .execute(
            &caller(),
            RoleOperationKind::DeleteRolePolicy,
            &policy_params("deployer", "reader"),
        )
        .await;
    assert_eq!(deleted, Ok(RoleOutcome::PolicyDeleted));

    let missing = harness
        .service
        .execute(
            &caller(),
            RoleOperationKind::GetRolePolicy,
            &policy_params("deployer", "reader"),
        )
        .await;
    assert!(matches!(missing, Err(AppError::PolicyNotFound(_))));
}

#[tokio::test]
async fn role_with_policies_cannot_be_deleted() {
    let harness = harness("roles=*", &[]);
    let created = create(&harness, "deployer", "/").await;
    assert!(created.is_ok());
    let attached = harness
        .service
        .execute(
            &caller(),
            RoleOperationKind::PutRolePolicy,
            &policy_params("deployer", "reader"),
        )
        .await;
    assert!(attached.is_ok());

    let result = harness
        .service
        .execute(&caller(), RoleOperationKind::DeleteRole, &name_params("deployer"))
        .await;

    assert!(matches!(result, Err(AppError::DeleteConflict(_))));
}

#[tokio::test]
async fn invalid_policy_name_is_rejected() {
    let harness = harness("roles=*", &[]);
    let created = create(&harness, "deployer", "/").await;
    assert!(created.is_ok());

    let result = harness
        .service
        .execute(
            &caller(),
            RoleOperationKind::PutRolePolicy,
            &policy_params("deployer", "bad name"),
        )
        .await;

    assert!(matches!(result, Err(AppError::InvalidInput(_))));
}

#[tokio::test]
async fn list_roles_checks_prefix_resource_and_pages() {
    let harness = harness("roles=*", &[]);
    for name in ["alpha", "beta", "gamma"] {
        let created = create(&harness, name, "/").await;
        assert!(created.is_ok());
    }
    harness.policy_engine.evaluated.lock().await.clear();
    let params = RoleParams {
        max_items: Some(2),
        ..RoleParams::default()
    };

    let result = harness
        .service
        .execute(&caller(), RoleOperationKind::ListRoles, &params)
        .await;

    let Ok(RoleOutcome::Roles(listing)) = result else {
        unreachable!();
    };
    assert_eq!(listing.roles.len(), 2);
    assert!(listing.is_truncated);
    assert_eq!(listing.marker.as_deref(), Some("/$beta"));
    assert_eq!(
        harness.policy_engine.evaluated.lock().await.as_slice(),
        &[(IamAction::ListRoles, "arn:aws:iam::acme:role/*".to_owned())]
    );
}

#[tokio::test]
async fn tenant_qualified_name_targets_other_tenant() {
    let harness = harness("roles=*", &[]);
    let created = create(&harness, "ops$deployer", "/").await;
    let Ok(RoleOutcome::Created(created)) = created else {
        unreachable!();
    };

    assert_eq!(created.arn(), "arn:aws:iam::ops:role/deployer");
    let local = harness
        .service
        .execute(&caller(), RoleOperationKind::GetRole, &name_params("deployer"))
        .await;
    assert!(matches!(local, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn missing_role_name_is_invalid_input() {
    let harness = harness("roles=*", &[]);

    let result = harness
        .service
        .execute(&caller(), RoleOperationKind::DeleteRole, &RoleParams::default())
        .await;

    assert!(matches!(result, Err(AppError::InvalidInput(_))));
}
