use super::*;
use ghostflow_protocols::{EventType, IntentClass, SecureEvent};

fn scope(org: &str) -> OrgScope {
    OrgScope::tenant(org).unwrap()
}

fn stored_event(org: &str, seq: u64, minutes_ago: i64) -> StoredEvent {
    StoredEvent {
        id: Uuid::new_v4(),
        event: SecureEvent {
            session_fingerprint: "ab".repeat(32),
            timestamp_bucket: "2026-08-01T10:05:00Z".into(),
            intent_vector: vec![0.1; 8],
            structural_hash: "1a2b3c4d".into(),
            org_id: org.into(),
            event_type: EventType::UserInteraction,
            intent_label: IntentClass::DataEntry,
            intent_confidence: 0.9,
            element_signature: None,
            sequence_number: seq,
        },
        device_fingerprint: "dev-1".into(),
        batch_id: "b-1".into(),
        ingested_at: Utc::now() - chrono::Duration::minutes(minutes_ago),
    }
}

fn pattern(org: &str, id: &str) -> DetectedPattern {
    let now = Utc::now();
    DetectedPattern {
        id: id.into(),
        org_id: org.into(),
        intent_sequence: vec![IntentClass::Navigation, IntentClass::DataEntry],
        structural_hashes: vec!["1a2b3c4d".into()],
        occurrences: 3,
        confidence: 0.8,
        suggested_name: Some("Lead entry".into()),
        suggested_description: None,
        first_seen: now,
        last_seen: now,
        status: PatternStatus::NeedsReview,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn test_events_are_scoped_and_ordered() {
    let store = MemoryStore::new();
    store
        .insert_events(
            &OrgScope::service(),
            vec![stored_event("o1", 1, 30), stored_event("o1", 2, 5), stored_event("o2", 1, 1)],
        )
        .await
        .unwrap();

    let rows = store.recent_events(&scope("o1"), "o1", 10).await.unwrap();
    assert_eq!(rows.len(), 2);
    // Newest first.
    assert_eq!(rows[0].event.sequence_number, 2);

    let limited = store.recent_events(&scope("o1"), "o1", 1).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn test_tenant_scope_cannot_touch_other_org() {
    let store = MemoryStore::new();
    let result = store
        .insert_events(&scope("o1"), vec![stored_event("o2", 1, 0)])
        .await;
    assert!(matches!(result, Err(StoreError::MissingOrgScope)));

    let result = store.recent_events(&scope("o1"), "o2", 10).await;
    assert!(matches!(result, Err(StoreError::MissingOrgScope)));
}

#[tokio::test]
async fn test_pattern_upsert_preserves_human_decisions() {
    let store = MemoryStore::new();
    let scope = scope("o1");

    let first = store.upsert_pattern(&scope, pattern("o1", "p1")).await.unwrap();
    assert_eq!(first.status, PatternStatus::NeedsReview);

    // A human approves it, then re-detection runs again.
    let mut approved = first.clone();
    approved.status = PatternStatus::Approved;
    store.upsert_pattern(&scope, approved).await.unwrap();

    let mut redetected = pattern("o1", "p1");
    redetected.status = PatternStatus::AutoSuggested;
    redetected.occurrences = 5;
    let merged = store.upsert_pattern(&scope, redetected).await.unwrap();

    assert_eq!(merged.status, PatternStatus::Approved, "human decision clobbered");
    assert_eq!(merged.occurrences, 5);
}

#[tokio::test]
async fn test_ghost_source_pattern_must_exist() {
    let store = MemoryStore::new();
    let scope = scope("o1");

    let mut ghost = Ghost::new("o1", "Lead entry");
    ghost.source_pattern_id = Some("missing".into());
    assert!(matches!(
        store.insert_ghost(&scope, ghost).await,
        Err(StoreError::InvalidReference(_))
    ));

    store.upsert_pattern(&scope, pattern("o1", "p1")).await.unwrap();
    let mut ghost = Ghost::new("o1", "Lead entry");
    ghost.source_pattern_id = Some("p1".into());
    assert!(store.insert_ghost(&scope, ghost).await.is_ok());
}

#[tokio::test]
async fn test_ghost_version_uniqueness() {
    let store = MemoryStore::new();
    let scope = scope("o1");
    let ghost = store.insert_ghost(&scope, Ghost::new("o1", "g")).await.unwrap();

    let version = GhostVersion::snapshot(&ghost, None);
    store.insert_ghost_version(&scope, version.clone()).await.unwrap();
    assert!(matches!(
        store.insert_ghost_version(&scope, version).await,
        Err(StoreError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_audit_log_is_append_only() {
    let store = MemoryStore::new();
    let scope = scope("o1");
    let log = ExecutionLog {
        id: Uuid::new_v4(),
        execution_id: Uuid::new_v4(),
        ghost_id: Uuid::new_v4(),
        org_id: "o1".into(),
        status: ghostflow_protocols::ExecutionStatus::Completed,
        steps: 1,
        duration_ms: 12,
        strategies_used: vec!["api".into()],
        logged_at: Utc::now(),
    };
    store.append_execution_log(&scope, log.clone()).await.unwrap();

    assert!(matches!(
        store.update_execution_log(&scope, log.clone()).await,
        Err(StoreError::AppendOnly("execution_logs"))
    ));
    assert!(matches!(
        store.delete_execution_log(&scope, log.id).await,
        Err(StoreError::AppendOnly("execution_logs"))
    ));
    assert_eq!(store.list_execution_logs(&scope, "o1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_feedback_is_append_only() {
    let store = MemoryStore::new();
    let scope = scope("o1");
    let feedback = UserFeedback {
        id: Uuid::new_v4(),
        execution_id: Uuid::new_v4(),
        ghost_id: Uuid::new_v4(),
        org_id: "o1".into(),
        user_id: "u1".into(),
        satisfaction_score: Some(4),
        corrected_actions: None,
        notes: None,
        created_at: Utc::now(),
    };
    store.append_feedback(&scope, feedback.clone()).await.unwrap();
    assert!(matches!(
        store.update_feedback(&scope, feedback.clone()).await,
        Err(StoreError::AppendOnly("user_feedback"))
    ));
    assert!(matches!(
        store.delete_feedback(&scope, feedback.id).await,
        Err(StoreError::AppendOnly("user_feedback"))
    ));
}

#[tokio::test]
async fn test_approval_expiry() {
    let store = MemoryStore::new();
    let scope = scope("o1");
    let ghost = store.insert_ghost(&scope, Ghost::new("o1", "g")).await.unwrap();
    store
        .insert_approval(&scope, ApprovalRequest::new(ghost.id, "o1", "u1"))
        .await
        .unwrap();

    let expired = store
        .expire_stale_approvals(&scope, Utc::now() + chrono::Duration::hours(25))
        .await
        .unwrap();
    assert_eq!(expired, 1);

    // Nothing pending remains to resolve.
    let resolved = store
        .resolve_pending_approval(&scope, ghost.id, ApprovalStatus::Approved, None, None)
        .await
        .unwrap();
    assert!(resolved.is_none());
}

#[tokio::test]
async fn test_org_settings_default() {
    let store = MemoryStore::new();
    let settings = store.org_settings(&scope("o1"), "o1").await.unwrap();
    assert_eq!(settings.auto_approve_threshold, 0.95);

    let mut custom = settings.clone();
    custom.max_executions_per_minute = 3;
    store.put_org_settings(&scope("o1"), custom).await.unwrap();
    let settings = store.org_settings(&scope("o1"), "o1").await.unwrap();
    assert_eq!(settings.max_executions_per_minute, 3);
}
