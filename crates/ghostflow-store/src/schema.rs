//! Reference DDL for the relational backend.
//!
//! The in-memory store enforces the same invariants these policies do; a
//! production deployment runs this schema against Postgres with row
//! security keyed on `app.current_org`.

/// Full schema, one statement batch.
pub const SCHEMA: &str = r#"
-- Ingested secure events
CREATE TABLE IF NOT EXISTS secure_events (
    id UUID PRIMARY KEY,
    session_fingerprint TEXT NOT NULL,
    timestamp_bucket TIMESTAMPTZ NOT NULL,
    intent_vector REAL[] NOT NULL,
    structural_hash TEXT NOT NULL,
    org_id TEXT NOT NULL,
    event_type TEXT NOT NULL CHECK (event_type IN ('dom_mut', 'user_int', 'network', 'error')),
    intent_label TEXT NOT NULL,
    intent_confidence REAL NOT NULL CHECK (intent_confidence BETWEEN 0 AND 1),
    element_signature TEXT,
    sequence_number BIGINT NOT NULL,
    device_fingerprint TEXT NOT NULL,
    batch_id TEXT NOT NULL,
    ingested_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_secure_events_org_time ON secure_events(org_id, ingested_at DESC);
CREATE INDEX IF NOT EXISTS idx_secure_events_session ON secure_events(session_fingerprint, sequence_number);

-- Detected workflow patterns
CREATE TABLE IF NOT EXISTS detected_patterns (
    id TEXT PRIMARY KEY,
    org_id TEXT NOT NULL,
    intent_sequence TEXT[] NOT NULL,
    structural_hashes TEXT[] NOT NULL,
    occurrences INTEGER NOT NULL CHECK (occurrences >= 3),
    confidence REAL NOT NULL CHECK (confidence BETWEEN 0 AND 1),
    suggested_name TEXT,
    suggested_description TEXT,
    first_seen TIMESTAMPTZ NOT NULL,
    last_seen TIMESTAMPTZ NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('needs_review', 'auto_suggested', 'approved', 'dismissed')),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_detected_patterns_org ON detected_patterns(org_id, status);

-- Ghost templates
CREATE TABLE IF NOT EXISTS ghosts (
    id UUID PRIMARY KEY,
    org_id TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    version INTEGER NOT NULL DEFAULT 1,
    status TEXT NOT NULL CHECK (status IN ('pending_approval', 'approved', 'active', 'paused', 'archived')),
    trigger JSONB NOT NULL,
    parameters JSONB NOT NULL DEFAULT '[]',
    execution_plan JSONB NOT NULL DEFAULT '[]',
    confidence REAL,
    source_pattern_id TEXT REFERENCES detected_patterns(id),
    created_by TEXT,
    approved_by TEXT,
    is_active BOOLEAN NOT NULL DEFAULT false,
    usage_stats JSONB NOT NULL DEFAULT '{}',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CHECK (NOT is_active OR status IN ('approved', 'active'))
);
CREATE INDEX IF NOT EXISTS idx_ghosts_org ON ghosts(org_id, status);

-- Immutable version snapshots
CREATE TABLE IF NOT EXISTS ghost_versions (
    id UUID PRIMARY KEY,
    ghost_id UUID NOT NULL REFERENCES ghosts(id),
    version INTEGER NOT NULL,
    execution_plan JSONB NOT NULL,
    parameters JSONB NOT NULL,
    trigger JSONB NOT NULL,
    change_description TEXT,
    created_by TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (ghost_id, version)
);

-- Executions and their step ledger
CREATE TABLE IF NOT EXISTS executions (
    id UUID PRIMARY KEY,
    ghost_id UUID NOT NULL REFERENCES ghosts(id),
    status TEXT NOT NULL CHECK (status IN ('running', 'completed', 'failed', 'cancelled')),
    parameters JSONB NOT NULL DEFAULT '{}',
    trigger TEXT NOT NULL,
    step_count INTEGER NOT NULL DEFAULT 0,
    started_at TIMESTAMPTZ NOT NULL,
    completed_at TIMESTAMPTZ,
    error TEXT,
    CHECK (completed_at IS NULL OR completed_at >= started_at)
);

CREATE TABLE IF NOT EXISTS execution_steps (
    id UUID PRIMARY KEY,
    execution_id UUID NOT NULL REFERENCES executions(id),
    node_id TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('pending', 'running', 'completed', 'failed', 'skipped')),
    strategy TEXT NOT NULL,
    duration_ms BIGINT NOT NULL DEFAULT 0,
    output JSONB,
    error TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_execution_steps_execution ON execution_steps(execution_id, created_at);

-- Append-only audit ledger: no UPDATE or DELETE policy is ever granted
CREATE TABLE IF NOT EXISTS execution_logs (
    id UUID PRIMARY KEY,
    execution_id UUID NOT NULL,
    ghost_id UUID NOT NULL,
    org_id TEXT NOT NULL,
    status TEXT NOT NULL,
    steps INTEGER NOT NULL,
    duration_ms BIGINT NOT NULL,
    strategies_used TEXT[] NOT NULL,
    logged_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_execution_logs_org ON execution_logs(org_id, logged_at DESC);

-- Approval requests, auto-expiring after 24 hours
CREATE TABLE IF NOT EXISTS approval_requests (
    id UUID PRIMARY KEY,
    ghost_id UUID NOT NULL REFERENCES ghosts(id),
    execution_id UUID,
    org_id TEXT NOT NULL,
    requested_by TEXT NOT NULL,
    approved_by TEXT,
    status TEXT NOT NULL CHECK (status IN ('pending', 'approved', 'rejected', 'expired')),
    reason TEXT,
    decision_note TEXT,
    expires_at TIMESTAMPTZ NOT NULL DEFAULT now() + interval '24 hours',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    resolved_at TIMESTAMPTZ
);

-- Append-only user feedback
CREATE TABLE IF NOT EXISTS user_feedback (
    id UUID PRIMARY KEY,
    execution_id UUID NOT NULL,
    ghost_id UUID NOT NULL,
    org_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    satisfaction_score INTEGER CHECK (satisfaction_score BETWEEN 1 AND 5),
    corrected_actions JSONB,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Per-tenant configuration
CREATE TABLE IF NOT EXISTS org_settings (
    org_id TEXT PRIMARY KEY,
    settings JSONB NOT NULL DEFAULT '{}',
    auto_approve_threshold REAL NOT NULL DEFAULT 0.95,
    max_executions_per_minute INTEGER NOT NULL DEFAULT 10,
    llm_provider TEXT,
    llm_model TEXT,
    require_approval_above_value NUMERIC
);

CREATE TABLE IF NOT EXISTS automation_policies (
    id UUID PRIMARY KEY,
    org_id TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    condition JSONB NOT NULL DEFAULT '{}',
    action TEXT NOT NULL CHECK (action IN ('require_approval', 'block', 'notify', 'allow')),
    is_active BOOLEAN NOT NULL DEFAULT true
);
"#;

/// Tables every tenant-scoped policy applies to.
pub const TENANT_TABLES: [&str; 10] = [
    "secure_events",
    "detected_patterns",
    "ghosts",
    "ghost_versions",
    "executions",
    "execution_steps",
    "execution_logs",
    "approval_requests",
    "user_feedback",
    "automation_policies",
];

/// Tables that forbid UPDATE and DELETE entirely.
pub const APPEND_ONLY_TABLES: [&str; 2] = ["execution_logs", "user_feedback"];
