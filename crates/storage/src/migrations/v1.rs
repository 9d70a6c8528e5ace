//! Migration v1: initial schema — the six context/audit tables.

pub(super) const SQL: &str = "
CREATE TABLE IF NOT EXISTS project_contexts (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT,
    repository_url TEXT,
    technologies TEXT NOT NULL DEFAULT '[]',
    team_members TEXT NOT NULL DEFAULT '[]',
    documentation_urls TEXT NOT NULL DEFAULT '[]',
    global_context_id TEXT,
    platform_contexts TEXT NOT NULL DEFAULT '[]',
    last_updated TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS global_contexts (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL UNIQUE REFERENCES project_contexts(id) ON DELETE CASCADE,
    shared_knowledge TEXT NOT NULL DEFAULT '{}',
    shared_conventions TEXT NOT NULL DEFAULT '{}',
    shared_resources TEXT NOT NULL DEFAULT '[]',
    common_patterns TEXT NOT NULL DEFAULT '[]',
    cross_platform_insights TEXT NOT NULL DEFAULT '{}',
    last_updated TEXT NOT NULL,
    version INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS platform_contexts (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES project_contexts(id) ON DELETE CASCADE,
    global_context_id TEXT REFERENCES global_contexts(id) ON DELETE SET NULL,
    platform_type TEXT NOT NULL,
    platform_specific_data TEXT NOT NULL DEFAULT '{}',
    learned_preferences TEXT NOT NULL DEFAULT '{}',
    interaction_history TEXT NOT NULL DEFAULT '[]',
    custom_prompts TEXT NOT NULL DEFAULT '[]',
    platform_conventions TEXT NOT NULL DEFAULT '{}',
    performance_metrics TEXT NOT NULL DEFAULT '{}',
    last_updated TEXT NOT NULL,
    version INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    UNIQUE(project_id, platform_type)
);

CREATE TABLE IF NOT EXISTS domain_contexts (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES project_contexts(id) ON DELETE CASCADE,
    domain_type TEXT NOT NULL,
    technologies TEXT NOT NULL DEFAULT '[]',
    file_patterns TEXT NOT NULL DEFAULT '[]',
    key_files TEXT NOT NULL DEFAULT '[]',
    apis TEXT NOT NULL DEFAULT '[]',
    dependencies TEXT NOT NULL DEFAULT '[]',
    conventions TEXT NOT NULL DEFAULT '{}',
    metadata TEXT NOT NULL DEFAULT '{}',
    last_updated TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE(project_id, domain_type)
);

CREATE TABLE IF NOT EXISTS ai_sessions (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES project_contexts(id) ON DELETE CASCADE,
    ai_type TEXT NOT NULL,
    ai_instance_id TEXT,
    platform_context_id TEXT REFERENCES platform_contexts(id) ON DELETE SET NULL,
    session_start TEXT NOT NULL,
    session_end TEXT,
    domains_accessed TEXT NOT NULL DEFAULT '[]',
    queries_count INTEGER NOT NULL DEFAULT 0,
    last_query TEXT,
    context_hash TEXT,
    accessed_global_context INTEGER NOT NULL DEFAULT 0,
    metadata TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS context_queries (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES project_contexts(id) ON DELETE CASCADE,
    ai_session_id TEXT REFERENCES ai_sessions(id) ON DELETE CASCADE,
    query_text TEXT NOT NULL,
    domains_filter TEXT NOT NULL DEFAULT '[]',
    response_format TEXT NOT NULL DEFAULT 'structured',
    include_history INTEGER NOT NULL DEFAULT 0,
    max_results INTEGER NOT NULL DEFAULT 100,
    timestamp TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS context_responses (
    id TEXT PRIMARY KEY,
    query_id TEXT NOT NULL REFERENCES context_queries(id) ON DELETE CASCADE,
    project_id TEXT NOT NULL REFERENCES project_contexts(id) ON DELETE CASCADE,
    results TEXT NOT NULL DEFAULT '[]',
    domains_found TEXT NOT NULL DEFAULT '[]',
    total_results INTEGER NOT NULL DEFAULT 0,
    processing_time_ms REAL NOT NULL DEFAULT 0.0,
    metadata TEXT NOT NULL DEFAULT '{}',
    timestamp TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_platform_project ON platform_contexts(project_id);
CREATE INDEX IF NOT EXISTS idx_domain_project ON domain_contexts(project_id);
CREATE INDEX IF NOT EXISTS idx_sessions_project ON ai_sessions(project_id);
CREATE INDEX IF NOT EXISTS idx_sessions_start ON ai_sessions(session_start);
CREATE INDEX IF NOT EXISTS idx_sessions_instance ON ai_sessions(ai_instance_id);
CREATE INDEX IF NOT EXISTS idx_queries_project_ts ON context_queries(project_id, timestamp);
CREATE INDEX IF NOT EXISTS idx_queries_session ON context_queries(ai_session_id);
CREATE INDEX IF NOT EXISTS idx_responses_project_ts ON context_responses(project_id, timestamp);
";
