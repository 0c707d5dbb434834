//! DuckDB schema definitions
//!
//! Analytics tables queried by the built-in views. Every table carries the
//! `project_id` tenant column. Timestamps are stored as naive UTC.

/// Complete schema SQL
pub const SCHEMA: &str = r#"
-- ═══════════════════════════════════════════════════════════════════════════════
-- Traces: one row per end-to-end request
-- ═══════════════════════════════════════════════════════════════════════════════
CREATE TABLE IF NOT EXISTS traces (
    id                  VARCHAR NOT NULL,
    project_id          VARCHAR NOT NULL,   -- Tenant isolation
    timestamp           TIMESTAMP NOT NULL,
    name                VARCHAR,
    user_id             VARCHAR,
    session_id          VARCHAR,
    release             VARCHAR,
    version             VARCHAR,
    environment         VARCHAR,
    tags                VARCHAR[],
    bookmarked          BOOLEAN DEFAULT false,
    public              BOOLEAN DEFAULT false,
    metadata            VARCHAR             -- JSON object
);

-- ═══════════════════════════════════════════════════════════════════════════════
-- Observations: spans, generations and events inside a trace
-- ═══════════════════════════════════════════════════════════════════════════════
CREATE TABLE IF NOT EXISTS observations (
    id                  VARCHAR NOT NULL,
    project_id          VARCHAR NOT NULL,
    trace_id            VARCHAR,
    name                VARCHAR,
    type                VARCHAR,            -- SPAN, GENERATION, EVENT
    level               VARCHAR,            -- DEBUG, DEFAULT, WARNING, ERROR
    environment         VARCHAR,
    provided_model_name VARCHAR,
    prompt_name         VARCHAR,
    version             VARCHAR,
    start_time          TIMESTAMP NOT NULL,
    end_time            TIMESTAMP,
    completion_start_time TIMESTAMP,
    metadata            VARCHAR,
    prompt_tokens       BIGINT,
    completion_tokens   BIGINT,
    total_tokens        BIGINT,
    input_cost          DOUBLE,
    output_cost         DOUBLE,
    total_cost          DOUBLE
);

-- ═══════════════════════════════════════════════════════════════════════════════
-- Scores: evaluations attached to traces or observations
-- ═══════════════════════════════════════════════════════════════════════════════
CREATE TABLE IF NOT EXISTS scores (
    id                  VARCHAR NOT NULL,
    project_id          VARCHAR NOT NULL,
    trace_id            VARCHAR,
    observation_id      VARCHAR,
    name                VARCHAR,
    source              VARCHAR,            -- API, EVAL, ANNOTATION
    data_type           VARCHAR,            -- NUMERIC, CATEGORICAL, BOOLEAN
    value               DOUBLE,
    string_value        VARCHAR,
    environment         VARCHAR,
    timestamp           TIMESTAMP NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_traces_project_ts ON traces(project_id, timestamp);
CREATE INDEX IF NOT EXISTS idx_observations_project_start ON observations(project_id, start_time);
CREATE INDEX IF NOT EXISTS idx_scores_project_ts ON scores(project_id, timestamp);
"#;
