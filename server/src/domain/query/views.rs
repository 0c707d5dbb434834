//! Built-in views over traces, observations and scores

use super::registry::{
    COUNT_ONLY, Capabilities, ColumnExpr, FieldDescriptor, JoinSpec, TableRef, ValueType,
    ViewDescriptor,
};

// ============================================================================
// Relations
// ============================================================================

const TRACES: TableRef = TableRef {
    table: "traces",
    alias: "t",
    tenant_column: "project_id",
};

const OBSERVATIONS: TableRef = TableRef {
    table: "observations",
    alias: "o",
    tenant_column: "project_id",
};

const SCORES: TableRef = TableRef {
    table: "scores",
    alias: "s",
    tenant_column: "project_id",
};

// ============================================================================
// Field constructors
// ============================================================================

const fn dimension(
    name: &'static str,
    table: &'static str,
    column: &'static str,
    value_type: ValueType,
) -> FieldDescriptor {
    FieldDescriptor {
        name,
        expr: ColumnExpr::Column { table, column },
        value_type,
        capabilities: Capabilities::DIMENSION,
        aggregations: None,
    }
}

const fn filter_only(
    name: &'static str,
    table: &'static str,
    column: &'static str,
    value_type: ValueType,
) -> FieldDescriptor {
    FieldDescriptor {
        name,
        expr: ColumnExpr::Column { table, column },
        value_type,
        capabilities: Capabilities::FILTER,
        aggregations: None,
    }
}

const fn measure(name: &'static str, table: &'static str, column: &'static str) -> FieldDescriptor {
    FieldDescriptor {
        name,
        expr: ColumnExpr::Column { table, column },
        value_type: ValueType::Number,
        capabilities: Capabilities::MEASURE,
        aggregations: None,
    }
}

const fn duration(
    name: &'static str,
    table: &'static str,
    start: &'static str,
    end: &'static str,
) -> FieldDescriptor {
    FieldDescriptor {
        name,
        expr: ColumnExpr::DurationMs { table, start, end },
        value_type: ValueType::Number,
        capabilities: Capabilities::MEASURE,
        aggregations: None,
    }
}

const fn row_count(name: &'static str) -> FieldDescriptor {
    FieldDescriptor {
        name,
        expr: ColumnExpr::RowCount,
        value_type: ValueType::Number,
        capabilities: Capabilities::COUNT,
        aggregations: Some(COUNT_ONLY),
    }
}

const fn distinct_count(
    name: &'static str,
    table: &'static str,
    column: &'static str,
) -> FieldDescriptor {
    FieldDescriptor {
        name,
        expr: ColumnExpr::DistinctCount { table, column },
        value_type: ValueType::Number,
        capabilities: Capabilities::COUNT,
        aggregations: Some(COUNT_ONLY),
    }
}

// ============================================================================
// Trace fields (shared by the trace views)
// ============================================================================

const TRACE_ID: FieldDescriptor = dimension("id", "t", "id", ValueType::String);
const TRACE_NAME: FieldDescriptor = dimension("name", "t", "name", ValueType::StringOptions);
const TRACE_USER_ID: FieldDescriptor = dimension("userId", "t", "user_id", ValueType::String);
const TRACE_SESSION_ID: FieldDescriptor =
    dimension("sessionId", "t", "session_id", ValueType::String);
const TRACE_RELEASE: FieldDescriptor =
    dimension("release", "t", "release", ValueType::StringOptions);
const TRACE_VERSION: FieldDescriptor =
    dimension("version", "t", "version", ValueType::StringOptions);
const TRACE_ENVIRONMENT: FieldDescriptor =
    dimension("environment", "t", "environment", ValueType::StringOptions);
const TRACE_TAGS: FieldDescriptor = filter_only("tags", "t", "tags", ValueType::ArrayOptions);
const TRACE_BOOKMARKED: FieldDescriptor =
    dimension("bookmarked", "t", "bookmarked", ValueType::Boolean);
const TRACE_PUBLIC: FieldDescriptor = dimension("public", "t", "public", ValueType::Boolean);
const TRACE_METADATA: FieldDescriptor =
    filter_only("metadata", "t", "metadata", ValueType::StringObject);
const TRACE_TIMESTAMP: FieldDescriptor =
    filter_only("timestamp", "t", "timestamp", ValueType::Datetime);

// ============================================================================
// Views
// ============================================================================

pub static BUILTIN_VIEWS: &[ViewDescriptor] = &[
    ViewDescriptor {
        name: "traces",
        description: "One row per trace",
        base: TRACES,
        joins: &[],
        time_field: "timestamp",
        fields: &[
            TRACE_ID,
            TRACE_NAME,
            TRACE_USER_ID,
            TRACE_SESSION_ID,
            TRACE_RELEASE,
            TRACE_VERSION,
            TRACE_ENVIRONMENT,
            TRACE_TAGS,
            TRACE_BOOKMARKED,
            TRACE_PUBLIC,
            TRACE_METADATA,
            TRACE_TIMESTAMP,
            row_count("count"),
        ],
    },
    ViewDescriptor {
        name: "observations",
        description: "Spans, generations and events",
        base: OBSERVATIONS,
        joins: &[],
        time_field: "startTime",
        fields: &[
            dimension("id", "o", "id", ValueType::String),
            dimension("traceId", "o", "trace_id", ValueType::String),
            dimension("name", "o", "name", ValueType::StringOptions),
            dimension("type", "o", "type", ValueType::StringOptions),
            dimension("level", "o", "level", ValueType::StringOptions),
            dimension("environment", "o", "environment", ValueType::StringOptions),
            dimension(
                "providedModelName",
                "o",
                "provided_model_name",
                ValueType::StringOptions,
            ),
            dimension("promptName", "o", "prompt_name", ValueType::StringOptions),
            dimension("version", "o", "version", ValueType::StringOptions),
            filter_only("startTime", "o", "start_time", ValueType::Datetime),
            filter_only("endTime", "o", "end_time", ValueType::Datetime),
            filter_only("metadata", "o", "metadata", ValueType::StringObject),
            row_count("count"),
            duration("latency", "o", "start_time", "end_time"),
            duration("timeToFirstToken", "o", "start_time", "completion_start_time"),
            measure("promptTokens", "o", "prompt_tokens"),
            measure("completionTokens", "o", "completion_tokens"),
            measure("totalTokens", "o", "total_tokens"),
            measure("inputCost", "o", "input_cost"),
            measure("outputCost", "o", "output_cost"),
            measure("totalCost", "o", "total_cost"),
        ],
    },
    ViewDescriptor {
        name: "scores",
        description: "Evaluation scores",
        base: SCORES,
        joins: &[],
        time_field: "timestamp",
        fields: &[
            dimension("id", "s", "id", ValueType::String),
            dimension("traceId", "s", "trace_id", ValueType::String),
            dimension("observationId", "s", "observation_id", ValueType::String),
            dimension("name", "s", "name", ValueType::StringOptions),
            dimension("source", "s", "source", ValueType::StringOptions),
            dimension("dataType", "s", "data_type", ValueType::StringOptions),
            dimension("stringValue", "s", "string_value", ValueType::String),
            dimension("environment", "s", "environment", ValueType::StringOptions),
            filter_only("timestamp", "s", "timestamp", ValueType::Datetime),
            row_count("count"),
            measure("value", "s", "value"),
        ],
    },
    ViewDescriptor {
        name: "traces_observations",
        description: "Traces joined with their observations",
        base: TRACES,
        joins: &[JoinSpec {
            relation: OBSERVATIONS,
            on: &[("id", "trace_id")],
        }],
        time_field: "timestamp",
        fields: &[
            TRACE_ID,
            TRACE_NAME,
            TRACE_USER_ID,
            TRACE_SESSION_ID,
            TRACE_RELEASE,
            TRACE_VERSION,
            TRACE_ENVIRONMENT,
            TRACE_TAGS,
            TRACE_BOOKMARKED,
            TRACE_PUBLIC,
            TRACE_METADATA,
            TRACE_TIMESTAMP,
            dimension("observationName", "o", "name", ValueType::StringOptions),
            dimension("observationType", "o", "type", ValueType::StringOptions),
            dimension(
                "providedModelName",
                "o",
                "provided_model_name",
                ValueType::StringOptions,
            ),
            distinct_count("count", "t", "id"),
            distinct_count("observationsCount", "o", "id"),
            measure("totalTokens", "o", "total_tokens"),
            measure("totalCost", "o", "total_cost"),
            duration("latency", "o", "start_time", "end_time"),
        ],
    },
    ViewDescriptor {
        name: "traces_scores",
        description: "Traces joined with their scores",
        base: TRACES,
        joins: &[JoinSpec {
            relation: SCORES,
            on: &[("id", "trace_id")],
        }],
        time_field: "timestamp",
        fields: &[
            TRACE_ID,
            TRACE_NAME,
            TRACE_USER_ID,
            TRACE_SESSION_ID,
            TRACE_RELEASE,
            TRACE_VERSION,
            TRACE_ENVIRONMENT,
            TRACE_TAGS,
            TRACE_BOOKMARKED,
            TRACE_PUBLIC,
            TRACE_METADATA,
            TRACE_TIMESTAMP,
            dimension("scoreName", "s", "name", ValueType::StringOptions),
            dimension("scoreSource", "s", "source", ValueType::StringOptions),
            dimension("scoreDataType", "s", "data_type", ValueType::StringOptions),
            distinct_count("count", "t", "id"),
            distinct_count("scoresCount", "s", "id"),
            measure("scoreValue", "s", "value"),
        ],
    },
];
