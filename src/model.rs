use chrono::{DateTime, Local};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Service {
    Lambda,
    Logs,
    Insights,
    Alarms,
    Buckets,
    Tables,
    Stacks,
    Workflows,
}

/// What the second pane of a service screen shows for the selected row.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SecondaryKind {
    Detail,
    History,
    Events,
    Scan,
    Query,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Column {
    pub heading: &'static str,
    pub field: &'static str,
}

impl Service {
    pub const ALL: [Self; 8] = [
        Self::Lambda,
        Self::Logs,
        Self::Insights,
        Self::Alarms,
        Self::Buckets,
        Self::Tables,
        Self::Stacks,
        Self::Workflows,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Lambda => "lambda",
            Self::Logs => "logs",
            Self::Insights => "insights",
            Self::Alarms => "alarms",
            Self::Buckets => "s3",
            Self::Tables => "dynamodb",
            Self::Stacks => "cloudformation",
            Self::Workflows => "stepfunctions",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Lambda => "Lambda",
            Self::Logs => "Log Groups",
            Self::Insights => "Log Insights",
            Self::Alarms => "Alarms",
            Self::Buckets => "S3",
            Self::Tables => "DynamoDB",
            Self::Stacks => "CloudFormation",
            Self::Workflows => "Step Functions",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "lambda" | "fn" | "functions" | "function" => Some(Self::Lambda),
            "logs" | "log-groups" | "loggroups" | "cwl" => Some(Self::Logs),
            "insights" | "query" | "logs-insights" => Some(Self::Insights),
            "alarms" | "alarm" | "cloudwatch" | "cw" | "metrics" => Some(Self::Alarms),
            "s3" | "buckets" | "bucket" => Some(Self::Buckets),
            "dynamodb" | "ddb" | "dynamo" | "tables" => Some(Self::Tables),
            "cloudformation" | "cfn" | "stacks" | "stack" => Some(Self::Stacks),
            "stepfunctions" | "sfn" | "states" | "executions" | "workflows" => {
                Some(Self::Workflows)
            }
            _ => None,
        }
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Lambda => &["fn", "functions"],
            Self::Logs => &["cwl", "log-groups"],
            Self::Insights => &["query", "logs-insights"],
            Self::Alarms => &["cloudwatch", "metrics"],
            Self::Buckets => &["buckets"],
            Self::Tables => &["ddb", "dynamo"],
            Self::Stacks => &["cfn", "stacks"],
            Self::Workflows => &["sfn", "executions"],
        }
    }

    pub fn table_name(self) -> &'static str {
        match self {
            Self::Lambda => "Functions",
            Self::Logs | Self::Insights => "Log groups",
            Self::Alarms => "Alarms",
            Self::Buckets => "Buckets",
            Self::Tables => "Tables",
            Self::Stacks => "Stacks",
            Self::Workflows => "Executions",
        }
    }

    pub fn secondary(self) -> SecondaryKind {
        match self {
            Self::Lambda | Self::Logs | Self::Buckets => SecondaryKind::Detail,
            Self::Alarms | Self::Workflows => SecondaryKind::History,
            Self::Stacks => SecondaryKind::Events,
            Self::Tables => SecondaryKind::Scan,
            Self::Insights => SecondaryKind::Query,
        }
    }

    pub fn secondary_name(self) -> &'static str {
        match self {
            Self::Lambda => "Configuration",
            Self::Logs => "Group",
            Self::Insights => "Results",
            Self::Alarms => "History",
            Self::Buckets => "Bucket",
            Self::Tables => "Items",
            Self::Stacks => "Events",
            Self::Workflows => "Execution history",
        }
    }

    pub fn columns(self) -> &'static [Column] {
        match self {
            Self::Lambda => &[
                Column {
                    heading: "Name",
                    field: "name",
                },
                Column {
                    heading: "Runtime",
                    field: "runtime",
                },
                Column {
                    heading: "Memory",
                    field: "memory",
                },
                Column {
                    heading: "Timeout",
                    field: "timeout",
                },
                Column {
                    heading: "Modified",
                    field: "last_modified",
                },
            ],
            Self::Logs | Self::Insights => &[
                Column {
                    heading: "Name",
                    field: "name",
                },
                Column {
                    heading: "Retention",
                    field: "retention",
                },
                Column {
                    heading: "Stored",
                    field: "stored_bytes",
                },
                Column {
                    heading: "Created",
                    field: "created",
                },
            ],
            Self::Alarms => &[
                Column {
                    heading: "Name",
                    field: "name",
                },
                Column {
                    heading: "State",
                    field: "state",
                },
                Column {
                    heading: "Metric",
                    field: "metric",
                },
                Column {
                    heading: "Namespace",
                    field: "namespace",
                },
                Column {
                    heading: "Updated",
                    field: "updated",
                },
            ],
            Self::Buckets => &[
                Column {
                    heading: "Name",
                    field: "name",
                },
                Column {
                    heading: "Region",
                    field: "region",
                },
                Column {
                    heading: "Created",
                    field: "created",
                },
            ],
            Self::Tables => &[
                Column {
                    heading: "Name",
                    field: "name",
                },
                Column {
                    heading: "Status",
                    field: "status",
                },
                Column {
                    heading: "Items",
                    field: "item_count",
                },
                Column {
                    heading: "Size",
                    field: "size_bytes",
                },
            ],
            Self::Stacks => &[
                Column {
                    heading: "Name",
                    field: "name",
                },
                Column {
                    heading: "Status",
                    field: "status",
                },
                Column {
                    heading: "Created",
                    field: "created",
                },
                Column {
                    heading: "Updated",
                    field: "updated",
                },
            ],
            Self::Workflows => &[
                Column {
                    heading: "Name",
                    field: "name",
                },
                Column {
                    heading: "State machine",
                    field: "state_machine",
                },
                Column {
                    heading: "Status",
                    field: "status",
                },
                Column {
                    heading: "Started",
                    field: "started",
                },
            ],
        }
    }

    pub fn secondary_columns(self) -> &'static [Column] {
        match self {
            Self::Alarms => &[
                Column {
                    heading: "Summary",
                    field: "summary",
                },
                Column {
                    heading: "Type",
                    field: "type",
                },
                Column {
                    heading: "Timestamp",
                    field: "timestamp",
                },
            ],
            Self::Stacks => &[
                Column {
                    heading: "Resource",
                    field: "resource",
                },
                Column {
                    heading: "Status",
                    field: "status",
                },
                Column {
                    heading: "Reason",
                    field: "reason",
                },
                Column {
                    heading: "Timestamp",
                    field: "timestamp",
                },
            ],
            Self::Workflows => &[
                Column {
                    heading: "Event",
                    field: "type",
                },
                Column {
                    heading: "Step",
                    field: "step",
                },
                Column {
                    heading: "Timestamp",
                    field: "timestamp",
                },
            ],
            _ => &[],
        }
    }

    /// Columns of the primary table consulted by search highlighting.
    pub fn search_columns(self) -> &'static [usize] {
        match self {
            Self::Workflows => &[0, 1],
            _ => &[0],
        }
    }

    /// Whether the primary listing is only requested through `filter`.
    pub fn filter_only(self) -> bool {
        matches!(self, Self::Workflows)
    }

    pub fn accent(self) -> Color {
        match self {
            Self::Lambda => Color::Rgb(251, 146, 60),
            Self::Logs => Color::Rgb(52, 211, 153),
            Self::Insights => Color::Rgb(45, 212, 191),
            Self::Alarms => Color::Rgb(248, 113, 113),
            Self::Buckets => Color::Rgb(132, 204, 22),
            Self::Tables => Color::Rgb(96, 165, 250),
            Self::Stacks => Color::Rgb(236, 72, 153),
            Self::Workflows => Color::Rgb(192, 132, 252),
        }
    }
}

impl Display for Service {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// One resource as a provider reports it; presentation picks fields by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        if key == "name" {
            if let Value::String(name) = value.into() {
                self.name = name;
            }
            return self;
        }
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    pub fn field_text(&self, key: &str) -> String {
        match key {
            "id" => self.id.clone(),
            "name" => self.display_name().to_string(),
            _ => self
                .fields
                .get(key)
                .map(value_text)
                .unwrap_or_else(|| "-".to_string()),
        }
    }

    /// Substring match over the canonical name field.
    pub fn matches_name(&self, needle: &str) -> bool {
        let needle = needle.trim();
        if needle.is_empty() {
            return true;
        }
        self.display_name()
            .to_ascii_lowercase()
            .contains(&needle.to_ascii_lowercase())
    }
}

pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// A dynamic-schema row: `(field, value)` pairs in source order.
pub type QueryRecord = Vec<(String, String)>;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum QueryStatus {
    Running,
    Complete,
    Failed,
}

impl QueryStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct QueryPage {
    pub status: QueryStatus,
    pub records: Vec<QueryRecord>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct QueryParams {
    pub groups: Vec<String>,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    pub text: String,
}
