use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Comparison operator in a compiled condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    /// Case-insensitive substring match (string fields only)
    Contains,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOp {
    pub fn to_sql(self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Contains => "ILIKE",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
        }
    }
}

/// Typed operand for a compiled condition. Query parameters arrive as
/// strings; by the time they reach SQL they are one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Str(String),
    Num(f64),
    Bool(bool),
    Date(DateTime<Utc>),
    Id(Uuid),
}

/// A single predicate over one lead column
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: &'static str,
    pub op: FilterOp,
    pub value: FilterValue,
}

/// Compiled filter: owner scope, predicate conjunction, pagination window.
///
/// The owner condition is supplied by the compiler itself and is always
/// part of the rendered WHERE clause; callers cannot opt out of it.
#[derive(Debug, Clone)]
pub struct LeadFilter {
    pub owner_id: Uuid,
    pub conditions: Vec<Condition>,
    pub page: i64,
    pub limit: i64,
}

impl LeadFilter {
    /// Rows to skip for the current page. Saturates so an absurd client
    /// `page` yields an empty page instead of a wrapped negative offset.
    pub fn skip(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}
