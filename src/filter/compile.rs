use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::database::models::{LeadSource, LeadStatus};

use super::types::{Condition, FilterOp, FilterValue, LeadFilter};

/// (API spelling, column name). Parameters are accepted under either
/// spelling, e.g. `leadValue_gt` and `lead_value_gt`.
const STRING_FIELDS: &[(&str, &str)] = &[
    ("email", "email"),
    ("company", "company"),
    ("city", "city"),
];

const NUMERIC_FIELDS: &[(&str, &str)] = &[("score", "score"), ("leadValue", "lead_value")];

const DATE_FIELDS: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("lastActivityAt", "last_activity_at"),
];

/// Compile flat query parameters into a typed lead filter scoped to `owner_id`.
///
/// Parsing is lenient: a clause whose value does not parse as the expected
/// type is dropped rather than rejected, so a bad filter narrows nothing
/// instead of failing the request. Per field, `_equals` short-circuits the
/// other suffixes; range suffixes conjoin additively, with `_between`
/// contributing an inclusive `>=`/`<=` pair alongside any `_gt`/`_lt`
/// (`_before`/`_after`) bounds.
pub fn compile(params: &HashMap<String, String>, owner_id: Uuid) -> LeadFilter {
    let mut conditions = Vec::new();

    for &(api_name, column) in STRING_FIELDS {
        if let Some(v) = lookup(params, api_name, column, "equals") {
            conditions.push(Condition {
                column,
                op: FilterOp::Eq,
                value: FilterValue::Str(v.to_string()),
            });
        } else if let Some(v) = lookup(params, api_name, column, "contains") {
            conditions.push(Condition {
                column,
                op: FilterOp::Contains,
                value: FilterValue::Str(v.to_string()),
            });
        }
    }

    // Enumerated fields take exact match only; unknown labels are dropped
    if let Some(v) = lookup(params, "status", "status", "equals") {
        if let Some(status) = LeadStatus::parse(v) {
            conditions.push(Condition {
                column: "status",
                op: FilterOp::Eq,
                value: FilterValue::Str(status.as_str().to_string()),
            });
        }
    }
    if let Some(v) = lookup(params, "source", "source", "equals") {
        if let Some(source) = LeadSource::parse(v) {
            conditions.push(Condition {
                column: "source",
                op: FilterOp::Eq,
                value: FilterValue::Str(source.as_str().to_string()),
            });
        }
    }

    for &(api_name, column) in NUMERIC_FIELDS {
        if let Some(n) = lookup(params, api_name, column, "equals").and_then(parse_number) {
            conditions.push(Condition {
                column,
                op: FilterOp::Eq,
                value: FilterValue::Num(n),
            });
            continue;
        }
        if let Some(n) = lookup(params, api_name, column, "gt").and_then(parse_number) {
            conditions.push(Condition {
                column,
                op: FilterOp::Gt,
                value: FilterValue::Num(n),
            });
        }
        if let Some(n) = lookup(params, api_name, column, "lt").and_then(parse_number) {
            conditions.push(Condition {
                column,
                op: FilterOp::Lt,
                value: FilterValue::Num(n),
            });
        }
        if let Some((min, max)) = lookup(params, api_name, column, "between")
            .and_then(|v| parse_pair(v, parse_number))
        {
            conditions.push(Condition {
                column,
                op: FilterOp::Gte,
                value: FilterValue::Num(min),
            });
            conditions.push(Condition {
                column,
                op: FilterOp::Lte,
                value: FilterValue::Num(max),
            });
        }
    }

    for &(api_name, column) in DATE_FIELDS {
        // `_on` plays the `_equals` role for dates: the whole calendar day
        if let Some(dt) = lookup(params, api_name, column, "on").and_then(parse_date) {
            let day_start = Utc
                .from_utc_datetime(&dt.date_naive().and_hms_opt(0, 0, 0).unwrap_or_default());
            conditions.push(Condition {
                column,
                op: FilterOp::Gte,
                value: FilterValue::Date(day_start),
            });
            conditions.push(Condition {
                column,
                op: FilterOp::Lt,
                value: FilterValue::Date(day_start + Duration::days(1)),
            });
            continue;
        }
        if let Some(dt) = lookup(params, api_name, column, "before").and_then(parse_date) {
            conditions.push(Condition {
                column,
                op: FilterOp::Lt,
                value: FilterValue::Date(dt),
            });
        }
        if let Some(dt) = lookup(params, api_name, column, "after").and_then(parse_date) {
            conditions.push(Condition {
                column,
                op: FilterOp::Gt,
                value: FilterValue::Date(dt),
            });
        }
        if let Some((start, end)) =
            lookup(params, api_name, column, "between").and_then(|v| parse_pair(v, parse_date))
        {
            conditions.push(Condition {
                column,
                op: FilterOp::Gte,
                value: FilterValue::Date(start),
            });
            conditions.push(Condition {
                column,
                op: FilterOp::Lte,
                value: FilterValue::Date(end),
            });
        }
    }

    if let Some(v) = params.get("is_qualified_equals").or_else(|| params.get("isQualified_equals")) {
        match v.as_str() {
            "true" => conditions.push(Condition {
                column: "is_qualified",
                op: FilterOp::Eq,
                value: FilterValue::Bool(true),
            }),
            "false" => conditions.push(Condition {
                column: "is_qualified",
                op: FilterOp::Eq,
                value: FilterValue::Bool(false),
            }),
            _ => {} // lenient: anything else is dropped
        }
    }

    let pagination = &crate::config::config().pagination;
    let page = params
        .get("page")
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1);
    let limit = params
        .get("limit")
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|l| *l >= 1)
        .unwrap_or(pagination.default_limit)
        .min(pagination.max_limit);

    LeadFilter {
        owner_id,
        conditions,
        page,
        limit,
    }
}

fn lookup<'a>(
    params: &'a HashMap<String, String>,
    api_name: &str,
    column: &str,
    suffix: &str,
) -> Option<&'a str> {
    params
        .get(&format!("{}_{}", api_name, suffix))
        .or_else(|| params.get(&format!("{}_{}", column, suffix)))
        .map(|s| s.as_str())
}

fn parse_number(s: &str) -> Option<f64> {
    let n: f64 = s.trim().parse().ok()?;
    n.is_finite().then_some(n)
}

/// Accepts RFC 3339 timestamps, `YYYY-MM-DDTHH:MM:SS`, or bare `YYYY-MM-DD`
/// (interpreted as midnight UTC).
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    None
}

fn parse_pair<T, F: Fn(&str) -> Option<T>>(s: &str, parse: F) -> Option<(T, T)> {
    let (a, b) = s.split_once(',')?;
    Some((parse(a)?, parse(b)?))
}
