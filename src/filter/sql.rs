use super::types::{FilterOp, FilterValue, LeadFilter};

/// A rendered WHERE clause with its positional parameters
#[derive(Debug, Clone)]
pub struct SqlWhere {
    pub clause: String,
    pub params: Vec<FilterValue>,
}

/// Render a compiled filter to a parameterized WHERE clause.
///
/// The owner-scope condition is emitted first and unconditionally; every
/// query built from a `LeadFilter` is tenant-isolated at the SQL level.
pub fn where_sql(filter: &LeadFilter) -> SqlWhere {
    let mut params: Vec<FilterValue> = Vec::with_capacity(filter.conditions.len() + 1);

    params.push(FilterValue::Id(filter.owner_id));
    let mut parts = vec![format!("\"user_id\" = ${}", params.len())];

    for condition in &filter.conditions {
        let value = match (condition.op, &condition.value) {
            // Contains binds an escaped %substring% pattern
            (FilterOp::Contains, FilterValue::Str(s)) => {
                FilterValue::Str(format!("%{}%", escape_like(s)))
            }
            _ => condition.value.clone(),
        };
        params.push(value);
        parts.push(format!(
            "\"{}\" {} ${}",
            condition.column,
            condition.op.to_sql(),
            params.len()
        ));
    }

    SqlWhere {
        clause: parts.join(" AND "),
        params,
    }
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::Condition;
    use uuid::Uuid;

    fn filter_with(conditions: Vec<Condition>) -> LeadFilter {
        LeadFilter {
            owner_id: Uuid::new_v4(),
            conditions,
            page: 1,
            limit: 20,
        }
    }

    #[test]
    fn owner_scope_comes_first() {
        let f = filter_with(vec![]);
        let sql = where_sql(&f);
        assert_eq!(sql.clause, "\"user_id\" = $1");
        assert_eq!(sql.params, vec![FilterValue::Id(f.owner_id)]);
    }

    #[test]
    fn conditions_conjoin_after_owner_scope() {
        let f = filter_with(vec![
            Condition {
                column: "score",
                op: FilterOp::Gt,
                value: FilterValue::Num(40.0),
            },
            Condition {
                column: "status",
                op: FilterOp::Eq,
                value: FilterValue::Str("won".to_string()),
            },
        ]);
        let sql = where_sql(&f);
        assert_eq!(
            sql.clause,
            "\"user_id\" = $1 AND \"score\" > $2 AND \"status\" = $3"
        );
        assert_eq!(sql.params.len(), 3);
    }

    #[test]
    fn contains_renders_ilike_with_escaped_pattern() {
        let f = filter_with(vec![Condition {
            column: "city",
            op: FilterOp::Contains,
            value: FilterValue::Str("50%_off".to_string()),
        }]);
        let sql = where_sql(&f);
        assert_eq!(sql.clause, "\"user_id\" = $1 AND \"city\" ILIKE $2");
        assert_eq!(
            sql.params[1],
            FilterValue::Str("%50\\%\\_off%".to_string())
        );
    }

    #[test]
    fn like_escape_handles_backslash() {
        assert_eq!(escape_like(r"a\b"), r"a\\b");
        assert_eq!(escape_like("plain"), "plain");
    }
}
