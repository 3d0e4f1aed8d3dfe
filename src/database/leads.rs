use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::filter::types::FilterValue;
use crate::filter::{where_sql, LeadFilter};

use super::manager::{is_unique_violation, StoreError};
use super::models::{Lead, LeadPatch, NewLead};

/// Persistence and query execution for leads. Every operation is scoped by
/// owner in the SQL itself; a wrong-owner id behaves exactly like a missing
/// id so existence never leaks across tenants.
pub struct LeadStore {
    pool: PgPool,
}

impl LeadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run a compiled filter: one page of matches, newest first, plus the
    /// total match count. Page and count are separate queries on the pool,
    /// so a write landing between them can skew the count by a row.
    pub async fn list(&self, filter: &LeadFilter) -> Result<(Vec<Lead>, i64), StoreError> {
        let sql_where = where_sql(filter);

        let select = format!(
            "SELECT * FROM leads WHERE {} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            sql_where.clause,
            filter.limit,
            filter.skip()
        );
        let mut page_query = sqlx::query_as::<_, Lead>(&select);
        for value in &sql_where.params {
            page_query = bind_value_as(page_query, value);
        }
        let items = page_query.fetch_all(&self.pool).await?;

        let count = format!(
            "SELECT COUNT(*) AS count FROM leads WHERE {}",
            sql_where.clause
        );
        let mut count_query = sqlx::query(&count);
        for value in &sql_where.params {
            count_query = bind_value(count_query, value);
        }
        let row = count_query.fetch_one(&self.pool).await?;
        let total: i64 = row.try_get("count")?;

        Ok((items, total))
    }

    pub async fn insert(&self, owner_id: Uuid, new_lead: &NewLead) -> Result<Lead, StoreError> {
        let result = sqlx::query_as::<_, Lead>(
            "INSERT INTO leads (user_id, first_name, last_name, email, phone, company, city, \
             state, source, status, score, lead_value, is_qualified, last_activity_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) RETURNING *",
        )
        .bind(owner_id)
        .bind(&new_lead.first_name)
        .bind(&new_lead.last_name)
        .bind(&new_lead.email)
        .bind(&new_lead.phone)
        .bind(&new_lead.company)
        .bind(&new_lead.city)
        .bind(&new_lead.state)
        .bind(new_lead.source)
        .bind(new_lead.status)
        .bind(new_lead.score)
        .bind(new_lead.lead_value)
        .bind(new_lead.is_qualified)
        .bind(new_lead.last_activity_at)
        .fetch_one(&self.pool)
        .await;

        result.map_err(map_lead_unique)
    }

    pub async fn get(&self, id: Uuid, owner_id: Uuid) -> Result<Lead, StoreError> {
        sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(not_found)
    }

    /// Apply a partial update. The owner never changes; an empty patch is a
    /// caller error filtered out during validation.
    pub async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: &LeadPatch,
    ) -> Result<Lead, StoreError> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("UPDATE leads SET updated_at = now()");

        if let Some(v) = &patch.first_name {
            builder.push(", first_name = ").push_bind(v);
        }
        if let Some(v) = &patch.last_name {
            builder.push(", last_name = ").push_bind(v);
        }
        if let Some(v) = &patch.email {
            builder.push(", email = ").push_bind(v);
        }
        if let Some(v) = &patch.phone {
            builder.push(", phone = ").push_bind(v);
        }
        if let Some(v) = &patch.company {
            builder.push(", company = ").push_bind(v);
        }
        if let Some(v) = &patch.city {
            builder.push(", city = ").push_bind(v);
        }
        if let Some(v) = &patch.state {
            builder.push(", state = ").push_bind(v);
        }
        if let Some(v) = patch.source {
            builder.push(", source = ").push_bind(v);
        }
        if let Some(v) = patch.status {
            builder.push(", status = ").push_bind(v);
        }
        if let Some(v) = patch.score {
            builder.push(", score = ").push_bind(v);
        }
        if let Some(v) = patch.lead_value {
            builder.push(", lead_value = ").push_bind(v);
        }
        if let Some(v) = patch.is_qualified {
            builder.push(", is_qualified = ").push_bind(v);
        }
        if let Some(v) = patch.last_activity_at {
            // Some(None) clears the timestamp
            builder.push(", last_activity_at = ").push_bind(v);
        }

        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND user_id = ")
            .push_bind(owner_id)
            .push(" RETURNING *");

        let result = builder
            .build_query_as::<Lead>()
            .fetch_optional(&self.pool)
            .await;

        match result {
            Ok(Some(lead)) => Ok(lead),
            Ok(None) => Err(not_found()),
            Err(e) => Err(map_lead_unique(e)),
        }
    }

    pub async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found());
        }
        Ok(())
    }
}

fn not_found() -> StoreError {
    StoreError::NotFound("Lead not found".to_string())
}

fn map_lead_unique(e: sqlx::Error) -> StoreError {
    if is_unique_violation(&e, "leads_user_email_key") {
        StoreError::DuplicateLeadEmail
    } else {
        StoreError::Sqlx(e)
    }
}

fn bind_value<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    v: &'q FilterValue,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match v {
        FilterValue::Str(s) => q.bind(s),
        FilterValue::Num(n) => q.bind(*n),
        FilterValue::Bool(b) => q.bind(*b),
        FilterValue::Date(d) => q.bind(*d),
        FilterValue::Id(u) => q.bind(*u),
    }
}

fn bind_value_as<'q, O>(
    q: sqlx::query::QueryAs<'q, Postgres, O, PgArguments>,
    v: &'q FilterValue,
) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> sqlx::FromRow<'r, PgRow>,
{
    match v {
        FilterValue::Str(s) => q.bind(s),
        FilterValue::Num(n) => q.bind(*n),
        FilterValue::Bool(b) => q.bind(*b),
        FilterValue::Date(d) => q.bind(*d),
        FilterValue::Id(u) => q.bind(*u),
    }
}
