//! Visits repository for database operations

use sqlx::{sqlite::SqliteConnection, types::Json, SqlitePool};

use crate::{
    error::AppResult,
    models::{
        dependent::DependentDetails,
        visit::{HistoryEntry, VisitDetails},
    },
    repository::{ACK_FLAG, DEPENDENTS_JSON},
};

/// Latest recorded visit of a visitor
#[derive(Debug, Clone)]
pub struct LatestVisit {
    pub visit_id: i64,
    pub details: VisitDetails,
    pub dependents: Vec<DependentDetails>,
}

#[derive(sqlx::FromRow)]
struct LatestVisitRow {
    id: i64,
    #[sqlx(flatten)]
    details: VisitDetails,
    dependents: Json<Vec<DependentDetails>>,
}

/// Active visit of a visitor with the visitor's name
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OpenVisit {
    pub visit_id: i64,
    pub first_name: String,
    pub last_name: String,
}

/// A visit to insert
#[derive(Debug, Clone, Copy)]
pub struct NewVisit<'a> {
    pub visitor_id: i64,
    pub entry_time: &'a str,
    pub exit_time: Option<&'a str>,
    pub details: &'a VisitDetails,
    pub dependents: &'a [DependentDetails],
}

#[derive(Clone)]
pub struct VisitsRepository {
    pool: SqlitePool,
}

impl VisitsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Most recent visit of a visitor, by entry time
    pub async fn latest(&self, visitor_id: i64) -> AppResult<Option<LatestVisit>> {
        let query = format!(
            r#"
            SELECT vis.id, vis.known_as, vis.address, vis.phone_number, vis.unit,
                   vis.reason_for_visit, vis.type, vis.company_name,
                   {ack}, {dependents}
            FROM visits vis
            WHERE vis.visitor_id = ?1
            ORDER BY vis.entry_time DESC
            LIMIT 1
            "#,
            ack = ACK_FLAG,
            dependents = DEPENDENTS_JSON,
        );

        let row = sqlx::query_as::<_, LatestVisitRow>(&query)
            .bind(visitor_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| LatestVisit {
            visit_id: row.id,
            details: row.details,
            dependents: row.dependents.0,
        }))
    }

    /// The visitor's visit that has no exit time yet
    pub async fn find_open(&self, visitor_id: i64) -> AppResult<Option<OpenVisit>> {
        let visit = sqlx::query_as::<_, OpenVisit>(
            r#"
            SELECT vis.id AS visit_id, v.first_name, v.last_name
            FROM visits vis
            JOIN visitors v ON vis.visitor_id = v.id
            WHERE vis.visitor_id = ?1 AND vis.exit_time IS NULL
            ORDER BY vis.entry_time DESC
            LIMIT 1
            "#,
        )
        .bind(visitor_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(visit)
    }

    /// Insert a visit and its dependents atomically
    pub async fn create(&self, visit: NewVisit<'_>) -> AppResult<i64> {
        let mut tx = self.pool.begin().await?;
        let visit_id = insert_visit(&mut *tx, visit).await?;
        tx.commit().await?;
        Ok(visit_id)
    }

    /// Set the exit time of a visit
    pub async fn close(&self, visit_id: i64, exit_time: &str) -> AppResult<()> {
        sqlx::query("UPDATE visits SET exit_time = ?1 WHERE id = ?2")
            .bind(exit_time)
            .bind(visit_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Visit history, newest first, optionally filtered by name and entry time bounds
    pub async fn history(
        &self,
        search: Option<&str>,
        entered_from: Option<&str>,
        entered_until: Option<&str>,
    ) -> AppResult<Vec<HistoryEntry>> {
        let mut conditions = Vec::new();
        if search.is_some() {
            conditions.push("(LOWER(v.first_name) LIKE ? OR LOWER(v.last_name) LIKE ?)");
        }
        if entered_from.is_some() {
            conditions.push("vis.entry_time >= ?");
        }
        if entered_until.is_some() {
            conditions.push("vis.entry_time <= ?");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            r#"
            SELECT v.id AS visitor_id, v.first_name, v.last_name, v.photo_path,
                   COALESCE(v.is_banned, 0) AS is_banned,
                   vis.id AS visit_id, vis.entry_time, vis.exit_time,
                   vis.known_as, vis.address, vis.phone_number, vis.unit,
                   vis.reason_for_visit, vis.type, vis.company_name,
                   {ack}, {dependents}
            FROM visitors v
            JOIN visits vis ON v.id = vis.visitor_id
            {where_clause}
            ORDER BY vis.entry_time DESC
            "#,
            ack = ACK_FLAG,
            dependents = DEPENDENTS_JSON,
            where_clause = where_clause,
        );

        let mut builder = sqlx::query_as::<_, HistoryEntry>(&query);
        if let Some(term) = search {
            let pattern = format!("%{}%", term.to_lowercase());
            builder = builder.bind(pattern.clone()).bind(pattern);
        }
        if let Some(from) = entered_from {
            builder = builder.bind(from);
        }
        if let Some(until) = entered_until {
            builder = builder.bind(until);
        }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok(rows)
    }
}

/// Insert a visit and its dependents on an open connection or transaction
pub(crate) async fn insert_visit(conn: &mut SqliteConnection, visit: NewVisit<'_>) -> Result<i64, sqlx::Error> {
    let details = visit.details;
    let visit_id = sqlx::query(
        r#"
        INSERT INTO visits (
            visitor_id, entry_time, exit_time, known_as, address, phone_number, unit,
            reason_for_visit, type, company_name, mandatory_acknowledgment_taken
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(visit.visitor_id)
    .bind(visit.entry_time)
    .bind(visit.exit_time)
    .bind(&details.known_as)
    .bind(&details.address)
    .bind(&details.phone_number)
    .bind(&details.unit)
    .bind(&details.reason_for_visit)
    .bind(&details.visit_type)
    .bind(&details.company_name)
    .bind(details.mandatory_acknowledgment_taken)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    for dependent in visit.dependents {
        sqlx::query("INSERT INTO dependents (full_name, age, visit_id) VALUES (?1, ?2, ?3)")
            .bind(&dependent.full_name)
            .bind(dependent.age)
            .bind(visit_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(visit_id)
}
