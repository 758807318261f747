//! Visitors repository for database operations

use sqlx::SqlitePool;

use crate::{
    error::AppResult,
    models::visitor::{ActiveVisitor, RegisterVisitor, Visitor, VisitorSearchResult},
    repository::{
        visits::{insert_visit, NewVisit},
        ACK_FLAG, DEPENDENTS_JSON,
    },
};

#[derive(Clone)]
pub struct VisitorsRepository {
    pool: SqlitePool,
}

impl VisitorsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get visitor by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Option<Visitor>> {
        let visitor = sqlx::query_as::<_, Visitor>(
            r#"
            SELECT id, first_name, last_name, photo_path, COALESCE(is_banned, 0) AS is_banned
            FROM visitors WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(visitor)
    }

    /// Check whether a visitor with exactly this name is registered
    pub async fn name_exists(&self, first_name: &str, last_name: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM visitors WHERE first_name = ?1 AND last_name = ?2)",
        )
        .bind(first_name)
        .bind(last_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Insert the visitor, their first visit and its dependents in one transaction.
    ///
    /// Returns `(visitor_id, visit_id)`.
    pub async fn register(&self, registration: &RegisterVisitor, entry_time: &str) -> AppResult<(i64, i64)> {
        let mut tx = self.pool.begin().await?;

        let visitor_id = sqlx::query(
            "INSERT INTO visitors (first_name, last_name, photo_path, is_banned) VALUES (?1, ?2, ?3, 0)",
        )
        .bind(&registration.first_name)
        .bind(&registration.last_name)
        .bind(&registration.photo_path)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let visit_id = insert_visit(
            &mut *tx,
            NewVisit {
                visitor_id,
                entry_time,
                exit_time: None,
                details: &registration.details,
                dependents: &registration.dependents,
            },
        )
        .await?;

        tx.commit().await?;
        Ok((visitor_id, visit_id))
    }

    /// Set or clear the banned flag. Returns false when the visitor does not exist.
    pub async fn set_banned(&self, id: i64, banned: bool) -> AppResult<bool> {
        let result = sqlx::query("UPDATE visitors SET is_banned = ?1 WHERE id = ?2")
            .bind(banned)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Visitors currently on site, latest arrival first
    pub async fn list_active(&self) -> AppResult<Vec<ActiveVisitor>> {
        let query = format!(
            r#"
            SELECT v.id, v.first_name, v.last_name, v.photo_path,
                   COALESCE(v.is_banned, 0) AS is_banned,
                   vis.id AS visit_id, vis.entry_time, vis.exit_time,
                   vis.known_as, vis.address, vis.phone_number, vis.unit,
                   vis.reason_for_visit, vis.type, vis.company_name,
                   {ack}, {dependents}
            FROM visitors v
            JOIN visits vis ON v.id = vis.visitor_id
            WHERE vis.exit_time IS NULL
            ORDER BY vis.entry_time DESC
            "#,
            ack = ACK_FLAG,
            dependents = DEPENDENTS_JSON,
        );

        let rows = sqlx::query_as::<_, ActiveVisitor>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Visitors whose first or last name contains every term, with their latest visit
    pub async fn search(&self, terms: &[&str]) -> AppResult<Vec<VisitorSearchResult>> {
        let conditions = vec!["(v.first_name LIKE ? OR v.last_name LIKE ?)"; terms.len()];
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            r#"
            SELECT v.id, v.first_name, v.last_name, v.photo_path,
                   COALESCE(v.is_banned, 0) AS is_banned,
                   vis.known_as, vis.address, vis.phone_number, vis.unit,
                   vis.reason_for_visit, vis.type, vis.company_name,
                   {ack},
                   EXISTS(SELECT 1 FROM visits o WHERE o.visitor_id = v.id AND o.exit_time IS NULL) AS signed_in,
                   {dependents}
            FROM visitors v
            LEFT JOIN (
                SELECT *, ROW_NUMBER() OVER (PARTITION BY visitor_id ORDER BY entry_time DESC) AS rn
                FROM visits
            ) vis ON v.id = vis.visitor_id AND vis.rn = 1
            {where_clause}
            ORDER BY v.last_name, v.first_name
            "#,
            ack = ACK_FLAG,
            dependents = DEPENDENTS_JSON,
            where_clause = where_clause,
        );

        let mut builder = sqlx::query_as::<_, VisitorSearchResult>(&query);
        for term in terms {
            let pattern = format!("%{}%", term);
            builder = builder.bind(pattern.clone()).bind(pattern);
        }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok(rows)
    }
}
