//! Repository layer for database operations

pub mod audit_logs;
pub mod visitors;
pub mod visits;

use sqlx::SqlitePool;

/// Aggregated dependents of the visit aliased `vis`, as a JSON array
pub(crate) const DEPENDENTS_JSON: &str = "(SELECT json_group_array(json_object('full_name', d.full_name, 'age', d.age)) \
     FROM dependents d WHERE d.visit_id = vis.id) AS dependents";

/// Acknowledgment flag of the visit aliased `vis`; older rows may hold text
pub(crate) const ACK_FLAG: &str =
    "COALESCE(vis.mandatory_acknowledgment_taken IN (1, '1', 'true'), 0) AS mandatory_acknowledgment_taken";

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: SqlitePool,
    pub visitors: visitors::VisitorsRepository,
    pub visits: visits::VisitsRepository,
    pub audit_logs: audit_logs::AuditLogsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            visitors: visitors::VisitorsRepository::new(pool.clone()),
            visits: visits::VisitsRepository::new(pool.clone()),
            audit_logs: audit_logs::AuditLogsRepository::new(pool.clone()),
            pool,
        }
    }
}
