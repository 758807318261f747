//! Business logic services

pub mod audit;
pub mod visitors;
pub mod visits;

use std::path::PathBuf;

use crate::{config::AdminConfig, repository::Repository, status::StatusTracker};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub visitors: visitors::VisitorsService,
    pub visits: visits::VisitsService,
    pub audit: audit::AuditService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        admin: AdminConfig,
        uploads_dir: PathBuf,
        status: StatusTracker,
    ) -> Self {
        Self {
            visitors: visitors::VisitorsService::new(
                repository.clone(),
                admin.unban_password.clone(),
                uploads_dir,
            ),
            visits: visits::VisitsService::new(repository.clone(), admin.history_password),
            audit: audit::AuditService::new(repository, status),
        }
    }
}

/// Shared-secret check; an unset secret never matches
pub(crate) fn password_matches(expected: &str, provided: Option<&str>) -> bool {
    match provided {
        Some(provided) => !expected.is_empty() && provided == expected,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::password_matches;

    #[test]
    fn empty_secret_never_matches() {
        assert!(!password_matches("", Some("")));
        assert!(!password_matches("", None));
        assert!(!password_matches("s3cret", None));
        assert!(!password_matches("s3cret", Some("S3CRET")));
        assert!(password_matches("s3cret", Some("s3cret")));
    }
}
