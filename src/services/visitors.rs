//! Visitor registration, search and banning

use std::path::{Path, PathBuf};

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        now_iso,
        visitor::{ActiveVisitor, RegisterVisitor, VisitorSearchResult},
    },
    repository::Repository,
};

use super::password_matches;

/// Photo received with a registration
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub original_name: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct VisitorsService {
    repository: Repository,
    unban_password: String,
    uploads_dir: PathBuf,
}

impl VisitorsService {
    pub fn new(repository: Repository, unban_password: String, uploads_dir: PathBuf) -> Self {
        Self {
            repository,
            unban_password,
            uploads_dir,
        }
    }

    /// Register a new visitor and sign them in.
    ///
    /// Returns the new visitor id. The photo is stored first and removed again
    /// if the database write fails.
    pub async fn register(&self, mut registration: RegisterVisitor, photo: Option<PhotoUpload>) -> AppResult<i64> {
        registration.validate()?;

        let first_name = registration.first_name.trim().to_string();
        let last_name = registration.last_name.trim().to_string();
        if self.repository.visitors.name_exists(&first_name, &last_name).await? {
            tracing::warn!("Registration: attempted duplicate registration for {} {}", first_name, last_name);
            return Err(AppError::Conflict(format!(
                "A visitor named {} {} already exists. Please use the search bar to log them in.",
                first_name, last_name
            )));
        }
        registration.first_name = first_name;
        registration.last_name = last_name;

        let stored_photo = match photo {
            Some(photo) if !photo.bytes.is_empty() => Some(self.store_photo(&photo).await?),
            _ => None,
        };
        registration.photo_path = stored_photo
            .as_ref()
            .map(|(_, relative)| relative.clone());

        match self.repository.visitors.register(&registration, &now_iso()).await {
            Ok((visitor_id, _)) => {
                tracing::info!(
                    visitor_id,
                    dependents = registration.dependents.len(),
                    "Registration: successful for {} {}",
                    registration.first_name,
                    registration.last_name
                );
                Ok(visitor_id)
            }
            Err(e) => {
                if let Some((path, _)) = stored_photo {
                    if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                        tracing::warn!(path = %path.display(), "Could not remove orphaned photo: {}", remove_err);
                    }
                }
                Err(e)
            }
        }
    }

    /// Write the photo under the uploads directory.
    ///
    /// Returns the absolute path and the path relative to the data directory.
    async fn store_photo(&self, photo: &PhotoUpload) -> AppResult<(PathBuf, String)> {
        tokio::fs::create_dir_all(&self.uploads_dir).await?;
        let file_name = format!(
            "photo-{}{}",
            uuid::Uuid::new_v4().simple(),
            photo_extension(photo.original_name.as_deref())
        );
        let path = self.uploads_dir.join(&file_name);
        tokio::fs::write(&path, &photo.bytes).await?;
        Ok((path, format!("uploads/{}", file_name)))
    }

    /// Visitors currently signed in
    pub async fn list_active(&self) -> AppResult<Vec<ActiveVisitor>> {
        let visitors = self.repository.visitors.list_active().await?;
        tracing::info!("Dashboard: fetched {} currently signed-in visitors", visitors.len());
        Ok(visitors)
    }

    /// Search visitors by name terms
    pub async fn search(&self, name: Option<&str>) -> AppResult<Vec<VisitorSearchResult>> {
        let terms: Vec<&str> = name.unwrap_or_default().split_whitespace().collect();
        if terms.is_empty() {
            tracing::warn!("Search attempt: missing name parameter");
            return Err(AppError::BadRequest("Search term 'name' is required.".to_string()));
        }

        let results = self.repository.visitors.search(&terms).await?;
        tracing::info!("Search: found {} results for {:?}", results.len(), terms.join(" "));
        Ok(results)
    }

    /// Ban a visitor
    pub async fn ban(&self, visitor_id: Option<i64>) -> AppResult<i64> {
        let visitor_id = visitor_id
            .ok_or_else(|| AppError::BadRequest("Visitor ID is required.".to_string()))?;

        if !self.repository.visitors.set_banned(visitor_id, true).await? {
            tracing::warn!("Ban request: attempted to ban non-existent visitor ID {}", visitor_id);
            return Err(AppError::NotFound("Visitor not found.".to_string()));
        }

        tracing::info!("Ban action: visitor ID {} has been banned", visitor_id);
        Ok(visitor_id)
    }

    /// Lift a ban; requires the unban password
    pub async fn unban(&self, visitor_id: i64, password: Option<&str>) -> AppResult<()> {
        if !password_matches(&self.unban_password, password) {
            tracing::warn!("Security: unauthorized unban attempt for visitor ID {}", visitor_id);
            return Err(AppError::Authorization("Incorrect password.".to_string()));
        }

        if !self.repository.visitors.set_banned(visitor_id, false).await? {
            tracing::warn!("Unban failed: visitor ID {} not found", visitor_id);
            return Err(AppError::NotFound("Visitor not found.".to_string()));
        }

        tracing::info!("Visitor ID {} has been unbanned", visitor_id);
        Ok(())
    }
}

/// Extension of the uploaded file, kept only when short and alphanumeric
fn photo_extension(original_name: Option<&str>) -> String {
    original_name
        .map(Path::new)
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::photo_extension;

    #[test]
    fn keeps_only_safe_extensions() {
        assert_eq!(photo_extension(Some("me.JPG")), ".jpg");
        assert_eq!(photo_extension(Some("archive.tar.gz")), ".gz");
        assert_eq!(photo_extension(Some("../../etc/passwd")), "");
        assert_eq!(photo_extension(Some("x.p/hp")), "");
        assert_eq!(photo_extension(None), "");
    }
}
