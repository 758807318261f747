//! Sign-in, sign-out, missed visit correction and history

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        iso_timestamp, now_iso,
        visit::{
            HistoryEntry, HistoryQuery, MissedVisitRequest, MissedVisitResponse, SignInResponse,
            UpdateVisitorDetails, VisitDetails, DEFAULT_VISIT_TYPE, UNKNOWN_DETAIL,
        },
    },
    repository::{visits::NewVisit, Repository},
};

use super::password_matches;

#[derive(Clone)]
pub struct VisitsService {
    repository: Repository,
    history_password: String,
}

impl VisitsService {
    pub fn new(repository: Repository, history_password: String) -> Self {
        Self {
            repository,
            history_password,
        }
    }

    /// Check that the visitor exists, is not banned and is not already on site
    async fn ensure_can_sign_in(&self, visitor_id: i64) -> AppResult<()> {
        let visitor = self
            .repository
            .visitors
            .get_by_id(visitor_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Sign-in: visitor ID {} not found", visitor_id);
                AppError::NotFound("Visitor not found.".to_string())
            })?;

        if visitor.is_banned {
            tracing::warn!("Sign-in: banned visitor ID {} attempted to sign in", visitor_id);
            return Err(AppError::Banned(
                "This visitor is banned and cannot log in.".to_string(),
            ));
        }

        if self.repository.visits.find_open(visitor_id).await?.is_some() {
            tracing::warn!("Sign-in: visitor ID {} is already signed in", visitor_id);
            return Err(AppError::Conflict("This visitor is already signed in.".to_string()));
        }

        Ok(())
    }

    /// Sign a returning visitor in, copying their latest visit
    pub async fn sign_in(&self, visitor_id: Option<i64>) -> AppResult<SignInResponse> {
        let visitor_id = visitor_id
            .ok_or_else(|| AppError::BadRequest("Visitor ID is required for login.".to_string()))?;
        self.ensure_can_sign_in(visitor_id).await?;

        let (details, dependents) = match self.repository.visits.latest(visitor_id).await? {
            Some(latest) => (latest.details, latest.dependents),
            None => (VisitDetails::default(), Vec::new()),
        };

        let visit_id = self
            .repository
            .visits
            .create(NewVisit {
                visitor_id,
                entry_time: &now_iso(),
                exit_time: None,
                details: &details,
                dependents: &dependents,
            })
            .await?;

        tracing::info!(
            "Sign-in: visitor ID {} signed in, new visit ID {} with {} dependents",
            visitor_id,
            visit_id,
            dependents.len()
        );

        Ok(SignInResponse {
            message: "Visitor signed in successfully!".to_string(),
            visit_id,
            details,
            dependents,
        })
    }

    /// Sign a returning visitor in with new details. Returns the new visit id.
    pub async fn update_details(&self, update: &UpdateVisitorDetails) -> AppResult<i64> {
        let visitor_id = update.id.ok_or_else(|| {
            AppError::BadRequest("Visitor ID is required for re-registration.".to_string())
        })?;
        update.validate()?;
        self.ensure_can_sign_in(visitor_id).await?;

        let visit_id = self
            .repository
            .visits
            .create(NewVisit {
                visitor_id,
                entry_time: &now_iso(),
                exit_time: None,
                details: &update.details,
                dependents: &update.additional_dependents,
            })
            .await?;

        tracing::info!(
            "Update: visitor ID {} signed in with new details, visit ID {}",
            visitor_id,
            visit_id
        );
        Ok(visit_id)
    }

    /// Close the visitor's active visit. Returns the confirmation message.
    pub async fn sign_out(&self, visitor_id: i64) -> AppResult<String> {
        let open = self
            .repository
            .visits
            .find_open(visitor_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Sign-out: no active visit for visitor ID {}", visitor_id);
                AppError::NotFound("Visitor not found or already signed out.".to_string())
            })?;

        self.repository.visits.close(open.visit_id, &now_iso()).await?;

        let full_name = format!("{} {}", open.first_name, open.last_name);
        tracing::info!("Sign-out: {} (ID {}) signed out", full_name, visitor_id);
        Ok(format!("{} has been successfully signed out.", full_name))
    }

    /// Record a completed visit for someone who was never signed in
    pub async fn record_missed(&self, request: &MissedVisitRequest) -> AppResult<MissedVisitResponse> {
        let (visitor_id, raw_entry) = match (request.visitor_id, request.past_entry_time.as_deref()) {
            (Some(id), Some(entry)) if !entry.trim().is_empty() => (id, entry),
            _ => {
                tracing::warn!("Missed visit: missing visitor ID or entry time");
                return Err(AppError::BadRequest(
                    "Missing visitor ID or required entry time.".to_string(),
                ));
            }
        };

        let now = Utc::now();
        let entry = parse_entry_time(raw_entry)
            .filter(|entry| *entry < now)
            .ok_or_else(|| {
                tracing::warn!("Missed visit: invalid entry time {:?} for visitor ID {}", raw_entry, visitor_id);
                AppError::BadRequest(
                    "Invalid entry time. It must be a valid date/time and occur before the current exit time."
                        .to_string(),
                )
            })?;

        if self.repository.visitors.get_by_id(visitor_id).await?.is_none() {
            return Err(AppError::NotFound("Visitor not found.".to_string()));
        }

        let details = self
            .repository
            .visits
            .latest(visitor_id)
            .await?
            .map(|latest| latest.details)
            .unwrap_or_default()
            .with_placeholders();

        let entry_time = iso_timestamp(entry);
        let exit_time = iso_timestamp(now);
        self.repository
            .visits
            .create(NewVisit {
                visitor_id,
                entry_time: &entry_time,
                exit_time: Some(&exit_time),
                details: &details,
                dependents: &[],
            })
            .await?;

        tracing::info!("Missed visit: visitor ID {} corrected for {}", visitor_id, entry_time);
        Ok(MissedVisitResponse {
            message: "Visitor entry time corrected and signed out.".to_string(),
            entry: entry_time,
            exit: exit_time,
        })
    }

    /// Check the history password
    pub fn authorize_history(&self, password: Option<&str>) -> AppResult<()> {
        if password_matches(&self.history_password, password) {
            tracing::info!("Admin authorization: history dashboard unlocked");
            Ok(())
        } else {
            tracing::warn!("Admin authorization: incorrect history password");
            Err(AppError::Authorization("Incorrect password.".to_string()))
        }
    }

    /// Visit history, newest first
    pub async fn history(&self, query: &HistoryQuery) -> AppResult<Vec<HistoryEntry>> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let entered_from = query
            .start_date
            .as_deref()
            .map(|d| parse_date(d, "start_date"))
            .transpose()?
            .map(|d| format!("{}T00:00:00.000Z", d));
        let entered_until = query
            .end_date
            .as_deref()
            .map(|d| parse_date(d, "end_date"))
            .transpose()?
            .map(|d| format!("{}T23:59:59.999Z", d));

        let rows = self
            .repository
            .visits
            .history(search, entered_from.as_deref(), entered_until.as_deref())
            .await?;
        tracing::info!("History: returned {} visits", rows.len());
        Ok(rows)
    }
}

impl VisitDetails {
    /// Replace missing or blank identity fields with `--` and a blank type with `Visitor`
    fn with_placeholders(mut self) -> Self {
        for field in [&mut self.known_as, &mut self.address] {
            if field.as_deref().map_or(true, |v| v.trim().is_empty()) {
                *field = Some(UNKNOWN_DETAIL.to_string());
            }
        }
        if self.unit.trim().is_empty() {
            self.unit = UNKNOWN_DETAIL.to_string();
        }
        if self.visit_type.trim().is_empty() {
            self.visit_type = DEFAULT_VISIT_TYPE.to_string();
        }
        self
    }
}

/// Parse an RFC 3339 timestamp, or a zone-less `datetime-local` value in local time
fn parse_entry_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
}

fn parse_date(raw: &str, field: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("{} must be a date in YYYY-MM-DD format", field)))
}
