//! Contact endpoints, including upcoming birthdays

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracker_core::dates::{days_until_birthday, next_birthday};
use uuid::Uuid;

use super::{today, window_days};
use crate::db::repos::{Contact, ContactInput, ContactRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, Json, Path, Query};
use crate::http::server::AppState;
use crate::models::fields::{optional_text, required_text, MAX_TEXT_LEN, MAX_TITLE_LEN};
use crate::models::{Paginated, Pagination, PaginationParams, ValidationError};

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl ContactRequest {
    fn validate(self) -> Result<ContactInput, ValidationError> {
        let email = optional_text("email", self.email.as_deref(), 320)?;
        if email.as_deref().is_some_and(|e| !e.contains('@')) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "must contain '@'",
            });
        }
        Ok(ContactInput {
            name: required_text("name", &self.name, MAX_TITLE_LEN)?,
            email,
            phone: optional_text("phone", self.phone.as_deref(), 40)?,
            birthday: self.birthday,
            notes: optional_text("notes", self.notes.as_deref(), MAX_TEXT_LEN)?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactQuery {
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BirthdayQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct UpcomingBirthday {
    pub contact_id: Uuid,
    pub name: String,
    pub birthday: NaiveDate,
    pub next_birthday: NaiveDate,
    pub days_until: i64,
    /// Age reached on `next_birthday`.
    pub turning: i32,
}

/// Contacts whose next birthday falls within `days` of `today`, soonest first.
fn upcoming_birthdays(contacts: Vec<Contact>, today: NaiveDate, days: u32) -> Vec<UpcomingBirthday> {
    use chrono::Datelike;

    let mut upcoming: Vec<UpcomingBirthday> = contacts
        .into_iter()
        .filter_map(|c| {
            let birthday = c.birthday?;
            let days_until = days_until_birthday(birthday, today);
            if days_until > i64::from(days) {
                return None;
            }
            let next = next_birthday(birthday, today);
            Some(UpcomingBirthday {
                contact_id: c.id,
                name: c.name,
                birthday,
                next_birthday: next,
                days_until,
                turning: next.year() - birthday.year(),
            })
        })
        .collect();

    upcoming.sort_by(|a, b| a.days_until.cmp(&b.days_until).then_with(|| a.name.cmp(&b.name)));
    upcoming
}

/// GET /api/contacts?q=
async fn list_contacts(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PaginationParams>,
    Query(query): Query<ContactQuery>,
) -> Result<Json<Paginated<Contact>>, ApiError> {
    let q = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let page = ContactRepo::new(&state.pool)
        .list(user, q, Pagination::from(params))
        .await?;
    Ok(Json(page))
}

/// GET /api/contacts/birthdays?days=N (default 30)
async fn birthdays(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<BirthdayQuery>,
) -> Result<Json<Vec<UpcomingBirthday>>, ApiError> {
    let days = window_days(query.days, 30, 366);
    let contacts = ContactRepo::new(&state.pool).with_birthdays(user).await?;
    Ok(Json(upcoming_birthdays(contacts, today(), days)))
}

/// POST /api/contacts
async fn create_contact(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<ContactRequest>,
) -> Result<(StatusCode, Json<Contact>), ApiError> {
    let input = req.validate()?;
    let contact = ContactRepo::new(&state.pool).create(user, input).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

/// GET /api/contacts/{id}
async fn get_contact(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Contact>, ApiError> {
    Ok(Json(ContactRepo::new(&state.pool).get(user, id).await?))
}

/// PUT /api/contacts/{id}
async fn update_contact(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ContactRequest>,
) -> Result<Json<Contact>, ApiError> {
    let input = req.validate()?;
    Ok(Json(ContactRepo::new(&state.pool).update(user, id, input).await?))
}

/// DELETE /api/contacts/{id}
async fn delete_contact(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ContactRepo::new(&state.pool).delete(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/contacts", get(list_contacts).post(create_contact))
        .route("/contacts/birthdays", get(birthdays))
        .route(
            "/contacts/{id}",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
}
