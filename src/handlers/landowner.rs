//! Requirement endpoints under `/landowner`.
//!
//! Creation takes a multipart form so a document can be attached; updates are
//! partial JSON patches. Only the owning landowner may change or delete a
//! requirement, while any signed-in user can read them.

use actix_multipart::{Field, Multipart};
use actix_web::{HttpResponse, web};
use futures::TryStreamExt;
use validator::Validate;

use crate::{
    AppState,
    auth_middleware::AuthMiddleware,
    error::ApiError,
    handlers::{
        data::{CreatedResponse, MessageResponse, UpdateRequirementRequest, trimmed},
        guard::{require_owner, require_role},
    },
    models::{Requirement, Role},
    store::{NewRequirement, RequirementPatch},
};

/// Upper bound for a single text field of the multipart form.
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

/// Text and file parts collected from the creation form.
#[derive(Debug, Default)]
struct RequirementForm {
    title: Option<String>,
    description: Option<String>,
    location: Option<String>,
    attachment: Option<String>,
}

async fn read_text(field: &mut Field, name: &str) -> Result<String, ApiError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        if buf.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            return Err(ApiError::PayloadTooLarge(format!("field `{name}` is too long")));
        }
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8(buf).map_err(|_| ApiError::BadRequest(format!("field `{name}` is not UTF-8")))
}

async fn drain(field: &mut Field) -> Result<(), ApiError> {
    while field
        .try_next()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
        .is_some()
    {}
    Ok(())
}

/// Reads the multipart stream into `form`.
///
/// On error `form` still holds whatever was collected, including an attachment
/// that was already written to disk.
async fn collect_form(
    state: &AppState,
    mut payload: Multipart,
    form: &mut RequirementForm,
) -> Result<(), ApiError> {
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ApiError::BadRequest(format!("expected a multipart form: {e}")))?
    {
        let disposition = field.content_disposition().clone();
        let name = disposition.get_name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = Some(read_text(&mut field, "title").await?),
            "description" => form.description = Some(read_text(&mut field, "description").await?),
            "location" => form.location = Some(read_text(&mut field, "location").await?),
            "file" => {
                let filename = disposition.get_filename().unwrap_or_default();
                if filename.is_empty() {
                    // browsers send an empty file part when nothing was chosen
                    drain(&mut field).await?;
                } else if form.attachment.is_some() {
                    return Err(ApiError::BadRequest("only one file may be attached".into()));
                } else {
                    form.attachment = Some(state.uploads.save_field(filename, field).await?);
                }
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown form field");
                drain(&mut field).await?;
            }
        }
    }

    Ok(())
}

/// Creates a requirement owned by the calling landowner.
///
/// # Request Body (multipart/form-data)
/// - `title` (required)
/// - `description` (required)
/// - `location` (optional)
/// - `file` (optional): one attachment with an allowed extension, at most
///   `MAX_UPLOAD_BYTES` long
///
/// # Responses
/// - `201 Created`: `{ "message": "Requirement created", "id": 1 }`
/// - `400 Bad Request`: missing title/description or rejected file type
/// - `403 Forbidden`: caller is not a landowner
/// - `413 Payload Too Large`: attachment over the size cap
#[tracing::instrument(skip(user, state, payload), fields(user_id = user.id))]
pub async fn create_requirement(
    user: AuthMiddleware,
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    require_role(&user, Role::Landowner)?;

    let mut form = RequirementForm::default();
    let collected = collect_form(&state, payload, &mut form).await;
    let attachment = form.attachment.clone();

    let result = async {
        collected?;
        let title = trimmed(form.title).ok_or_else(|| ApiError::BadRequest("title is required".into()))?;
        let description = trimmed(form.description)
            .ok_or_else(|| ApiError::BadRequest("description is required".into()))?;

        let requirement = state
            .store
            .create_requirement(NewRequirement {
                owner_id: user.id,
                title,
                description,
                location: trimmed(form.location),
                attachment: form.attachment,
            })
            .await?;
        Ok::<_, ApiError>(requirement)
    }
    .await;

    match result {
        Ok(requirement) => {
            tracing::info!(
                requirement_id = requirement.id,
                has_attachment = requirement.attachment.is_some(),
                "Requirement created"
            );
            Ok(HttpResponse::Created().json(CreatedResponse {
                message: "Requirement created".into(),
                id: requirement.id,
            }))
        }
        Err(e) => {
            if let Some(stored) = attachment {
                if let Err(cleanup) = state.uploads.remove(&stored).await {
                    tracing::warn!(error = %cleanup, stored = %stored, "Failed to remove orphaned attachment");
                }
            }
            Err(e)
        }
    }
}

/// `GET /landowner/requirements`: every requirement, oldest first.
#[tracing::instrument(skip(user, state), fields(user_id = user.id))]
pub async fn list_requirements(
    user: AuthMiddleware,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let requirements = state.store.list_requirements().await?;
    tracing::debug!(count = requirements.len(), "Fetched requirements");
    Ok(HttpResponse::Ok().json(requirements))
}

async fn load(state: &AppState, id: i64) -> Result<Requirement, ApiError> {
    state
        .store
        .get_requirement(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Requirement not found".into()))
}

/// `GET /landowner/requirement/{id}`
#[tracing::instrument(skip(user, state), fields(user_id = user.id))]
pub async fn get_requirement(
    user: AuthMiddleware,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let requirement = load(&state, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(requirement))
}

/// Partially updates a requirement the caller owns.
///
/// Any subset of `title`, `description` and `location` may be sent; an empty
/// patch is rejected with 400.
#[tracing::instrument(skip(user, state, payload), fields(user_id = user.id))]
pub async fn update_requirement(
    user: AuthMiddleware,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    payload: web::Json<UpdateRequirementRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let existing = load(&state, id).await?;
    require_owner(&user, existing.owner_id, "requirement")?;

    let mut payload = payload.into_inner();
    payload.title = trimmed(payload.title);
    payload.description = trimmed(payload.description);
    payload.location = trimmed(payload.location);
    payload.validate()?;

    let patch = RequirementPatch {
        title: payload.title,
        description: payload.description,
        location: payload.location,
    };
    if patch.is_empty() {
        return Err(ApiError::BadRequest("no fields to update".into()));
    }

    state
        .store
        .update_requirement(id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("Requirement not found".into()))?;

    tracing::info!(requirement_id = id, "Requirement updated");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Requirement updated")))
}

/// Deletes a requirement the caller owns, along with its applications and
/// stored attachment.
#[tracing::instrument(skip(user, state), fields(user_id = user.id))]
pub async fn delete_requirement(
    user: AuthMiddleware,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let existing = load(&state, id).await?;
    require_owner(&user, existing.owner_id, "requirement")?;

    let removed = state
        .store
        .delete_requirement(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Requirement not found".into()))?;

    if let Some(stored) = removed.attachment.as_deref() {
        if let Err(e) = state.uploads.remove(stored).await {
            tracing::warn!(error = %e, stored, "Failed to remove attachment of deleted requirement");
        }
    }

    tracing::info!(requirement_id = id, "Requirement deleted");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Requirement deleted")))
}
