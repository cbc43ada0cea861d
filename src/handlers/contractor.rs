//! Application endpoints under `/contractor`.
//!
//! Contractors apply to requirements with a proposal and a cost estimate.
//! Only the contractor who submitted an application may change or withdraw it.

use actix_web::{HttpResponse, web};
use validator::Validate;

use crate::{
    AppState,
    auth_middleware::AuthMiddleware,
    error::ApiError,
    handlers::{
        data::{
            CreatedResponse, MessageResponse, NewApplicationRequest, SortQuery,
            UpdateApplicationRequest, trimmed,
        },
        guard::{require_owner, require_role},
    },
    models::{Application, Role},
    store::{ApplicationOrder, ApplicationPatch, NewApplication},
};

async fn load(state: &AppState, id: i64) -> Result<Application, ApiError> {
    state
        .store
        .get_application(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Application not found".into()))
}

async fn ensure_requirement(state: &AppState, requirement_id: i64) -> Result<(), ApiError> {
    match state.store.get_requirement(requirement_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound("Requirement not found".into())),
    }
}

/// Submits an application against an existing requirement.
///
/// # Request Body (JSON)
/// ```json
/// {
///   "requirement_id": 3,
///   "proposal": "Clear and level the plot",
///   "cost_estimation": 12500.0,
///   "estimated_duration_days": 14
/// }
/// ```
///
/// # Responses
/// - `201 Created`: `{ "message": "Application created", "id": 1 }`
/// - `400 Bad Request`: invalid fields
/// - `403 Forbidden`: caller is not a contractor
/// - `404 Not Found`: requirement does not exist
#[tracing::instrument(skip(user, state, payload), fields(user_id = user.id))]
pub async fn create_application(
    user: AuthMiddleware,
    state: web::Data<AppState>,
    payload: web::Json<NewApplicationRequest>,
) -> Result<HttpResponse, ApiError> {
    require_role(&user, Role::Contractor)?;

    let mut payload = payload.into_inner();
    payload.proposal = payload.proposal.trim().to_string();
    payload.validate()?;

    let application = state
        .store
        .create_application(NewApplication {
            requirement_id: payload.requirement_id,
            contractor_id: user.id,
            proposal: payload.proposal,
            cost_estimation: payload.cost_estimation,
            estimated_duration_days: payload.estimated_duration_days,
        })
        .await?;

    tracing::info!(
        application_id = application.id,
        requirement_id = application.requirement_id,
        "Application created"
    );
    Ok(HttpResponse::Created().json(CreatedResponse {
        message: "Application created".into(),
        id: application.id,
    }))
}

/// `GET /contractor/applications/{requirement_id}`: applications in
/// submission order.
#[tracing::instrument(skip(user, state), fields(user_id = user.id))]
pub async fn list_applications(
    user: AuthMiddleware,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let requirement_id = path.into_inner();
    ensure_requirement(&state, requirement_id).await?;
    let applications = state.store.list_applications(requirement_id, None).await?;
    Ok(HttpResponse::Ok().json(applications))
}

/// `GET /contractor/applications/sort/{requirement_id}?sort_by=&order=`
///
/// `sort_by` defaults to `cost_estimation` and must name one of the sortable
/// columns; `order` is `asc` (default) or `desc`.
#[tracing::instrument(skip(user, state), fields(user_id = user.id))]
pub async fn sort_applications(
    user: AuthMiddleware,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<SortQuery>,
) -> Result<HttpResponse, ApiError> {
    let requirement_id = path.into_inner();
    let query = query.into_inner();

    let order = ApplicationOrder {
        field: match query.sort_by.as_deref() {
            Some(raw) => raw.parse().map_err(ApiError::BadRequest)?,
            None => Default::default(),
        },
        order: match query.order.as_deref() {
            Some(raw) => raw.parse().map_err(ApiError::BadRequest)?,
            None => Default::default(),
        },
    };

    ensure_requirement(&state, requirement_id).await?;
    let applications = state
        .store
        .list_applications(requirement_id, Some(order))
        .await?;

    tracing::debug!(
        sort_by = %order.field,
        count = applications.len(),
        "Fetched sorted applications"
    );
    Ok(HttpResponse::Ok().json(applications))
}

/// Partially updates an application the caller submitted.
#[tracing::instrument(skip(user, state, payload), fields(user_id = user.id))]
pub async fn update_application(
    user: AuthMiddleware,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    payload: web::Json<UpdateApplicationRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let existing = load(&state, id).await?;
    require_owner(&user, existing.contractor_id, "application")?;

    let mut payload = payload.into_inner();
    payload.proposal = trimmed(payload.proposal);
    payload.validate()?;

    let patch = ApplicationPatch {
        proposal: payload.proposal,
        cost_estimation: payload.cost_estimation,
        estimated_duration_days: payload.estimated_duration_days,
    };
    if patch.is_empty() {
        return Err(ApiError::BadRequest("no fields to update".into()));
    }

    state
        .store
        .update_application(id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("Application not found".into()))?;

    tracing::info!(application_id = id, "Application updated");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Application updated")))
}

/// Withdraws an application the caller submitted.
#[tracing::instrument(skip(user, state), fields(user_id = user.id))]
pub async fn delete_application(
    user: AuthMiddleware,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let existing = load(&state, id).await?;
    require_owner(&user, existing.contractor_id, "application")?;

    if !state.store.delete_application(id).await? {
        return Err(ApiError::NotFound("Application not found".into()));
    }

    tracing::info!(application_id = id, "Application deleted");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Application deleted")))
}
