use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::{Json, http::StatusCode, response::IntoResponse};
use sea_orm::DatabaseConnection;
use tracing::instrument;

use crate::entity::company;
use crate::error::{AppError, ErrorBody, FieldErrors};
use crate::extractors::auth::AuthUser;
use crate::models::company::{
    CompanyEditResponse, CompanyForm, CompanyFormConstraints, CompanyListQuery, CompanyListResponse,
    CompanyResponse, CompanyUpload, validate_company_form,
};
use crate::policy::{CompanyAction, authorize};
use crate::state::AppState;
use crate::store::{CompanyData, CompanyStore};

/// Room for the logo plus the text fields and multipart framing.
pub fn company_form_body_limit(max_logo_size: u64) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_logo_size as usize + 64 * 1024)
}

/// Parse and validate a submitted form, including uniqueness against every
/// company except `except_id`.
async fn read_company_form(
    state: &AppState,
    store: &CompanyStore<'_, DatabaseConnection>,
    multipart: Multipart,
    except_id: Option<i32>,
) -> Result<CompanyData, AppError> {
    let form = CompanyForm::from_multipart(multipart).await?;
    let data = validate_company_form(form, state.config.storage.max_logo_size)
        .map_err(AppError::InvalidFields)?;

    let taken = store.taken_fields(&data, except_id).await?;
    if !taken.is_empty() {
        let errors: FieldErrors = taken
            .into_iter()
            .map(|field| (field, format!("The {field} has already been taken")))
            .collect();
        return Err(AppError::InvalidFields(errors));
    }

    Ok(data)
}

fn respond(state: &AppState, company: company::Model) -> CompanyResponse {
    CompanyResponse::from_model(company, &state.config.storage.public_url_prefix)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Companies",
    operation_id = "listCompanies",
    summary = "List companies with pagination",
    description = "Returns a page of companies. Any authenticated user may list. Sorting by \
        `updated_at` (default, desc), `created_at`, `name`, `email` or `website`; ties are \
        broken by ID.",
    params(CompanyListQuery),
    responses(
        (status = 200, description = "Page of companies", body = CompanyListResponse),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_companies(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<CompanyListQuery>,
) -> Result<Json<CompanyListResponse>, AppError> {
    authorize::<company::Model>(&auth_user.actor(), CompanyAction::ViewAny, None)?;

    let request = query.page_request()?;
    let page = state.companies().paginate(request).await?;

    Ok(Json(CompanyListResponse::from_page(
        page,
        &state.config.storage.public_url_prefix,
    )))
}

#[utoipa::path(
    get,
    path = "/create",
    tag = "Companies",
    operation_id = "companyCreateForm",
    summary = "Constraints for the create form",
    responses(
        (status = 200, description = "Form constraints", body = CompanyFormConstraints),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn create_form(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<CompanyFormConstraints>, AppError> {
    authorize::<company::Model>(&auth_user.actor(), CompanyAction::Create, None)?;

    Ok(Json(CompanyFormConstraints::new(
        state.config.storage.max_logo_size,
    )))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Companies",
    operation_id = "createCompany",
    summary = "Create a company",
    description = "Creates a company owned by the caller. The logo is either an uploaded JPEG/PNG \
        (`logo`) or an external URL (`logo_url`), never both.",
    request_body(content = CompanyUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Company created", body = CompanyResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Unique value taken concurrently (CONFLICT)", body = ErrorBody),
        (status = 413, description = "Body too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 500, description = "Logo storage unavailable (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn create_company(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let actor = auth_user.actor();
    authorize::<company::Model>(&actor, CompanyAction::Create, None)?;

    let store = state.companies();
    let data = read_company_form(&state, &store, multipart, None).await?;
    let company = store.create(&actor, data).await?;

    Ok((StatusCode::CREATED, Json(respond(&state, company))))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Companies",
    operation_id = "getCompany",
    summary = "Get a company by ID",
    description = "Visible to its creator and to admins.",
    params(("id" = i32, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company details", body = CompanyResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Company not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_company(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CompanyResponse>, AppError> {
    let company = state.companies().find(id).await?;
    authorize(&auth_user.actor(), CompanyAction::View, Some(&company))?;

    Ok(Json(respond(&state, company)))
}

#[utoipa::path(
    get,
    path = "/{id}/edit",
    tag = "Companies",
    operation_id = "companyEditForm",
    summary = "Company and form constraints for editing",
    params(("id" = i32, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company with form constraints", body = CompanyEditResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Company not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn edit_form(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CompanyEditResponse>, AppError> {
    let company = state.companies().find(id).await?;
    authorize(&auth_user.actor(), CompanyAction::Update, Some(&company))?;

    Ok(Json(CompanyEditResponse {
        company: respond(&state, company),
        form: CompanyFormConstraints::new(state.config.storage.max_logo_size),
    }))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Companies",
    operation_id = "updateCompany",
    summary = "Update a company",
    description = "Replaces name, email and website. A new `logo` or `logo_url` replaces the \
        current logo and removes its stored file; sending neither keeps it. Allowed for the \
        creator and admins.",
    params(("id" = i32, Path, description = "Company ID")),
    request_body(content = CompanyUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Company updated", body = CompanyResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Company not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Unique value taken concurrently (CONFLICT)", body = ErrorBody),
        (status = 413, description = "Body too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 500, description = "Logo storage unavailable (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn update_company(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<CompanyResponse>, AppError> {
    let store = state.companies();
    let company = store.find(id).await?;
    authorize(&auth_user.actor(), CompanyAction::Update, Some(&company))?;

    let data = read_company_form(&state, &store, multipart, Some(id)).await?;
    let company = store.update(company, data).await?;

    Ok(Json(respond(&state, company)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Companies",
    operation_id = "deleteCompany",
    summary = "Delete a company",
    description = "Deletes the company and its stored logo file. Allowed for the creator and admins.",
    params(("id" = i32, Path, description = "Company ID")),
    responses(
        (status = 204, description = "Company deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Company not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_company(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let store = state.companies();
    let company = store.find(id).await?;
    authorize(&auth_user.actor(), CompanyAction::Delete, Some(&company))?;

    if !store.delete(&company).await? {
        return Err(AppError::NotFound("Company not found".into()));
    }

    Ok(StatusCode::NO_CONTENT)
}
