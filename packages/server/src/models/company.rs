use axum::body::Bytes;
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::entity::company;
use crate::error::{AppError, FieldErrors};
use crate::models::shared::{Pagination, non_blank};
use crate::store::{
    CompanyData, Logo, LogoInput, Page, PageRequest, SortColumn, SortDirection, UploadedLogo,
};

pub const MAX_NAME_LENGTH: usize = 255;

/// Accepted logo content types, detected from the file contents.
pub const LOGO_MIME_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Raw fields of a company create/update form, as submitted.
#[derive(Default)]
pub struct CompanyForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    /// Contents of a non-empty `logo` part. The client's file name is not
    /// kept; stored files are renamed.
    pub logo: Option<Bytes>,
    pub logo_url: Option<String>,
}

impl CompanyForm {
    /// Read the known form fields. Unknown fields are ignored and an empty
    /// `logo` part counts as no upload.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = CompanyForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("logo") => {
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    if !bytes.is_empty() {
                        form.logo = Some(bytes);
                    }
                }
                Some(key @ ("name" | "email" | "website" | "logo_url")) => {
                    let text = field.text().await.map_err(multipart_error)?;
                    let slot = match key {
                        "name" => &mut form.name,
                        "email" => &mut form.email,
                        "website" => &mut form.website,
                        _ => &mut form.logo_url,
                    };
                    *slot = Some(text);
                }
                _ => {} // Ignore unknown fields.
            }
        }

        Ok(form)
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::Validation(format!("Multipart error: {}", err.body_text()))
    }
}

/// An absolute `http`/`https` URL with a host.
pub fn is_http_url(value: &str) -> bool {
    Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}

/// Check everything that can be checked without the database. Uniqueness is
/// probed separately by the store.
pub fn validate_company_form(
    form: CompanyForm,
    max_logo_size: u64,
) -> Result<CompanyData, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = non_blank(form.name);
    match &name {
        None => {
            errors.insert("name", "The name field is required".into());
        }
        Some(name) if name.chars().count() > MAX_NAME_LENGTH => {
            errors.insert(
                "name",
                format!("The name may not be greater than {MAX_NAME_LENGTH} characters"),
            );
        }
        Some(_) => {}
    }

    let email = non_blank(form.email);
    if let Some(email) = &email
        && !email_address::EmailAddress::is_valid(email)
    {
        errors.insert("email", "The email must be a valid email address".into());
    }

    let website = non_blank(form.website);
    if let Some(website) = &website
        && !is_http_url(website)
    {
        errors.insert("website", "The website must be a valid URL".into());
    }

    let logo_url = non_blank(form.logo_url);
    let logo = match (form.logo, logo_url) {
        (Some(_), Some(_)) => {
            errors.insert(
                "logo",
                "Provide either a logo file or a logo URL, not both".into(),
            );
            None
        }
        (Some(file), None) => match check_logo_file(&file, max_logo_size) {
            Ok(upload) => Some(LogoInput::Upload(upload)),
            Err(msg) => {
                errors.insert("logo", msg);
                None
            }
        },
        (None, Some(url)) => {
            if is_http_url(&url) {
                Some(LogoInput::Url(url))
            } else {
                errors.insert("logo_url", "The logo url must be a valid URL".into());
                None
            }
        }
        (None, None) => None,
    };

    match name {
        Some(name) if errors.is_empty() => Ok(CompanyData {
            name,
            email,
            website,
            logo,
        }),
        _ => Err(errors),
    }
}

fn check_logo_file(bytes: &[u8], max_logo_size: u64) -> Result<UploadedLogo, String> {
    if bytes.len() as u64 > max_logo_size {
        return Err(format!(
            "The logo may not be greater than {} kilobytes",
            max_logo_size / 1024
        ));
    }

    match infer::get(bytes) {
        Some(kind) if LOGO_MIME_TYPES.contains(&kind.mime_type()) => Ok(UploadedLogo {
            bytes: bytes.to_vec(),
            extension: kind.extension().to_string(),
        }),
        _ => Err("The logo must be a file of type: jpeg, png".into()),
    }
}

/// Public URL for a stored logo value.
pub fn public_logo_url(logo: &str, public_url_prefix: &str) -> String {
    match Logo::parse(logo) {
        Logo::Url(url) => url.to_string(),
        Logo::Local(path) => format!("{}/{}", public_url_prefix.trim_end_matches('/'), path),
    }
}

/// Query parameters for listing companies.
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CompanyListQuery {
    /// Page number (1-based). Defaults to 1.
    pub page: Option<u64>,
    /// Items per page, 1-100. Defaults to 15.
    pub per_page: Option<u64>,
    /// One of `name`, `email`, `website`, `created_at`, `updated_at` (default).
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default).
    pub sort_order: Option<String>,
}

impl CompanyListQuery {
    pub fn page_request(&self) -> Result<PageRequest, AppError> {
        let defaults = PageRequest::default();

        let order_by = match self.sort_by.as_deref() {
            None => defaults.order_by,
            Some(value) => SortColumn::parse(value).ok_or_else(|| {
                AppError::Validation(format!("sort_by must be one of: {}", SortColumn::ALLOWED))
            })?,
        };
        let direction = match self.sort_order.as_deref() {
            None | Some("desc") => SortDirection::Desc,
            Some("asc") => SortDirection::Asc,
            Some(_) => {
                return Err(AppError::Validation(
                    "sort_order must be one of: asc, desc".into(),
                ));
            }
        };

        Ok(PageRequest {
            page: Ord::max(self.page.unwrap_or(defaults.page), 1),
            per_page: self.per_page.unwrap_or(defaults.per_page).clamp(1, 100),
            order_by,
            direction,
        })
    }
}

/// Multipart body accepted by create and update.
#[allow(dead_code)]
#[derive(utoipa::ToSchema)]
pub struct CompanyUpload {
    /// Required, unique, at most 255 characters.
    #[schema(example = "Acme Inc.")]
    pub name: String,
    /// Optional, unique, valid email address.
    #[schema(example = "hello@acme.test")]
    pub email: Option<String>,
    /// Optional, unique, `http` or `https` URL.
    #[schema(example = "https://acme.test")]
    pub website: Option<String>,
    /// JPEG or PNG image. Mutually exclusive with `logo_url`.
    #[schema(value_type = Option<String>, format = Binary)]
    pub logo: Option<Vec<u8>>,
    /// Externally hosted logo. Mutually exclusive with `logo`.
    #[schema(example = "https://picsum.photos/seed/acme/100/100")]
    pub logo_url: Option<String>,
}

/// Constraints a client needs to render the company form.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CompanyFormConstraints {
    #[schema(example = 255)]
    pub max_name_length: usize,
    /// Maximum logo size in bytes.
    #[schema(example = 2097152)]
    pub max_logo_size: u64,
    #[schema(example = json!(["image/jpeg", "image/png"]))]
    pub logo_mime_types: Vec<&'static str>,
}

impl CompanyFormConstraints {
    pub fn new(max_logo_size: u64) -> Self {
        Self {
            max_name_length: MAX_NAME_LENGTH,
            max_logo_size,
            logo_mime_types: LOGO_MIME_TYPES.to_vec(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CompanyResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Acme Inc.")]
    pub name: String,
    #[schema(example = "hello@acme.test")]
    pub email: Option<String>,
    #[schema(example = "https://acme.test")]
    pub website: Option<String>,
    /// Stored value: an external URL or a path below the public storage root.
    #[schema(example = "companies/0d5c6b1f2a8e4c5b9f3e7a1d2c4b6e8f.png")]
    pub logo: Option<String>,
    /// Where the logo can be fetched from.
    #[schema(example = "/storage/companies/0d5c6b1f2a8e4c5b9f3e7a1d2c4b6e8f.png")]
    pub logo_url: Option<String>,
    /// ID of the user who created the company.
    #[schema(example = 1)]
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompanyResponse {
    pub fn from_model(model: company::Model, public_url_prefix: &str) -> Self {
        let logo_url = model
            .logo
            .as_deref()
            .map(|logo| public_logo_url(logo, public_url_prefix));
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            website: model.website,
            logo: model.logo,
            logo_url,
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CompanyListResponse {
    pub data: Vec<CompanyResponse>,
    pub pagination: Pagination,
}

impl CompanyListResponse {
    pub fn from_page(page: Page<company::Model>, public_url_prefix: &str) -> Self {
        Self {
            pagination: Pagination {
                page: page.current_page,
                per_page: page.per_page,
                total: page.total,
                last_page: page.last_page,
            },
            data: page
                .items
                .into_iter()
                .map(|c| CompanyResponse::from_model(c, public_url_prefix))
                .collect(),
        }
    }
}

/// Company together with the form constraints, for edit screens.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CompanyEditResponse {
    pub company: CompanyResponse,
    pub form: CompanyFormConstraints,
}
