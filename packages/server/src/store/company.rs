use chrono::Utc;
use common::storage::{DirectoryProvisioner, PublicDisk};
use sea_orm::*;
use tracing::{debug, info, warn};

use super::StoreError;
use crate::entity::company;
use crate::policy::Actor;

/// Storage module that owns uploaded company logos.
pub const COMPANY_MODULE: &str = "companies";

/// How a stored `logo` column value is interpreted.
///
/// Values starting with `http://` or `https://` (any case) point at an
/// externally hosted image and are never deleted. Anything else is a path
/// relative to the public disk root, owned by the company row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logo<'a> {
    Url(&'a str),
    Local(&'a str),
}

impl<'a> Logo<'a> {
    pub fn parse(value: &'a str) -> Self {
        if has_http_scheme(value) {
            Logo::Url(value)
        } else {
            Logo::Local(value)
        }
    }

    /// The owned file path, if this logo is stored locally.
    pub fn local_path(self) -> Option<&'a str> {
        match self {
            Logo::Local(path) => Some(path),
            Logo::Url(_) => None,
        }
    }
}

fn has_http_scheme(value: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        value
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// Validated logo image bytes awaiting storage.
#[derive(Debug, Clone)]
pub struct UploadedLogo {
    pub bytes: Vec<u8>,
    /// File extension without the dot, e.g. `png`.
    pub extension: String,
}

#[derive(Debug, Clone)]
pub enum LogoInput {
    Upload(UploadedLogo),
    Url(String),
}

/// Field values for a create or update. Validation has already happened.
#[derive(Debug, Clone, Default)]
pub struct CompanyData {
    pub name: String,
    pub email: Option<String>,
    pub website: Option<String>,
    /// `None` on update keeps the current logo.
    pub logo: Option<LogoInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    Name,
    Email,
    Website,
    CreatedAt,
    #[default]
    UpdatedAt,
}

impl SortColumn {
    pub const ALLOWED: &'static str = "name, email, website, created_at, updated_at";

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "name" => Some(SortColumn::Name),
            "email" => Some(SortColumn::Email),
            "website" => Some(SortColumn::Website),
            "created_at" => Some(SortColumn::CreatedAt),
            "updated_at" => Some(SortColumn::UpdatedAt),
            _ => None,
        }
    }

    fn column(self) -> company::Column {
        match self {
            SortColumn::Name => company::Column::Name,
            SortColumn::Email => company::Column::Email,
            SortColumn::Website => company::Column::Website,
            SortColumn::CreatedAt => company::Column::CreatedAt,
            SortColumn::UpdatedAt => company::Column::UpdatedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    fn order(self) -> Order {
        match self {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based.
    pub page: u64,
    pub per_page: u64,
    pub order_by: SortColumn,
    pub direction: SortDirection,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 15,
            order_by: SortColumn::default(),
            direction: SortDirection::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub last_page: u64,
}

/// Company persistence together with the lifecycle of locally stored logos.
///
/// A local logo path recorded on a row always names a file that exists on
/// the public disk. New files are written before the row references them and
/// old files are removed only after the row stops referencing them.
pub struct CompanyStore<'a, C: ConnectionTrait> {
    conn: &'a C,
    provisioner: &'a dyn DirectoryProvisioner,
    disk: &'a dyn PublicDisk,
    directory_mode: u32,
}

impl<'a, C: ConnectionTrait> CompanyStore<'a, C> {
    pub fn new(
        conn: &'a C,
        provisioner: &'a dyn DirectoryProvisioner,
        disk: &'a dyn PublicDisk,
        directory_mode: u32,
    ) -> Self {
        Self {
            conn,
            provisioner,
            disk,
            directory_mode,
        }
    }

    pub async fn find(&self, id: i32) -> Result<company::Model, StoreError> {
        company::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    pub async fn all(&self) -> Result<Vec<company::Model>, StoreError> {
        Ok(company::Entity::find()
            .order_by_asc(company::Column::Id)
            .all(self.conn)
            .await?)
    }

    pub async fn paginate(&self, request: PageRequest) -> Result<Page<company::Model>, StoreError> {
        let per_page = Ord::max(request.per_page, 1);
        let current_page = Ord::max(request.page, 1);

        let paginator = company::Entity::find()
            .order_by(request.order_by.column(), request.direction.order())
            .order_by_asc(company::Column::Id)
            .paginate(self.conn, per_page);

        let total = paginator.num_items().await?;
        // Pages past the end are empty; fetching them would overflow the offset.
        let items = match (current_page - 1).checked_mul(per_page) {
            Some(offset) if offset < total => paginator.fetch_page(current_page - 1).await?,
            _ => Vec::new(),
        };

        Ok(Page {
            items,
            total,
            per_page,
            current_page,
            last_page: Ord::max(total.div_ceil(per_page), 1),
        })
    }

    /// Names of the unique fields in `data` already used by another company.
    pub async fn taken_fields(
        &self,
        data: &CompanyData,
        except_id: Option<i32>,
    ) -> Result<Vec<&'static str>, StoreError> {
        let probes = [
            ("name", company::Column::Name, Some(data.name.trim())),
            ("email", company::Column::Email, data.email.as_deref()),
            ("website", company::Column::Website, data.website.as_deref()),
        ];

        let mut taken = Vec::new();
        for (field, column, value) in probes {
            let Some(value) = value else { continue };
            let mut select = company::Entity::find().filter(column.eq(value));
            if let Some(id) = except_id {
                select = select.filter(company::Column::Id.ne(id));
            }
            if select.count(self.conn).await? > 0 {
                taken.push(field);
            }
        }
        Ok(taken)
    }

    pub async fn create(
        &self,
        actor: &Actor,
        data: CompanyData,
    ) -> Result<company::Model, StoreError> {
        let name = required_name(&data.name)?;
        let (logo, stored) = self.prepare_logo(data.logo).await?;

        let now = Utc::now();
        let model = company::ActiveModel {
            name: Set(name),
            email: Set(data.email),
            website: Set(data.website),
            logo: Set(logo),
            created_by: Set(actor.id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match model.insert(self.conn).await {
            Ok(created) => {
                info!(company_id = created.id, created_by = actor.id, "Company created");
                Ok(created)
            }
            Err(e) => {
                if let Some(path) = stored {
                    self.discard_logo(&path).await;
                }
                Err(e.into())
            }
        }
    }

    pub async fn update(
        &self,
        company: company::Model,
        data: CompanyData,
    ) -> Result<company::Model, StoreError> {
        let name = required_name(&data.name)?;
        let id = company.id;
        let previous = company.logo.clone();
        let replacing = data.logo.is_some();
        let (logo, stored) = self.prepare_logo(data.logo).await?;

        let mut active: company::ActiveModel = company.into();
        active.name = Set(name);
        active.email = Set(data.email);
        active.website = Set(data.website);
        if replacing {
            active.logo = Set(logo);
        }
        active.updated_at = Set(Utc::now());

        let updated = match active.update(self.conn).await {
            Ok(updated) => updated,
            Err(e) => {
                if let Some(path) = stored {
                    self.discard_logo(&path).await;
                }
                return Err(match e {
                    DbErr::RecordNotUpdated => StoreError::NotFound(id),
                    e => e.into(),
                });
            }
        };

        if replacing
            && let Some(old) = previous.as_deref().and_then(|v| Logo::parse(v).local_path())
            && updated.logo.as_deref() != Some(old)
        {
            self.discard_logo(old).await;
        }

        info!(company_id = id, "Company updated");
        Ok(updated)
    }

    /// Delete the row, then its owned logo file. Returns `false` if no row
    /// was removed.
    pub async fn delete(&self, company: &company::Model) -> Result<bool, StoreError> {
        let result = company::Entity::delete_by_id(company.id)
            .exec(self.conn)
            .await?;
        if result.rows_affected == 0 {
            return Ok(false);
        }

        if let Some(path) = company.logo.as_deref().and_then(|v| Logo::parse(v).local_path()) {
            self.discard_logo(path).await;
        }

        info!(company_id = company.id, "Company deleted");
        Ok(true)
    }

    /// Turn logo input into the column value. The second element is the
    /// path of a file written by this call, for cleanup if persisting fails.
    async fn prepare_logo(
        &self,
        input: Option<LogoInput>,
    ) -> Result<(Option<String>, Option<String>), StoreError> {
        match input {
            None => Ok((None, None)),
            Some(LogoInput::Url(url)) => Ok((Some(url), None)),
            Some(LogoInput::Upload(upload)) => {
                let path = self.store_logo(&upload).await?;
                Ok((Some(path.clone()), Some(path)))
            }
        }
    }

    async fn store_logo(&self, upload: &UploadedLogo) -> Result<String, StoreError> {
        if !self
            .provisioner
            .create_module_storage_structure(COMPANY_MODULE, self.directory_mode)
        {
            return Err(StoreError::StorageProvisioning {
                module: COMPANY_MODULE,
                path: self.provisioner.module_storage_path(COMPANY_MODULE),
            });
        }

        let path = self
            .disk
            .put(COMPANY_MODULE, &upload.extension, &upload.bytes)
            .await?;
        debug!(path = %path, size = upload.bytes.len(), "Stored company logo");
        Ok(path)
    }

    /// Best-effort removal of an owned logo file.
    async fn discard_logo(&self, path: &str) {
        match self.disk.delete(path).await {
            Ok(true) => debug!(path, "Deleted company logo"),
            Ok(false) => warn!(path, "Company logo was already missing"),
            Err(e) => warn!(path, error = %e, "Failed to delete company logo"),
        }
    }
}

fn required_name(name: &str) -> Result<String, StoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::MissingName);
    }
    Ok(name.to_string())
}
