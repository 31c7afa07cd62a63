use serde::Serialize;

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 15)]
    pub per_page: u64,
    /// Total number of items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Number of the last page. At least 1, even when there are no items.
    #[schema(example = 4)]
    pub last_page: u64,
}

/// Trim a text input, treating blank values as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
