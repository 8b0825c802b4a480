use serde::Serialize;

/// Standard success envelope: `{ "success": true, "message": "...", "data": ... }`.
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn ok(message: &str, data: T) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    #[must_use]
    pub fn message(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data: None,
        }
    }
}

/// Paginated payload embedded in the `data` field of the envelope.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// Hard cap on page size for every paginated listing.
pub const MAX_PAGE_LIMIT: u64 = 100;

/// Clamp raw pagination query values to `page >= 1` and `1 <= limit <= 100`.
#[must_use]
pub fn clamp_pagination(page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(10).clamp(1, MAX_PAGE_LIMIT);
    (page, limit)
}

impl<T: Serialize> Paginated<T> {
    #[must_use]
    pub const fn new(items: Vec<T>, page: u64, limit: u64, total: u64) -> Self {
        let total_pages = total.div_ceil(limit);
        Self {
            items,
            page,
            limit,
            total,
            total_pages,
        }
    }
}
