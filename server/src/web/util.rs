use crate::data_store::PageRequest;
use crate::web::api::APIError;
use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Query parameters for selecting a page of a listing, e.g. `?page=2&pageSize=50`
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageQuery {
    pub fn page_request(&self) -> Result<PageRequest, APIError> {
        page_request(self.page, self.page_size)
    }
}

/// Build the [PageRequest] from optional `page` and `pageSize` query parameters, defaulting to the
/// first page of [DEFAULT_PAGE_SIZE] items.
pub fn page_request(page: Option<i64>, page_size: Option<i64>) -> Result<PageRequest, APIError> {
    Ok(PageRequest::new(
        page.unwrap_or(1),
        page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    )?)
}
