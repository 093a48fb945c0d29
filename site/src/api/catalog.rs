//! Catalog browsing.
//!
//! - GET /api/catalog?category=women

use crate::catalog::{self, CatalogItem, Category};
use axum::extract::Query;
use axum::Json;
use serde::Deserialize;
use wedding_web::{AppError, WebResult};

/// `?category=`
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    /// `women`, `men` or `accessories`; absent or `all` lists everything
    #[serde(default)]
    pub category: Option<String>,
}

/// List catalog items, optionally for one category.
///
/// ```bash
/// curl http://localhost:8080/api/catalog?category=men
/// ```
///
/// # Errors
///
/// 400 for an unknown category.
#[allow(clippy::unused_async)]
pub async fn list_catalog(Query(query): Query<CatalogQuery>) -> WebResult<Json<Vec<&'static CatalogItem>>> {
    let category = match query.category.as_deref().map(str::trim) {
        None | Some("" | "all") => None,
        Some(raw) => Some(
            Category::parse(raw).ok_or_else(|| AppError::bad_request(format!("Unknown category: {raw}")))?,
        ),
    };
    Ok(Json(catalog::by_category(category)))
}
