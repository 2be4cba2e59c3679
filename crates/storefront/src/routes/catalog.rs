//! Catalog page route handler.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use medicart_core::{Catalog, Ledger};
use tracing::{error, instrument};

use crate::error::Result;
use crate::middleware::VisitorStorage;
use crate::models::Notice;
use crate::routes::cart::{OrderView, Page};
use crate::state::AppState;

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/index.html")]
pub struct CatalogTemplate {
    /// `None` when the catalog could not be loaded
    pub catalog: Option<Arc<Catalog>>,
    pub order: OrderView,
    pub notice: Option<Notice>,
}

/// Display the catalog page.
///
/// The order table always shows the stored cart, so the buttons below it act
/// on what the shopper sees. If the catalog fails to load, only the product
/// area is left empty.
#[instrument(skip(state, storage))]
pub async fn index(
    State(state): State<AppState>,
    storage: VisitorStorage,
) -> Result<CatalogTemplate> {
    let notice = Notice::take(storage.session()).await?;
    let ledger = Ledger::restore(storage.store())?;

    let catalog = match state.catalog().catalog().await {
        Ok(catalog) => Some(catalog),
        Err(e) => {
            error!(error = %e, location = %state.catalog().location(), "Error loading the products");
            None
        }
    };

    Ok(CatalogTemplate {
        catalog,
        order: OrderView::new(&ledger, Page::Catalog),
        notice,
    })
}
