//! Cart route handlers.
//!
//! Each handler reads the visitor's storage, runs one ledger operation and
//! commits the changed keys. Shopper-facing rejections (`CartError` values
//! where `is_validation()` holds) become error notices; anything else is an
//! `AppError`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Local;
use medicart_core::cart::confirmation_prompt;
use medicart_core::{
    AddOutcome, CartError, CheckoutForm, Confirmation, FormField, Ledger, OrderRow, Product,
    ProductId,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{debug, error, instrument};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::VisitorStorage;
use crate::models::Notice;
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// A page a cart action returns to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Catalog,
    Cart,
}

impl Page {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Catalog => "/",
            Self::Cart => "/cart",
        }
    }

    /// Form value accepted by `return_to`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Cart => "cart",
        }
    }
}

/// Order table display data for templates.
#[derive(Clone)]
pub struct OrderView {
    pub rows: Vec<OrderRow>,
    pub total: String,
    /// Page the row remove buttons return to
    pub page: Page,
}

impl OrderView {
    #[must_use]
    pub fn new(ledger: &Ledger, page: Page) -> Self {
        Self {
            rows: ledger.rows(),
            total: ledger.total().to_string(),
            page,
        }
    }
}

/// The reservation form shown on the cart page.
#[must_use]
pub fn reservation_form() -> CheckoutForm {
    CheckoutForm::new(vec![
        FormField::required("full_name", "Full name"),
        FormField::required("email", "Email"),
        FormField::required("phone", "Phone"),
        FormField::required("address", "Street address"),
        FormField::required("city", "City"),
        FormField::required("postal_code", "Postal code"),
        FormField::required("card_name", "Name on card"),
        FormField::required("card_number", "Card number"),
        FormField::required("card_expiry", "Expiry (MM/YY)"),
        FormField::required("card_cvc", "CVC"),
        FormField::optional("notes", "Delivery notes"),
    ])
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    /// Raw input text; validated by the ledger
    #[serde(default)]
    pub quantity: String,
}

/// The shopper's answer to the add prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Cancel,
}

impl From<Decision> for Confirmation {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Accept => Self::Accepted,
            Decision::Cancel => Self::Declined,
        }
    }
}

/// Add confirmation form data.
#[derive(Debug, Deserialize)]
pub struct ConfirmAddForm {
    pub product_id: String,
    #[serde(default)]
    pub quantity: String,
    pub decision: Decision,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    /// Raw row index; anything that is not one reads as an unknown line.
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub return_to: Page,
}

impl RemoveFromCartForm {
    /// The posted row index.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownLine`] if `position` is not an index.
    pub fn position(&self) -> std::result::Result<usize, CartError> {
        self.position
            .trim()
            .parse()
            .map_err(|_| CartError::UnknownLine)
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Add confirmation prompt template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/confirm_add.html")]
pub struct ConfirmAddTemplate {
    pub prompt: String,
    pub product_id: String,
    pub quantity: String,
    pub notice: Option<Notice>,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub order: OrderView,
    pub form: CheckoutForm,
    pub notice: Option<Notice>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Resolve a posted product id, or the notice to show when it is unknown.
async fn find_product(
    state: &AppState,
    product_id: &str,
) -> Result<std::result::Result<Product, Notice>> {
    let id = ProductId::new(product_id);
    match state.catalog().product(&id).await? {
        Some(product) => Ok(Ok(product)),
        None => {
            error!(product_id = %id, "Add requested for a product not in the catalog");
            Ok(Err(Notice::error(
                "That product is no longer available. Please refresh the page.",
            )))
        }
    }
}

/// Turn a ledger result into the notice to show.
///
/// Validation failures become error notices; storage and encode failures
/// are returned as `AppError`.
fn notice_from<T>(
    result: std::result::Result<T, CartError>,
    on_success: impl FnOnce(T) -> Option<Notice>,
) -> Result<Option<Notice>> {
    match result {
        Ok(value) => Ok(on_success(value)),
        Err(e) if e.is_validation() => {
            debug!(error = %e, "Cart action rejected");
            Ok(Some(Notice::error(e.to_string())))
        }
        Err(e) => Err(AppError::from(e)),
    }
}

/// Commit storage, flash the notice and redirect to `page`.
async fn finish(storage: VisitorStorage, notice: Option<Notice>, page: Page) -> Result<Redirect> {
    let session = storage.session().clone();
    storage.commit().await?;
    if let Some(notice) = notice {
        notice.flash(&session).await?;
    }
    Ok(Redirect::to(page.path()))
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page.
#[instrument(skip(storage))]
pub async fn show(storage: VisitorStorage) -> Result<CartShowTemplate> {
    let notice = Notice::take(storage.session()).await?;
    let ledger = Ledger::restore(storage.store())?;

    Ok(CartShowTemplate {
        order: OrderView::new(&ledger, Page::Cart),
        form: reservation_form(),
        notice,
    })
}

/// Ask the shopper to confirm an add.
///
/// Nothing is validated or stored yet; the prompt posts back to
/// [`confirm_add`].
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product = match find_product(&state, &form.product_id).await? {
        Ok(product) => product,
        Err(notice) => {
            notice.flash(&session).await?;
            return Ok(Redirect::to(Page::Catalog.path()).into_response());
        }
    };

    Ok(ConfirmAddTemplate {
        prompt: confirmation_prompt(&product.name),
        product_id: product.id.to_string(),
        quantity: form.quantity,
        notice: None,
    }
    .into_response())
}

/// Accept or cancel a pending add.
#[instrument(skip(state, storage))]
pub async fn confirm_add(
    State(state): State<AppState>,
    mut storage: VisitorStorage,
    Form(form): Form<ConfirmAddForm>,
) -> Result<Redirect> {
    let product = match find_product(&state, &form.product_id).await? {
        Ok(product) => product,
        Err(notice) => return finish(storage, Some(notice), Page::Catalog).await,
    };

    let mut ledger = Ledger::restore(storage.store())?;
    let result = ledger.add(
        storage.store_mut(),
        form.decision.into(),
        &product.name,
        &form.quantity,
        product.price,
    );
    let notice = notice_from(result, |outcome| match outcome {
        AddOutcome::Added { .. } => {
            add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product.id.as_str())]));
            Some(Notice::success(outcome.to_string()))
        }
        AddOutcome::Declined => None,
    })?;

    finish(storage, notice, Page::Catalog).await
}

/// Remove one line from the cart.
#[instrument(skip(storage))]
pub async fn remove(
    mut storage: VisitorStorage,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Redirect> {
    let mut ledger = Ledger::restore(storage.store())?;
    let result = form
        .position()
        .and_then(|position| ledger.remove(storage.store_mut(), position));
    let notice = notice_from(result, |line| {
        Some(Notice::success(format!(
            "{} has been removed from your cart.",
            line.title
        )))
    })?;

    finish(storage, notice, form.return_to).await
}

/// Clear the cart.
#[instrument(skip(storage))]
pub async fn reset(mut storage: VisitorStorage) -> Result<Redirect> {
    let mut ledger = Ledger::restore(storage.store())?;
    ledger.clear(storage.store_mut())?;
    finish(storage, None, Page::Catalog).await
}

/// Save the current cart as the favorite order.
#[instrument(skip(storage))]
pub async fn save_favourite(mut storage: VisitorStorage) -> Result<Redirect> {
    let ledger = Ledger::restore(storage.store())?;
    let result = ledger.save_favorite(storage.store_mut());
    let notice = notice_from(result, |()| {
        Some(Notice::success(medicart_core::cart::FAVOURITE_SAVED))
    })?;

    finish(storage, notice, Page::Catalog).await
}

/// Replace the cart with the saved favorite order.
#[instrument(skip(storage))]
pub async fn apply_favourite(mut storage: VisitorStorage) -> Result<Redirect> {
    let mut ledger = Ledger::restore(storage.store())?;
    let result = ledger
        .apply_favorite(storage.store())
        .and_then(|()| ledger.save(storage.store_mut()));
    let notice = notice_from(result, |()| {
        Some(Notice::success(medicart_core::cart::FAVOURITE_APPLIED))
    })?;

    finish(storage, notice, Page::Catalog).await
}

/// Save the cart and move on to the cart page.
#[instrument(skip(storage))]
pub async fn buy_now(mut storage: VisitorStorage) -> Result<Redirect> {
    let ledger = Ledger::restore(storage.store())?;
    let result = ledger.buy_now(storage.store_mut());
    let page = if result.is_ok() {
        Page::Cart
    } else {
        Page::Catalog
    };
    let notice = notice_from(result, |()| None)?;

    finish(storage, notice, page).await
}

/// Run the checkout gates.
///
/// On success the cart is cleared and the receipt is shown as a notice on
/// the (now empty) cart page. On rejection the page is re-rendered with the
/// submitted values and any field annotations.
#[instrument(skip(state, storage, values))]
pub async fn pay(
    State(state): State<AppState>,
    mut storage: VisitorStorage,
    Form(values): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let mut ledger = Ledger::restore(storage.store())?;
    let mut form = reservation_form();
    form.fill(values.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    let today = Local::now().date_naive();
    match state
        .checkout()
        .pay(&mut ledger, &mut form, storage.store_mut(), today)
    {
        Ok(receipt) => {
            add_breadcrumb("checkout", "Payment completed", None);
            let notice = Notice::success(receipt.message());
            Ok(finish(storage, Some(notice), Page::Cart)
                .await?
                .into_response())
        }
        Err(e) if e.is_validation() => {
            debug!(error = %e, "Checkout rejected");
            let page = CartShowTemplate {
                order: OrderView::new(&ledger, Page::Cart),
                form,
                notice: Some(Notice::error(e.to_string())),
            };
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
        Err(e) => Err(AppError::from(e)),
    }
}
