//! Integration tests for buy now and the payment gates.

use axum::http::StatusCode;
use chrono::{Days, Local};
use medicart_core::checkout::format_delivery_date;
use medicart_integration_tests::TestContext;

/// Every required reservation field, filled in.
const FILLED: [(&str, &str); 10] = [
    ("full_name", "Ada Lovelace"),
    ("email", "ada@example.com"),
    ("phone", "0123 456 789"),
    ("address", "12 St James's Square"),
    ("city", "London"),
    ("postal_code", "SW1Y 4LB"),
    ("card_name", "A Lovelace"),
    ("card_number", "4242 4242 4242 4242"),
    ("card_expiry", "12/29"),
    ("card_cvc", "123"),
];

const REQUIRED_FIELDS: usize = FILLED.len();

// =============================================================================
// Buy Now
// =============================================================================

#[tokio::test]
async fn test_buy_now_with_empty_cart_stays_on_catalog() {
    let mut ctx = TestContext::new().await;
    let response = ctx.post("/cart/buy-now", &[]).await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/"));

    let page = ctx.get("/").await;
    assert!(page.body.contains(
        "Oops! Your cart is empty. Please add some products before proceeding to checkout."
    ));
}

#[tokio::test]
async fn test_buy_now_goes_to_cart_page() {
    let mut ctx = TestContext::new().await;
    ctx.add("aspirin", "2", "accept").await;

    let response = ctx.post("/cart/buy-now", &[]).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/cart"));

    let cart = ctx.get("/cart").await;
    assert_eq!(cart.order_rows(), 1);
    assert_eq!(cart.total(), Some("$5.98"));
    assert!(cart.body.contains(r#"id="Reservation-Form""#));
    assert_eq!(cart.field_errors(), 0);
}

// =============================================================================
// Payment Gates
// =============================================================================

#[tokio::test]
async fn test_pay_with_empty_cart_aborts_before_field_check() {
    let mut ctx = TestContext::new().await;
    let page = ctx.post("/cart/pay", &[]).await;

    assert_eq!(page.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(page.body.contains(
        "Your cart is empty. Please add some products before proceeding to payment."
    ));
    assert!(!page.body.contains("Thank you for your purchase!"));
    assert_eq!(page.field_errors(), 0);
    assert_eq!(page.flagged_fields(), 0);
}

#[tokio::test]
async fn test_pay_with_blank_field_flags_it() {
    let mut ctx = TestContext::new().await;
    ctx.add("vitamin-c", "3", "accept").await;

    let mut form: Vec<(&str, &str)> = FILLED.to_vec();
    form.retain(|(name, _)| *name != "city");
    form.push(("city", "   "));

    let page = ctx.post("/cart/pay", &form).await;

    assert_eq!(page.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        page.body
            .contains("Please fill in all required fields before proceeding to payment.")
    );
    assert_eq!(page.field_errors(), 1);
    assert_eq!(page.flagged_fields(), 1);
    assert!(page.body.contains(r#"id="field-city" name="city""#));
    // Submitted values are echoed back
    assert!(page.body.contains(r#"value="ada@example.com""#));
    // Cart untouched
    assert_eq!(page.total(), Some("$29.97"));
    assert_eq!(ctx.get("/cart").await.order_rows(), 1);
}

#[tokio::test]
async fn test_pay_with_no_fields_annotates_each_required_field_once() {
    let mut ctx = TestContext::new().await;
    ctx.add("vitamin-c", "3", "accept").await;

    let first = ctx.post("/cart/pay", &[]).await;
    let second = ctx.post("/cart/pay", &[]).await;

    assert_eq!(first.field_errors(), REQUIRED_FIELDS);
    assert_eq!(second.field_errors(), REQUIRED_FIELDS);
    assert_eq!(second.flagged_fields(), REQUIRED_FIELDS);
}

#[tokio::test]
async fn test_notes_are_optional() {
    let mut ctx = TestContext::new().await;
    ctx.add("vitamin-c", "1", "accept").await;

    let mut form: Vec<(&str, &str)> = FILLED.to_vec();
    form.push(("notes", ""));

    let response = ctx.post("/cart/pay", &form).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_successful_payment_clears_cart_and_shows_delivery_date() {
    let mut ctx = TestContext::new().await;
    ctx.add("vitamin-c", "3", "accept").await;

    let response = ctx.post("/cart/pay", &FILLED).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/cart"));

    let page = ctx.get("/cart").await;
    let expected = Local::now()
        .date_naive()
        .checked_add_days(Days::new(2))
        .map(format_delivery_date)
        .unwrap();
    assert!(page.body.contains(&format!(
        "Thank you for your purchase! Your order will be delivered by {expected}."
    )));
    assert_eq!(page.order_rows(), 0);
    assert_eq!(page.total(), Some("$0.00"));

    // Paying again hits the emptiness gate
    let again = ctx.post("/cart/pay", &FILLED).await;
    assert_eq!(again.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_payment_keeps_favourite() {
    let mut ctx = TestContext::new().await;
    ctx.add("vitamin-c", "3", "accept").await;
    ctx.post_and_follow("/cart/favourite", &[]).await;
    ctx.post("/cart/pay", &FILLED).await;

    let page = ctx.post_and_follow("/cart/favourite/apply", &[]).await;
    assert_eq!(page.order_rows(), 1);
    assert_eq!(page.total(), Some("$29.97"));
}
