//! Checkout and order lookup.
//!
//! Checkout turns the session cart into an order document. Every line is
//! priced again from the current catalog; prices captured in the cart are
//! only used for display. Stock is checked but not decremented.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use ember_wick_core::{Email, OrderStatus, Price, ShippingAddress};

use super::cart::{load_cart, save_cart};
use crate::db::{Repository, SingletonRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::AppJson;
use crate::models::{BusinessConfig, Cart, CustomizationConfig, Order, OrderItem, Product};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub email: String,
    #[serde(default)]
    pub shipping_address: ShippingAddress,
}

/// POST /api/checkout
#[instrument(skip(state, session, request))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    AppJson(request): AppJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".to_string()));
    }

    let email = Email::parse(&request.email).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let shipping_address = request.shipping_address.trimmed();
    shipping_address
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let business = SingletonRepository::<BusinessConfig>::new(state.store())
        .load()
        .await?;
    let items = price_items(&state, &cart, &business).await?;

    let subtotal = items
        .iter()
        .fold(Price::zero(business.currency), |acc, item| {
            acc.plus(Price::new(item.line_total, business.currency))
        });
    let shipping = business.shipping_for(subtotal);

    let order = Repository::<Order>::new(state.store())
        .create(Order {
            items,
            subtotal,
            shipping,
            total: subtotal.plus(shipping),
            status: OrderStatus::Pending,
            shipping_address,
            email: email.into_inner(),
            ..Order::default()
        })
        .await?;

    save_cart(&session, &Cart::default()).await?;

    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order.id.as_str())]));
    info!(order_id = %order.id, total = %order.total, "Order placed");

    Ok((StatusCode::CREATED, Json(order)))
}

/// Price every cart line from the catalog, checking existence and stock.
async fn price_items(
    state: &AppState,
    cart: &Cart,
    business: &BusinessConfig,
) -> Result<Vec<OrderItem>> {
    let customization = SingletonRepository::<CustomizationConfig>::new(state.store())
        .load()
        .await?;
    let products = Repository::<Product>::new(state.store());

    let mut items = Vec::with_capacity(cart.items.len());
    for line in &cart.items {
        let product = products.get(line.product_id.as_str()).await?.ok_or_else(|| {
            AppError::BadRequest(format!("{} is no longer available", line.name))
        })?;

        // Stock is per product, so count every line of the same product.
        if !product.has_stock_for(cart.quantity_of(&line.product_id)) {
            return Err(AppError::BadRequest(format!(
                "Only {} of {} left in stock",
                product.stock, product.name
            )));
        }

        let unit_price = (product.price
            + customization.size_modifier(line.customization.size.as_deref()))
        .max(Decimal::ZERO);
        let line_total = Price::new(unit_price, business.currency).times(line.quantity);

        items.push(OrderItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price,
            quantity: line.quantity,
            line_total: line_total.amount,
            image: product.cover_image().map(str::to_string),
            customization: line.customization.clone(),
        });
    }

    Ok(items)
}

/// GET /api/orders/{id}
#[instrument(skip(state))]
pub async fn show_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Order>> {
    Repository::<Order>::new(state.store())
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{app_for, body_json, send_with, session_cookie, test_state};
    use axum::Router;
    use axum::http::Method;
    use serde_json::{Value, json};

    async fn call(
        app: &Router,
        cookie: Option<&str>,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Option<String>, Value) {
        let headers: Vec<(&str, &str)> = cookie.map(|c| vec![("cookie", c)]).unwrap_or_default();
        let response = send_with(app.clone(), method, uri, body, &headers).await;
        let cookie = session_cookie(&response);
        let status = response.status();
        (status, cookie, body_json(response).await)
    }

    fn assert_amount(price: &Value, expected: f64) {
        let amount = price["amount"].as_f64().unwrap();
        assert!((amount - expected).abs() < 1e-9, "{amount} != {expected}");
    }

    fn address() -> Value {
        json!({
            "fullName": "Ada Lovelace",
            "street": "12 Wick Lane",
            "city": "Portland",
            "postalCode": "97201",
            "country": "US"
        })
    }

    /// App with one product in stock and a cookie for a cart holding it.
    async fn cart_with(price_cents: i64, stock: u32, quantity: u32) -> (AppState, Router, String, Product) {
        let state = test_state();
        let product = Repository::<Product>::new(state.store())
            .create(Product {
                name: "Cedar Smoke".to_string(),
                price: Decimal::new(price_cents, 2),
                stock,
                ..Product::default()
            })
            .await
            .unwrap();
        let app = app_for(state.clone());
        let (_, cookie, _) = call(
            &app,
            None,
            Method::POST,
            "/api/cart/add",
            Some(json!({"productId": product.id, "quantity": quantity})),
        )
        .await;
        (state, app, cookie.unwrap(), product)
    }

    #[tokio::test]
    async fn test_checkout_creates_order_and_clears_cart() {
        let (state, app, cookie, product) = cart_with(2000, 5, 2).await;

        // Price rises after the item was added; checkout uses the new price.
        Repository::<Product>::new(state.store())
            .save(Product {
                price: Decimal::new(2250, 2),
                ..product
            })
            .await
            .unwrap();

        let (status, _, order) = call(
            &app,
            Some(&cookie),
            Method::POST,
            "/api/checkout",
            Some(json!({"email": "Ada@Example.com", "shippingAddress": address()})),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order["status"], "pending");
        assert_eq!(order["email"], "ada@example.com");
        assert_eq!(order["items"][0]["unitPrice"], json!(22.5));
        assert_eq!(order["subtotal"]["amount"], json!(45.0));
        assert_amount(&order["shipping"], 5.99);
        assert_amount(&order["total"], 50.99);

        let (_, _, cart) = call(&app, Some(&cookie), Method::GET, "/api/cart", None).await;
        assert_eq!(cart["count"], 0);

        let id = order["id"].as_str().unwrap();
        let (status, _, fetched) = call(&app, None, Method::GET, &format!("/api/orders/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["total"], order["total"]);
    }

    #[tokio::test]
    async fn test_free_shipping_over_threshold() {
        let (_, app, cookie, _) = cart_with(4000, 5, 2).await;
        let (_, _, order) = call(
            &app,
            Some(&cookie),
            Method::POST,
            "/api/checkout",
            Some(json!({"email": "ada@example.com", "shippingAddress": address()})),
        )
        .await;
        assert_eq!(order["shipping"]["amount"], json!(0.0));
        assert_eq!(order["total"]["amount"], json!(80.0));
    }

    #[tokio::test]
    async fn test_rejections() {
        let (_, app, cookie, _) = cart_with(2000, 1, 2).await;

        let (status, _, body) = call(
            &app,
            None,
            Method::POST,
            "/api/checkout",
            Some(json!({"email": "ada@example.com", "shippingAddress": address()})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Cart is empty"}));

        let (status, _, _) = call(
            &app,
            Some(&cookie),
            Method::POST,
            "/api/checkout",
            Some(json!({"email": "not-an-email", "shippingAddress": address()})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, body) = call(
            &app,
            Some(&cookie),
            Method::POST,
            "/api/checkout",
            Some(json!({"email": "ada@example.com", "shippingAddress": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "missing required address fields: fullName, street, city, postalCode, country"
        );

        let (status, _, body) = call(
            &app,
            Some(&cookie),
            Method::POST,
            "/api/checkout",
            Some(json!({"email": "ada@example.com", "shippingAddress": address()})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Only 1 of Cedar Smoke left in stock");
    }

    #[tokio::test]
    async fn test_stock_counts_every_customized_line() {
        let state = test_state();
        let product = Repository::<Product>::new(state.store())
            .create(Product {
                name: "Cedar Smoke".to_string(),
                price: Decimal::new(2000, 2),
                stock: 0,
                customizable: true,
                ..Product::default()
            })
            .await
            .unwrap();
        let app = app_for(state);

        let (status, cookie, _) = call(
            &app,
            None,
            Method::POST,
            "/api/cart/add",
            Some(json!({"productId": product.id, "quantity": u32::MAX, "customization": {"scent": "A"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let cookie = cookie.unwrap();

        let (status, _, _) = call(
            &app,
            Some(&cookie),
            Method::POST,
            "/api/cart/add",
            Some(json!({"productId": product.id, "quantity": 1, "customization": {"scent": "B"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, body) = call(
            &app,
            Some(&cookie),
            Method::POST,
            "/api/checkout",
            Some(json!({"email": "ada@example.com", "shippingAddress": address()})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Only 0 of Cedar Smoke left in stock");
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let app = app_for(test_state());
        let (status, _, _) = call(&app, None, Method::GET, "/api/orders/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
