//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Prices are captured when a line
//! is added and recomputed from the catalog at checkout.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use ember_wick_core::{CandleCustomization, Price};

use crate::db::SingletonRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::AppJson;
use crate::middleware::session_keys;
use crate::models::{BusinessConfig, Cart, CartItem, CustomizationConfig};
use crate::state::AppState;

/// Cart as returned to the client.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub count: u32,
    pub subtotal: Price,
}

/// Cart count for the header badge.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub customization: CandleCustomization,
}

const fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    pub line_id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartRequest {
    pub line_id: String,
}

/// Get the cart from the session, empty when there is none yet.
pub(crate) async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session.get::<Cart>(session_keys::CART).await?.unwrap_or_default())
}

/// Store the cart in the session.
pub(crate) async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

async fn view(state: &AppState, cart: Cart) -> Result<CartView> {
    let business = SingletonRepository::<BusinessConfig>::new(state.store())
        .load()
        .await?;
    Ok(CartView {
        count: cart.count(),
        subtotal: cart.subtotal(business.currency),
        items: cart.items,
    })
}

/// GET /api/cart
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await?;
    Ok(Json(view(&state, cart).await?))
}

/// POST /api/cart/add
#[instrument(skip(state, session, request), fields(product_id = %request.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    AppJson(request): AppJson<AddToCartRequest>,
) -> Result<Json<CartView>> {
    if request.quantity == 0 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_string(),
        ));
    }

    let product = state
        .catalog()
        .product(&request.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    let customization = request.customization.normalized();
    let mut unit_price = product.price;
    if !customization.is_empty() {
        if !product.customizable {
            return Err(AppError::BadRequest(
                "Product is not customizable".to_string(),
            ));
        }

        let config = SingletonRepository::<CustomizationConfig>::new(state.store())
            .load()
            .await?;
        config
            .validate(&customization)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        unit_price += config.size_modifier(customization.size.as_deref());
    }

    let mut cart = load_cart(&session).await?;
    let line = cart.add(CartItem {
        line_id: String::new(),
        product_id: product.id.clone(),
        name: product.name.clone(),
        unit_price: unit_price.max(Decimal::ZERO),
        quantity: request.quantity,
        image: product.cover_image().map(str::to_string),
        customization,
    });
    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product.id.as_str()), ("line_id", &line.line_id)]),
    );
    save_cart(&session, &cart).await?;

    Ok(Json(view(&state, cart).await?))
}

/// POST /api/cart/update
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    AppJson(request): AppJson<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    if !cart.update_quantity(&request.line_id, request.quantity) {
        return Err(AppError::NotFound("Cart line".to_string()));
    }
    save_cart(&session, &cart).await?;

    Ok(Json(view(&state, cart).await?))
}

/// POST /api/cart/remove
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    AppJson(request): AppJson<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    if !cart.remove(&request.line_id) {
        return Err(AppError::NotFound("Cart line".to_string()));
    }
    save_cart(&session, &cart).await?;

    Ok(Json(view(&state, cart).await?))
}

/// POST /api/cart/clear
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let cart = Cart::default();
    save_cart(&session, &cart).await?;
    Ok(Json(view(&state, cart).await?))
}

/// GET /api/cart/count
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<Json<CartCount>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartCount {
        count: cart.count(),
    }))
}
