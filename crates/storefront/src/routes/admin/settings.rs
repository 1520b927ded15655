//! Singleton settings under `siteConfig/`.

use axum::{Json, Router, extract::State, routing::get};
use tracing::{info, instrument};

use crate::db::{Singleton, SingletonRepository};
use crate::error::{AppError, Result};
use crate::extract::AppJson;
use crate::middleware::RequireAdmin;
use crate::models::{BusinessConfig, CustomizationConfig, HeroPopupConfig};
use crate::state::AppState;

/// Settings document editable through the admin API.
pub trait AdminSettings: Singleton {
    fn validate(&self) -> std::result::Result<(), String> {
        Ok(())
    }
}

impl AdminSettings for HeroPopupConfig {}

impl AdminSettings for CustomizationConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.max_message_length == 0 {
            return Err("Maximum message length must be positive".to_string());
        }
        if self.sizes.iter().any(|size| size.name.trim().is_empty()) {
            return Err("Every size needs a name".to_string());
        }
        Ok(())
    }
}

impl AdminSettings for BusinessConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.shipping_flat_rate.is_sign_negative() {
            return Err("Shipping rate cannot be negative".to_string());
        }
        Ok(())
    }
}

/// `GET` and `PUT` for one settings document.
pub fn routes<T: AdminSettings>() -> Router<AppState> {
    Router::new().route("/", get(show::<T>).put(replace::<T>))
}

#[instrument(skip_all, fields(doc = T::DOC_ID))]
async fn show<T: AdminSettings>(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<T>> {
    Ok(Json(SingletonRepository::<T>::new(state.store()).load().await?))
}

#[instrument(skip_all, fields(doc = T::DOC_ID))]
async fn replace<T: AdminSettings>(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    AppJson(settings): AppJson<T>,
) -> Result<Json<T>> {
    settings.validate().map_err(AppError::BadRequest)?;
    let settings = SingletonRepository::<T>::new(state.store())
        .save(settings)
        .await?;

    info!("Settings saved");
    Ok(Json(settings))
}
