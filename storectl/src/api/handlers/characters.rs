//! Thin proxy to the third-party character API.

use crate::{AppState, auth::CurrentUser, errors::{Error, Result}};
use axum::{
    Json,
    extract::{Path, State},
};
use tracing::{instrument, warn};

/// GET /api/characters/{id}
///
/// Forwards to the configured upstream and relays its JSON body. Any upstream
/// failure (connect, timeout, non-success status, bad payload) surfaces as a
/// 502; the upstream's own 404 is passed through as ours.
#[instrument(skip(state, _current_user), err)]
pub async fn get_character(
    _current_user: CurrentUser,
    State(state): State<AppState>,
    Path(character_id): Path<u32>,
) -> Result<Json<serde_json::Value>> {
    let base = state.config.characters.base_url.as_str().trim_end_matches('/');
    let url = format!("{base}/{character_id}");

    let response = state.http.get(&url).send().await.map_err(|error| {
        warn!(%error, "Character upstream request failed");
        Error::Upstream {
            message: "request failed".to_string(),
        }
    })?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(Error::NotFound {
            resource: "Character".to_string(),
            id: character_id.to_string(),
        });
    }
    if !response.status().is_success() {
        warn!(status = %response.status(), "Character upstream returned an error");
        return Err(Error::Upstream {
            message: format!("upstream status {}", response.status().as_u16()),
        });
    }

    let body = response.json::<serde_json::Value>().await.map_err(|error| {
        warn!(%error, "Character upstream returned malformed JSON");
        Error::Upstream {
            message: "malformed upstream response".to_string(),
        }
    })?;

    Ok(Json(body))
}
