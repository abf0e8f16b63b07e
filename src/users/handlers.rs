use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::User;
use crate::users::services;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user/", post(create_user).put(update_user))
        .route("/user/all", get(get_all_users))
        .route(
            "/user/uploadImage",
            post(upload_image).layer(DefaultBodyLimit::max(10 * 1024 * 1024)),
        )
        .route("/user/:id", get(get_user).delete(delete_user))
}

#[instrument(skip(state, user), fields(email = %user.email))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(user): Json<User>,
) -> Result<Json<User>, ApiError> {
    services::create(&state, user).await.map(Json)
}

#[instrument(skip(state))]
pub async fn get_all_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    services::get_all(&state).await.map(Json)
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    services::get(&state, id).await.map(Json)
}

#[instrument(skip(state, user), fields(user_id = user.id, email = %user.email))]
pub async fn update_user(
    State(state): State<AppState>,
    Json(user): Json<User>,
) -> Result<Json<User>, ApiError> {
    services::update(&state, user).await.map(Json)
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<(), ApiError> {
    services::remove(&state, id).await
}

/// Stores the part named `file` under its declared part name, so the
/// target filename is fixed by the contract rather than chosen by the
/// client's original filename.
#[instrument(skip(state, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.name().map(|s| s.to_string()) else {
            continue;
        };
        if name == "file" {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            return services::store_image(&state, &name, bytes).await;
        }
    }
    Err(ApiError::BadRequest("missing multipart part 'file'".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> User {
        User {
            id: 0,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
        }
    }

    #[tokio::test]
    async fn create_returns_saved_user() {
        let state = AppState::fake();
        let Json(saved) = create_user(State(state.clone()), Json(ada())).await.unwrap();
        assert!(saved.id > 0);
        assert_eq!(saved.email, "ada@example.com");
    }

    #[tokio::test]
    async fn get_round_trips_created_user() {
        let state = AppState::fake();
        let Json(saved) = create_user(State(state.clone()), Json(ada())).await.unwrap();
        let Json(fetched) = get_user(State(state), Path(saved.id)).await.unwrap();
        assert_eq!(fetched, saved);
    }

    #[tokio::test]
    async fn get_missing_user_maps_to_404() {
        let state = AppState::fake();
        let err = get_user(State(state), Path(999)).await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_create_maps_to_409_with_reason() {
        let state = AppState::fake();
        create_user(State(state.clone()), Json(ada())).await.unwrap();
        let err = create_user(State(state), Json(ada())).await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "Email already used by other user");
    }

    #[tokio::test]
    async fn delete_removes_user() {
        let state = AppState::fake();
        let Json(saved) = create_user(State(state.clone()), Json(ada())).await.unwrap();
        delete_user(State(state.clone()), Path(saved.id)).await.unwrap();
        let Json(all) = get_all_users(State(state)).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn delete_missing_user_maps_to_404() {
        let state = AppState::fake();
        let err = delete_user(State(state), Path(1)).await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
    }
}
