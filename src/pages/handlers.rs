use axum::{
    extract::{FromRef, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        extractors::PageUser,
        services::{authenticate, register_user, session_cookie, JwtKeys},
    },
    calculations::repo_types::Calculation,
    error::AppError,
    state::AppState,
};

use super::templates;

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/register", get(register_form).post(register_submit))
        .route("/login", get(login_form).post(login_submit))
        .route("/dashboard", get(dashboard))
        .route("/dashboard/rows", get(dashboard_rows))
        .route("/dashboard/view/:id", get(view_calculation))
        .route("/dashboard/edit/:id", get(edit_calculation))
}

pub fn asset_routes() -> Router<AppState> {
    Router::new().route("/static/app.js", get(app_js))
}

fn missing_calculation(username: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(templates::error_page(
            Some(username),
            "Calculation not found",
            "It may have been deleted, or it belongs to another account.",
        )),
    )
        .into_response()
}

fn server_error(username: Option<&str>) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(templates::error_page(
            username,
            "Something went wrong",
            "Please try again in a moment.",
        )),
    )
        .into_response()
}

/// Loads a calculation owned by `user` for the view and edit pages.
async fn owned_calculation(
    state: &AppState,
    user: &PageUser,
    raw_id: &str,
) -> Result<Calculation, Response> {
    let username = user.0.username.as_str();
    let Ok(id) = raw_id.parse::<Uuid>() else {
        return Err(missing_calculation(username));
    };
    match state.store.get_calculation(user.0.id, id).await {
        Ok(Some(calc)) => Ok(calc),
        Ok(None) => Err(missing_calculation(username)),
        Err(e) => {
            warn!(error = %e, calc_id = %id, "calculation lookup failed");
            Err(server_error(Some(username)))
        }
    }
}

async fn index() -> Redirect {
    Redirect::to("/dashboard")
}

async fn app_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        templates::APP_JS,
    )
}

async fn register_form() -> Html<String> {
    Html(templates::register_page(&RegisterRequest::default(), None))
}

#[instrument(skip(state, form), fields(username = %form.username))]
async fn register_submit(
    State(state): State<AppState>,
    Form(form): Form<RegisterRequest>,
) -> Response {
    match register_user(state.store.as_ref(), &form).await {
        Ok(user) => {
            info!(user_id = %user.id, "user registered");
            Redirect::to("/login").into_response()
        }
        Err(AppError::Internal(e)) => {
            warn!(error = ?e, "registration failed");
            server_error(None)
        }
        Err(e) => (
            e.status(),
            Html(templates::register_page(&form, Some(&e.to_string()))),
        )
            .into_response(),
    }
}

async fn login_form() -> Html<String> {
    Html(templates::login_page("", None))
}

#[instrument(skip(state, jar, form), fields(username = %form.username))]
async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginRequest>,
) -> Response {
    let user = match authenticate(state.store.as_ref(), &form).await {
        Ok(user) => user,
        Err(AppError::Internal(e)) => {
            warn!(error = ?e, "login failed");
            return server_error(None);
        }
        Err(e) => {
            return (
                e.status(),
                Html(templates::login_page(&form.username, Some(&e.to_string()))),
            )
                .into_response()
        }
    };

    let keys = JwtKeys::from_ref(&state);
    match keys.sign_access(user.id) {
        Ok(token) => {
            info!(user_id = %user.id, "user logged in");
            let jar = jar.add(session_cookie(token, &state.config));
            (jar, Redirect::to("/dashboard")).into_response()
        }
        Err(e) => {
            warn!(error = ?e, "token signing failed");
            server_error(None)
        }
    }
}

#[instrument(skip_all, fields(user_id = %user.0.id))]
async fn dashboard(State(state): State<AppState>, user: PageUser) -> Response {
    match state.store.list_calculations(user.0.id, None, 0).await {
        Ok(calcs) => Html(templates::dashboard_page(&user.0.username, &calcs)).into_response(),
        Err(e) => {
            warn!(error = %e, "listing calculations failed");
            server_error(Some(&user.0.username))
        }
    }
}

/// Table body only, for refreshing the dashboard after a change.
#[instrument(skip_all, fields(user_id = %user.0.id))]
async fn dashboard_rows(State(state): State<AppState>, user: PageUser) -> Response {
    match state.store.list_calculations(user.0.id, None, 0).await {
        Ok(calcs) => Html(templates::calculation_rows(&calcs)).into_response(),
        Err(e) => {
            warn!(error = %e, "listing calculations failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[instrument(skip(state, user), fields(user_id = %user.0.id))]
async fn view_calculation(
    State(state): State<AppState>,
    user: PageUser,
    Path(id): Path<String>,
) -> Response {
    match owned_calculation(&state, &user, &id).await {
        Ok(calc) => Html(templates::view_page(&user.0.username, &calc)).into_response(),
        Err(page) => page,
    }
}

#[instrument(skip(state, user), fields(user_id = %user.0.id))]
async fn edit_calculation(
    State(state): State<AppState>,
    user: PageUser,
    Path(id): Path<String>,
) -> Response {
    match owned_calculation(&state, &user, &id).await {
        Ok(calc) => Html(templates::edit_page(&user.0.username, &calc)).into_response(),
        Err(page) => page,
    }
}
