use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use sw_web::Lang;
use sw_web::i18n::{Key, t};
use sw_web::pages::render_login;
use tracing::{info, warn};

use crate::routes::{expire, safe_return};
use crate::session::{SESSION_COOKIE, jar_lang, lang_cookie, session_cookie};
use crate::state::ApiState;

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout).post(logout))
        .route("/set-lang", post(set_lang))
}

async fn login_page(State(state): State<ApiState>, jar: CookieJar) -> Response {
    if state.sessions.from_jar(&jar).await.is_some() {
        return Redirect::to("/").into_response();
    }
    Html(render_login(jar_lang(&jar), None, "")).into_response()
}

#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// A rejected login re-renders the form in place with the backend's error.
async fn login(State(state): State<ApiState>, jar: CookieJar, Form(form): Form<LoginForm>) -> Response {
    let lang = jar_lang(&jar);
    let username = form.username.trim();

    match state.backend.login(username, &form.password).await {
        Ok(outcome) if outcome.result.success => {
            let client = match outcome.cookie {
                Some(cookie) => state.backend.with_session(cookie),
                None => state.backend.clone(),
            };
            let session = state.open_session(username, client, lang).await;
            (jar.add(session_cookie(session.id)), Redirect::to("/")).into_response()
        }
        Ok(outcome) => {
            let error = outcome
                .result
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "Login failed".to_string());
            info!(user = username, "Login rejected: {}", error);
            Html(render_login(lang, Some(&error), username)).into_response()
        }
        Err(e) => {
            warn!("Login request failed: {}", e);
            Html(render_login(lang, Some(t(lang, Key::ConnectionError)), username)).into_response()
        }
    }
}

async fn logout(State(state): State<ApiState>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(session) = state.sessions.from_jar(&jar).await {
        state.sessions.remove(&session.id).await;
    }
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Redirect::to("/login"),
    )
}

#[derive(Deserialize)]
struct LangForm {
    #[serde(default)]
    lang: String,
    return_to: Option<String>,
}

async fn set_lang(State(state): State<ApiState>, jar: CookieJar, Form(form): Form<LangForm>) -> Response {
    let target = safe_return(form.return_to.as_deref());
    let Some(lang) = Lang::parse(&form.lang) else {
        return Redirect::to(target).into_response();
    };

    if let Some(session) = state.sessions.from_jar(&jar).await {
        match session.client.set_lang(lang.code()).await {
            Ok(cookie) => state.sessions.update_lang(&session.id, lang, cookie).await,
            Err(e) if e.is_unauthorized() => return expire(&state, &session).await,
            Err(e) => {
                warn!("Backend language switch failed: {}", e);
                state.sessions.update_lang(&session.id, lang, None).await;
            }
        }
    }

    (jar.add(lang_cookie(lang)), Redirect::to(target)).into_response()
}
