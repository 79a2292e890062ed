//! User console handlers.
//!
//! ```text
//! GET  /users              list + filter + sort + paginate
//! GET  /users/new          empty create form
//! POST /users/new          create
//! GET  /users/{id}/edit    pre-filled edit form
//! POST /users/{id}/edit    update
//! POST /users/import       bulk import (token-guarded)
//! POST /users/{id}/delete  delete (token-guarded)
//! ```
//!
//! Every failure path ends in a rendered page or a redirect; the upstream
//! being down never fails a request.

use actix_web::http::header;
use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{FormErrors, GatewayError, ListParams, ListQuery, UserForm, UserPage};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::{ApiResult, csrf, render};

const INVALID_TOKEN_MESSAGE: &str = "Invalid form token; please retry.";

/// Token-only payload submitted by the import and delete forms.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TokenForm {
    /// Anti-forgery token.
    #[serde(rename = "_token", skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// List users with filtering, sorting, and pagination.
///
/// An upstream failure still renders the page: the error becomes a flash
/// message over an empty result set with default pagination metadata.
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<ListParams>,
) -> ApiResult<HttpResponse> {
    let query = ListQuery::from_params(&params);
    let page = match state.queries.list(&query).await {
        Ok(page) => page,
        Err(error) => {
            session.flash_error(format!("Could not fetch users: {error}"))?;
            UserPage::empty()
        }
    };

    let secret = session.form_secret()?;
    let delete_tokens: Vec<String> = page
        .users
        .iter()
        .map(|user| csrf::form_token(&csrf::delete_action(user.id), &secret))
        .collect();
    let import_token = csrf::form_token(csrf::IMPORT_ACTION, &secret);
    let flashes = session.take_flashes()?;

    Ok(html(render::list_page(&render::ListPage {
        users: &page.users,
        meta: page.meta,
        query: &query,
        flashes: &flashes,
        import_token: &import_token,
        delete_tokens: &delete_tokens,
    })))
}

/// Render the empty create form.
#[get("/users/new")]
pub async fn new_user_form(session: SessionContext) -> ApiResult<HttpResponse> {
    let secret = session.form_secret()?;
    render_user_form(
        &session,
        render::UserFormMode::New,
        &UserForm::default(),
        &FormErrors::new(),
        &secret,
    )
}

/// Validate and create a user, re-rendering the form on any rejection.
#[post("/users/new")]
pub async fn create_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Form<UserForm>,
) -> ApiResult<HttpResponse> {
    let form = payload.into_inner();
    let secret = session.form_secret()?;
    match submit_user(&state, &session, None, &form, &secret).await? {
        SubmitOutcome::Saved => {
            session.flash_success("User created successfully.")?;
            Ok(redirect_to_list())
        }
        SubmitOutcome::Invalid(errors) => {
            render_user_form(&session, render::UserFormMode::New, &form, &errors, &secret)
        }
    }
}

/// Render the edit form pre-filled from the upstream record.
#[get("/users/{id}/edit")]
pub async fn edit_user_form(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let Ok(user) = state.queries.fetch(id).await else {
        session.flash_error("User not found.")?;
        return Ok(redirect_to_list());
    };

    let secret = session.form_secret()?;
    render_user_form(
        &session,
        render::UserFormMode::Edit { id },
        &UserForm::from_user(&user),
        &FormErrors::new(),
        &secret,
    )
}

/// Validate and update a user, re-rendering the form on any rejection.
#[post("/users/{id}/edit")]
pub async fn update_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
    payload: web::Form<UserForm>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    // The record must still exist before an update is attempted.
    if state.queries.fetch(id).await.is_err() {
        session.flash_error("User not found.")?;
        return Ok(redirect_to_list());
    }

    let form = payload.into_inner();
    let secret = session.form_secret()?;
    match submit_user(&state, &session, Some(id), &form, &secret).await? {
        SubmitOutcome::Saved => {
            session.flash_success("User updated successfully.")?;
            Ok(redirect_to_list())
        }
        SubmitOutcome::Invalid(errors) => render_user_form(
            &session,
            render::UserFormMode::Edit { id },
            &form,
            &errors,
            &secret,
        ),
    }
}

/// Trigger the upstream bulk import.
///
/// An invalid or missing token silently no-ops into the redirect.
#[post("/users/import")]
pub async fn import_users(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Form<TokenForm>,
) -> ApiResult<HttpResponse> {
    let secret = session.form_secret()?;
    if csrf::token_matches(csrf::IMPORT_ACTION, payload.token.as_deref(), &secret) {
        match state.commands.import_users().await {
            Ok(outcome) => session.flash_success(
                outcome
                    .message
                    .unwrap_or_else(|| "Users imported successfully.".to_owned()),
            )?,
            Err(error) => session.flash_error(format!("Error importing users: {error}"))?,
        }
    }
    Ok(redirect_to_list())
}

/// Delete one user.
///
/// The token is scoped to the id; an invalid or missing token silently
/// no-ops into the redirect.
#[post("/users/{id}/delete")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
    payload: web::Form<TokenForm>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let secret = session.form_secret()?;
    if csrf::token_matches(&csrf::delete_action(id), payload.token.as_deref(), &secret) {
        match state.commands.delete(id).await {
            Ok(()) => session.flash_success("User deleted successfully.")?,
            Err(error) => session.flash_error(format!("Error deleting user: {error}"))?,
        }
    }
    Ok(redirect_to_list())
}

enum SubmitOutcome {
    Saved,
    Invalid(FormErrors),
}

/// Shared create/update pipeline: token check, local validation, port call,
/// 422 mapping.
async fn submit_user(
    state: &HttpState,
    session: &SessionContext,
    target: Option<i64>,
    form: &UserForm,
    secret: &str,
) -> Result<SubmitOutcome, crate::domain::Error> {
    if !csrf::token_matches(csrf::USER_FORM_ACTION, form.token.as_deref(), secret) {
        let mut errors = FormErrors::new();
        errors.add_form(INVALID_TOKEN_MESSAGE);
        return Ok(SubmitOutcome::Invalid(errors));
    }

    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => return Ok(SubmitOutcome::Invalid(errors)),
    };

    let result = match target {
        None => state.commands.create(&draft).await,
        Some(id) => state.commands.update(id, &draft).await,
    };

    match result {
        Ok(_) => Ok(SubmitOutcome::Saved),
        Err(GatewayError::Rejected { errors }) => {
            let mut form_errors = FormErrors::new();
            form_errors.absorb_upstream(&errors);
            Ok(SubmitOutcome::Invalid(form_errors))
        }
        Err(error) => {
            let verb = if target.is_none() {
                "creating"
            } else {
                "updating"
            };
            session.flash_error(format!("Error {verb} user: {error}"))?;
            Ok(SubmitOutcome::Invalid(FormErrors::new()))
        }
    }
}

fn render_user_form(
    session: &SessionContext,
    mode: render::UserFormMode,
    form: &UserForm,
    errors: &FormErrors,
    secret: &str,
) -> ApiResult<HttpResponse> {
    let token = csrf::form_token(csrf::USER_FORM_ACTION, secret);
    let flashes = session.take_flashes()?;
    Ok(html(render::user_form_page(&render::UserFormPage {
        mode,
        form,
        errors,
        token: &token,
        flashes: &flashes,
    })))
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

fn redirect_to_list() -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/users"))
        .finish()
}
