//! Customer account route handlers.
//!
//! Sign-in exchanges email and password for a Shopify customer access
//! token, which is kept in the session. The overview page requires it.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use indecisive_wear_core::{Email, Market};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::customer::{OptionalCustomer, RequireCustomer, is_local_path, login_redirect};
use crate::models::session;
use crate::notifications::Toast;
use crate::shopify::ShopifyError;
use crate::shopify::types::{Customer, CustomerAccessToken, CustomerCreateInput, Order};
use crate::state::AppState;
use crate::views::PageContext;

/// Shortest password Shopify accepts.
pub const MIN_PASSWORD_LENGTH: usize = 5;

const ACCOUNT_PATH: &str = "/account";

// =============================================================================
// Forms and Templates
// =============================================================================

/// Where to go after signing in.
#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    pub redirect: Option<String>,
}

/// Login form data. Not `Debug` so the password never reaches logs.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub redirect: Option<String>,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub accepts_marketing: Option<String>,
}

/// Password recovery form data.
#[derive(Debug, Deserialize)]
pub struct RecoverForm {
    pub email: String,
}

/// Order display data for templates.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub name: String,
    pub date: String,
    pub payment: String,
    pub fulfillment: String,
    pub total: String,
    pub item_count: u32,
    pub status_url: Option<String>,
}

impl OrderView {
    fn new(order: &Order, market: &Market) -> Self {
        Self {
            name: order.name.clone(),
            date: order
                .processed_at
                .map(|at| at.format("%-d %B %Y").to_string())
                .unwrap_or_default(),
            payment: order
                .financial_status
                .as_deref()
                .map(humanize_status)
                .unwrap_or_default(),
            fulfillment: humanize_status(&order.fulfillment_status),
            total: order.total.format(market.locale),
            item_count: order.item_count,
            status_url: order.status_url.clone(),
        }
    }
}

/// Customer display data for templates.
#[derive(Debug, Clone)]
pub struct CustomerView {
    pub name: String,
    pub email: String,
}

impl From<&Customer> for CustomerView {
    fn from(customer: &Customer) -> Self {
        let name = match (&customer.first_name, &customer.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            _ => customer.display_name.clone(),
        };
        Self {
            name,
            email: customer.email.clone().unwrap_or_default(),
        }
    }
}

/// Account overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/show.html")]
pub struct AccountTemplate {
    pub ctx: PageContext,
    pub customer: CustomerView,
    pub orders: Vec<OrderView>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub error: Option<String>,
    pub email: String,
    pub redirect: String,
}

/// Registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub error: Option<String>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Password recovery page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/recover.html")]
pub struct RecoverTemplate {
    pub ctx: PageContext,
    pub error: Option<String>,
    pub sent: bool,
}

// =============================================================================
// Helpers
// =============================================================================

/// `PARTIALLY_FULFILLED` -> `Partially fulfilled`.
fn humanize_status(status: &str) -> String {
    let lower = status.replace('_', " ").to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Post-login destination, restricted to paths on this site.
fn safe_redirect(target: Option<&str>) -> String {
    target
        .map(str::trim)
        .filter(|t| is_local_path(t))
        .unwrap_or(ACCOUNT_PATH)
        .to_string()
}

/// Store the token in a fresh session id.
async fn sign_in(session: &Session, token: &CustomerAccessToken) {
    if let Err(e) = session.cycle_id().await {
        tracing::warn!(error = %e, "Failed to cycle session id");
    }
    session::set_customer_token(session, token).await;
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the account overview with recent orders.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(token): RequireCustomer,
    ctx: PageContext,
) -> Result<Response> {
    let customer = match state.storefront().get_customer(&token).await {
        Ok(customer) => customer,
        Err(ShopifyError::NotFound(_)) => {
            // Token revoked on Shopify's side
            session::clear_customer_token(&session).await;
            session::push_flash(&session, Toast::info("Please sign in again")).await;
            return Ok(Redirect::to(&login_redirect(ACCOUNT_PATH)).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    set_sentry_user(&customer.id, customer.email.as_deref());

    Ok(AccountTemplate {
        customer: CustomerView::from(&customer),
        orders: customer
            .orders
            .iter()
            .map(|order| OrderView::new(order, ctx.market))
            .collect(),
        ctx,
    }
    .into_response())
}

/// Display the login form. Signed-in visitors go straight to their account.
#[instrument(skip_all)]
pub async fn login_page(
    OptionalCustomer(token): OptionalCustomer,
    ctx: PageContext,
    Query(query): Query<RedirectQuery>,
) -> Response {
    let redirect = safe_redirect(query.redirect.as_deref());
    if token.is_some() {
        return Redirect::to(&redirect).into_response();
    }

    LoginTemplate {
        ctx,
        error: None,
        email: String::new(),
        redirect,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let redirect = safe_redirect(form.redirect.as_deref());
    let render = |ctx, status: StatusCode, message: &str, email: String, redirect| {
        (
            status,
            LoginTemplate {
                ctx,
                error: Some(message.to_string()),
                email,
                redirect,
            },
        )
            .into_response()
    };

    let Ok(email) = Email::parse(&form.email) else {
        return Ok(render(
            ctx,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Enter a valid email address.",
            form.email,
            redirect,
        ));
    };

    let password = SecretString::from(form.password);
    let token = match state
        .storefront()
        .customer_access_token_create(&email, &password)
        .await
    {
        Ok(token) => token,
        Err(ShopifyError::UserError(e)) => {
            tracing::info!(domain = email.domain(), error = %e, "Sign-in rejected");
            return Ok(render(
                ctx,
                StatusCode::UNAUTHORIZED,
                "Incorrect email or password.",
                email.into_inner(),
                redirect,
            ));
        }
        Err(e) => return Err(e.into()),
    };

    sign_in(&session, &token).await;
    add_breadcrumb("auth", "Customer signed in", None);
    session::push_flash(&session, Toast::success("Welcome back")).await;

    Ok(Redirect::to(&redirect).into_response())
}

/// Display the registration form.
#[instrument(skip_all)]
pub async fn register_page(ctx: PageContext) -> RegisterTemplate {
    RegisterTemplate {
        ctx,
        error: None,
        email: String::new(),
        first_name: String::new(),
        last_name: String::new(),
    }
}

/// Handle registration: create the customer, then sign them in.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let first_name = form.first_name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    let last_name = form.last_name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    let render = |ctx, message: String, email: String| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            RegisterTemplate {
                ctx,
                error: Some(message),
                email,
                first_name: first_name.clone().unwrap_or_default(),
                last_name: last_name.clone().unwrap_or_default(),
            },
        )
            .into_response()
    };

    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(e) => return Ok(render(ctx, format!("Email address: {e}."), form.email)),
    };
    if form.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Ok(render(
            ctx,
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters."),
            email.into_inner(),
        ));
    }

    let password = SecretString::from(form.password);
    let input = CustomerCreateInput {
        email: email.as_str().to_string(),
        password: password.clone(),
        first_name: first_name.clone(),
        last_name: last_name.clone(),
        accepts_marketing: form.accepts_marketing.is_some(),
    };

    let customer_id = match state.storefront().customer_create(input).await {
        Ok(id) => id,
        Err(ShopifyError::UserError(message)) => {
            tracing::info!(domain = email.domain(), error = %message, "Registration rejected");
            return Ok(render(ctx, message, email.into_inner()));
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(customer_id = %customer_id, "Customer registered");

    let token = state
        .storefront()
        .customer_access_token_create(&email, &password)
        .await?;
    sign_in(&session, &token).await;
    add_breadcrumb("auth", "Customer registered", None);
    session::push_flash(&session, Toast::success("Welcome to Indecisive Wear")).await;

    Ok(Redirect::to(ACCOUNT_PATH).into_response())
}

/// Display the password recovery form.
#[instrument(skip_all)]
pub async fn recover_page(ctx: PageContext) -> RecoverTemplate {
    RecoverTemplate {
        ctx,
        error: None,
        sent: false,
    }
}

/// Ask Shopify to send a password reset email.
///
/// Unknown addresses get the same confirmation as known ones.
#[instrument(skip_all)]
pub async fn recover(
    State(state): State<AppState>,
    ctx: PageContext,
    Form(form): Form<RecoverForm>,
) -> Result<Response> {
    let Ok(email) = Email::parse(&form.email) else {
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            RecoverTemplate {
                ctx,
                error: Some("Enter a valid email address.".to_string()),
                sent: false,
            },
        )
            .into_response());
    };

    match state.storefront().customer_recover(&email).await {
        Ok(()) => {}
        Err(ShopifyError::UserError(e)) => {
            tracing::info!(domain = email.domain(), error = %e, "Recovery request rejected");
        }
        Err(e) => return Err(AppError::from(e)),
    }

    Ok(RecoverTemplate {
        ctx,
        error: None,
        sent: true,
    }
    .into_response())
}

/// Sign out: revoke the token and forget it.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalCustomer(token): OptionalCustomer,
) -> Redirect {
    if let Some(token) = token {
        if let Err(e) = state.storefront().customer_access_token_delete(&token).await {
            tracing::warn!(error = %e, "Failed to revoke customer access token");
        }
        session::clear_customer_token(&session).await;
        clear_sentry_user();
        add_breadcrumb("auth", "Customer signed out", None);
        session::push_flash(&session, Toast::info("You're signed out")).await;
    }

    Redirect::to("/")
}
