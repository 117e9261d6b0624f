use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: &ApiErrorCode) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.code(),
                message: code.to_string(),
            }),
        }
    }
}

// region auth

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user_id: UserId,
}

pub async fn signup(
    body: SignupRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let signup_input = SignupInput {
        name: body.name,
        email: body.email,
        password: body.password,
    };
    let user_id = auth_service
        .signup(signup_input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&ApiResponse::ok(SignupResponse { user_id })),
        StatusCode::CREATED,
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token pair as handed to clients. Session identifiers stay server-side.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

impl SessionResponse {
    fn new(user_id: Option<UserId>, tokens: TokenPair) -> Self {
        SessionResponse {
            user_id,
            access_token: tokens.access_token.0,
            refresh_token: tokens.refresh_token.0,
            access_token_expires_at: tokens.access_expires_at,
            refresh_token_expires_at: tokens.refresh_expires_at,
        }
    }
}

pub async fn login(
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let login_input = LoginInput {
        email: body.email,
        password: body.password,
    };
    let login_result = auth_service
        .login(login_input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let response = SessionResponse::new(Some(login_result.user_id), login_result.tokens);
    Ok(warp::reply::json(&ApiResponse::ok(response)))
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub revoked: u64,
}

pub async fn logout(
    session: AuthenticatedSession,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let revoked = auth_service
        .logout(session.session_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(LogoutResponse { revoked })))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh(
    body: RefreshRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let tokens = auth_service
        .refresh(&body.refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let response = SessionResponse::new(None, tokens);
    Ok(warp::reply::json(&ApiResponse::ok(response)))
}

// endregion

pub async fn me(
    session: AuthenticatedSession,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = user_service
        .get_profile(session.user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(user)))
}

// region entries

/// Owner fields in the payload are not part of the contract and are dropped
/// by deserialization; the owner is always the authenticated user.
#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    pub title: String,
    pub description: String,
}

impl From<EntryRequest> for EntryInput {
    fn from(body: EntryRequest) -> Self {
        EntryInput {
            title: body.title,
            description: body.description,
        }
    }
}

/// Listing parameters as sent. A value that does not parse is treated as
/// absent and falls back to its default.
#[derive(Debug, Default)]
pub struct EntryListQuery {
    pub limit: Option<u16>,
    pub page: Option<u32>,
    pub year: Option<i32>,
    pub year_gte: Option<i32>,
    pub year_lte: Option<i32>,
    pub sort: Option<SortOrder>,
}

impl EntryListQuery {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        fn parsed<T: FromStr>(params: &HashMap<String, String>, key: &str) -> Option<T> {
            params.get(key).and_then(|v| v.trim().parse().ok())
        }

        EntryListQuery {
            limit: parsed(params, "limit"),
            page: parsed(params, "page"),
            year: parsed(params, "year"),
            year_gte: parsed(params, "year[gte]"),
            year_lte: parsed(params, "year[lte]"),
            sort: params
                .get("sort")
                .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
                    "asc" => Some(SortOrder::Asc),
                    "desc" => Some(SortOrder::Desc),
                    _ => None,
                }),
        }
    }
}

impl From<EntryListQuery> for EntryQuery {
    fn from(query: EntryListQuery) -> Self {
        // A single `year` pins both bounds.
        EntryQuery {
            page_size: query.limit.map(PageSize).unwrap_or_default(),
            page: query.page.unwrap_or(1),
            year_from: query.year.or(query.year_gte),
            year_to: query.year.or(query.year_lte),
            sort: query.sort.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: u64,
}

pub async fn create_entry(
    session: AuthenticatedSession,
    body: EntryRequest,
    entry_service: Arc<dyn EntryService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let entry = entry_service
        .create(session.user_id, body.into())
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&ApiResponse::ok(entry)),
        StatusCode::CREATED,
    ))
}

pub async fn list_entries(
    session: AuthenticatedSession,
    params: HashMap<String, String>,
    entry_service: Arc<dyn EntryService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let query = EntryListQuery::from_params(&params);
    let entries = entry_service
        .list(session.user_id, query.into())
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(entries)))
}

pub async fn get_entry(
    entry_id: u64,
    session: AuthenticatedSession,
    entry_service: Arc<dyn EntryService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let entry = entry_service
        .get(session.user_id, EntryId(entry_id))
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(entry)))
}

pub async fn update_entry(
    entry_id: u64,
    session: AuthenticatedSession,
    body: EntryRequest,
    entry_service: Arc<dyn EntryService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let entry = entry_service
        .update(session.user_id, EntryId(entry_id), body.into())
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(entry)))
}

pub async fn delete_entry(
    entry_id: u64,
    session: AuthenticatedSession,
    entry_service: Arc<dyn EntryService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let deleted = entry_service
        .delete(session.user_id, EntryId(entry_id))
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(DeleteResponse { deleted })))
}

// endregion
