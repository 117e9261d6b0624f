use super::error::*;
use super::handler;
use crate::application_impl::RequestAuthenticator;
use crate::application_port::AuthenticatedSession;
use crate::server::*;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let signup = warp::path!("signup")
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::signup);

    let login = warp::path!("login")
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::login);

    let logout = warp::path!("logout")
        .and(warp::post())
        .and(with_authentication(server.authenticator.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::logout);

    let refresh = warp::path!("refresh")
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::refresh);

    let me = warp::path!("users" / "me")
        .and(warp::get())
        .and(with_authentication(server.authenticator.clone()))
        .and(with(server.user_service.clone()))
        .and_then(handler::me);

    let create_entry = warp::path!("entries")
        .and(warp::post())
        .and(with_authentication(server.authenticator.clone()))
        .and(json_body())
        .and(with(server.entry_service.clone()))
        .and_then(handler::create_entry);

    let list_entries = warp::path!("entries")
        .and(warp::get())
        .and(with_authentication(server.authenticator.clone()))
        .and(warp::query::<HashMap<String, String>>())
        .and(with(server.entry_service.clone()))
        .and_then(handler::list_entries);

    let get_entry = warp::path!("entries" / u64)
        .and(warp::get())
        .and(with_authentication(server.authenticator.clone()))
        .and(with(server.entry_service.clone()))
        .and_then(handler::get_entry);

    let update_entry = warp::path!("entries" / u64)
        .and(warp::put())
        .and(with_authentication(server.authenticator.clone()))
        .and(json_body())
        .and(with(server.entry_service.clone()))
        .and_then(handler::update_entry);

    let delete_entry = warp::path!("entries" / u64)
        .and(warp::delete())
        .and(with_authentication(server.authenticator.clone()))
        .and(with(server.entry_service.clone()))
        .and_then(handler::delete_entry);

    signup
        .or(login)
        .or(logout)
        .or(refresh)
        .or(me)
        .or(create_entry)
        .or(list_entries)
        .or(get_entry)
        .or(update_entry)
        .or(delete_entry)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// Every failure collapses to the same rejection so responses never tell
/// an expired token from a revoked or forged one.
fn with_authentication(
    authenticator: Arc<RequestAuthenticator>,
) -> impl Filter<Extract = (AuthenticatedSession,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(http::header::AUTHORIZATION.as_str()).and_then(
        move |authorization: Option<String>| {
            let authenticator = authenticator.clone();
            async move {
                authenticator
                    .authenticate(authorization.as_deref())
                    .await
                    .map_err(ApiErrorCode::from)
                    .map_err(reject::custom)
            }
        },
    )
}
