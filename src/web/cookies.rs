use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Response;
use cookie::{Cookie, SameSite};
use tracing::warn;

use crate::services::delete_confirmation::PendingDelete;

pub const PENDING_DELETE_COOKIE: &str = "pending_delete";

fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|hv| hv.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .map(str::trim)
        .find_map(|c| c.strip_prefix(name).and_then(|rest| rest.strip_prefix('=')))
}

pub fn read_pending_delete(headers: &HeaderMap) -> Option<PendingDelete> {
    find_cookie(headers, PENDING_DELETE_COOKIE).and_then(PendingDelete::decode)
}

fn base_cookie(value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(PENDING_DELETE_COOKIE, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

pub fn arm_cookie(token: &PendingDelete) -> Cookie<'static> {
    base_cookie(token.encode())
}

pub fn clear_cookie() -> Cookie<'static> {
    let mut cookie = base_cookie(String::new());
    cookie.make_removal();
    cookie
}

pub fn with_cookie(mut response: Response, cookie: &Cookie<'_>) -> Response {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => warn!("Could not encode cookie {}: {}", cookie.name(), e),
    }
    response
}
