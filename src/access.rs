//! Shared-token gate in front of the guest API, plus the admin bearer check.
//!
//! Guests arrive through a QR code link carrying `?token=...`. A valid link
//! drops a cookie so later requests from the same browser pass without it.

use actix_web::{
    body::{EitherBody, MessageBody},
    cookie::{time::Duration, Cookie, SameSite},
    dev::{ServiceRequest, ServiceResponse},
    http::header,
    middleware::Next,
    web, Error, ResponseError,
};
use sha2::{Digest, Sha256};

use crate::error::ApiError;

pub const ACCESS_COOKIE: &str = "wedding_access";
pub const ACCESS_HEADER: &str = "X-Access-Token";

#[derive(Debug, Clone)]
pub struct AccessConfig {
    pub token: String,
    pub admin_token: Option<String>,
    pub cookie_days: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Query,
    Cookie,
    Header,
}

/// Constant-time comparison over SHA-256 digests of both tokens.
pub fn tokens_match(candidate: &str, secret: &str) -> bool {
    let (a, b) = (Sha256::digest(candidate.as_bytes()), Sha256::digest(secret.as_bytes()));
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn query_token(query: &str) -> Option<String> {
    web::Query::<std::collections::HashMap<String, String>>::from_query(query)
        .ok()
        .and_then(|q| q.get("token").cloned())
}

fn admit(req: &ServiceRequest, token: &str) -> Option<Admission> {
    if query_token(req.query_string()).is_some_and(|t| tokens_match(&t, token)) {
        return Some(Admission::Query);
    }
    if req.cookie(ACCESS_COOKIE).is_some_and(|c| tokens_match(c.value(), token)) {
        return Some(Admission::Cookie);
    }
    let from_header = req.headers().get(ACCESS_HEADER).and_then(|v| v.to_str().ok());
    if from_header.is_some_and(|t| tokens_match(t, token)) {
        return Some(Admission::Header);
    }
    None
}

fn reject<B>(req: ServiceRequest, message: &str) -> ServiceResponse<EitherBody<B>> {
    let response = ApiError::Unauthorized(message.to_string()).error_response();
    req.into_response(response).map_into_right_body()
}

fn access_config(req: &ServiceRequest) -> Result<AccessConfig, Error> {
    req.app_data::<web::Data<AccessConfig>>()
        .map(|c| c.get_ref().clone())
        .ok_or_else(|| ApiError::Internal("access configuration is not registered".to_string()).into())
}

pub async fn require_access_token<B: MessageBody>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    let config = access_config(&req)?;

    match admit(&req, &config.token) {
        None => {
            log::warn!("Rejected {} {} without a valid access token", req.method(), req.path());
            Ok(reject(req, "a valid access token is required"))
        }
        Some(Admission::Query) => {
            let mut res = next.call(req).await?;
            let cookie = Cookie::build(ACCESS_COOKIE, config.token)
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .max_age(Duration::days(config.cookie_days))
                .finish();
            res.response_mut().add_cookie(&cookie)?;
            Ok(res.map_into_left_body())
        }
        Some(_) => Ok(next.call(req).await?.map_into_left_body()),
    }
}

pub async fn require_admin_token<B: MessageBody>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    let config = access_config(&req)?;
    let Some(admin_token) = config.admin_token else {
        return Ok(reject(req, "admin access is disabled"));
    };

    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if !bearer.is_some_and(|t| tokens_match(t, &admin_token)) {
        log::warn!("Rejected admin request {} {}", req.method(), req.path());
        return Ok(reject(req, "admin token required"));
    }

    Ok(next.call(req).await?.map_into_left_body())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, middleware::from_fn, test, App, HttpResponse};

    fn config(admin: Option<&str>) -> AccessConfig {
        AccessConfig { token: "ANNA_TOMEK".to_string(), admin_token: admin.map(str::to_string), cookie_days: 7 }
    }

    async fn ok() -> HttpResponse {
        HttpResponse::Ok().body("ok")
    }

    macro_rules! app {
        ($config:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($config))
                    .service(web::scope("/api").wrap(from_fn(require_access_token)).route("/ping", web::get().to(ok)))
                    .service(web::scope("/admin/api").wrap(from_fn(require_admin_token)).route("/ping", web::get().to(ok))),
            )
            .await
        };
    }

    #[::core::prelude::v1::test]
    fn test_tokens_match() {
        assert!(tokens_match("ANNA_TOMEK", "ANNA_TOMEK"));
        assert!(!tokens_match("ANNA_TOMEZ", "ANNA_TOMEK"));
        assert!(!tokens_match("ANNA", "ANNA_TOMEK"));
        assert!(!tokens_match("", "ANNA_TOMEK"));
    }

    #[actix_web::test]
    async fn test_missing_token_is_rejected() {
        let app = app!(config(None));
        let res = test::call_service(&app, test::TestRequest::get().uri("/api/ping").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = test::call_service(&app, test::TestRequest::get().uri("/api/ping?token=WRONG").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_query_token_sets_cookie() {
        let app = app!(config(None));
        let res = test::call_service(&app, test::TestRequest::get().uri("/api/ping?token=ANNA_TOMEK").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);

        let cookie = res.response().cookies().find(|c| c.name() == ACCESS_COOKIE).expect("access cookie");
        assert_eq!(cookie.value(), "ANNA_TOMEK");
        assert_eq!(cookie.max_age(), Some(Duration::days(7)));
    }

    #[actix_web::test]
    async fn test_cookie_and_header_admit() {
        let app = app!(config(None));
        let req = test::TestRequest::get()
            .uri("/api/ping")
            .cookie(Cookie::new(ACCESS_COOKIE, "ANNA_TOMEK"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/api/ping").insert_header((ACCESS_HEADER, "ANNA_TOMEK")).to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.response().cookies().next().is_none());
    }

    #[actix_web::test]
    async fn test_admin_requires_bearer() {
        let app = app!(config(Some("s3cret")));
        let req = test::TestRequest::get().uri("/admin/api/ping").insert_header((ACCESS_HEADER, "ANNA_TOMEK")).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/admin/api/ping")
            .insert_header((header::AUTHORIZATION, "Bearer s3cret"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_admin_disabled_without_token() {
        let app = app!(config(None));
        let req = test::TestRequest::get()
            .uri("/admin/api/ping")
            .insert_header((header::AUTHORIZATION, "Bearer "))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }
}
