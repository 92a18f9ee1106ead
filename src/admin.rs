//! Moderation and setup endpoints mounted under `/admin/api`.

use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use diesel::prelude::*;

use crate::access::AccessConfig;
use crate::actions::{self, PgStore};
use crate::error::ApiError;
use crate::gallery::PhotoView;
use crate::import::{self, ImportSummary};
use crate::invite;
use crate::models::{ApiResponse, ImportOptions, Table, TablePlacement};
use crate::repository::DbError;
use crate::seating;
use crate::DbPool;

#[get("/photos/pending")]
pub async fn pending_photos(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let photos = web::block(move || -> Result<Vec<PhotoView>, ApiError> {
        let mut conn = pool.get()?;
        let photos = actions::list_pending_photos(&mut conn)?;
        Ok(photos.into_iter().map(PhotoView::from).collect())
    })
    .await??;

    Ok(HttpResponse::Ok().json(photos))
}

#[post("/photos/{photo_id}/approve")]
pub async fn approve_photo(pool: web::Data<DbPool>, photo_id: web::Path<i32>) -> Result<HttpResponse, ApiError> {
    let photo_id = photo_id.into_inner();

    let photo = web::block(move || -> Result<PhotoView, ApiError> {
        let mut conn = pool.get()?;
        Ok(actions::approve_photo(&mut conn, photo_id)?.into())
    })
    .await??;

    log::info!("Photo {} approved", photo.id);

    Ok(HttpResponse::Ok().json(photo))
}

#[post("/photos/{photo_id}/feature")]
pub async fn feature_photo(pool: web::Data<DbPool>, photo_id: web::Path<i32>) -> Result<HttpResponse, ApiError> {
    let photo_id = photo_id.into_inner();

    let photo = web::block(move || -> Result<PhotoView, ApiError> {
        let mut conn = pool.get()?;
        Ok(actions::toggle_photo_featured(&mut conn, photo_id)?.into())
    })
    .await??;

    log::info!("Photo {} featured: {}", photo.id, photo.featured);

    Ok(HttpResponse::Ok().json(photo))
}

#[delete("/photos/{photo_id}")]
pub async fn delete_photo(pool: web::Data<DbPool>, photo_id: web::Path<i32>) -> Result<HttpResponse, ApiError> {
    let photo_id = photo_id.into_inner();

    let deleted = web::block(move || -> Result<usize, ApiError> {
        let mut conn = pool.get()?;
        Ok(actions::delete_photo(&mut conn, photo_id)?)
    })
    .await??;

    if deleted == 0 {
        return Err(ApiError::NotFound(format!("photo {} not found", photo_id)));
    }

    log::info!("Photo {} deleted", photo_id);

    Ok(HttpResponse::Ok().json(ApiResponse::ok(format!("Photo {} deleted", photo_id))))
}

#[put("/tables/{number}/placement")]
pub async fn update_placement(
    pool: web::Data<DbPool>,
    number: web::Path<i32>,
    form: web::Json<TablePlacement>,
) -> Result<HttpResponse, ApiError> {
    let number = number.into_inner();
    let placement = form.into_inner();

    let table = web::block(move || -> Result<Table, ApiError> {
        let mut conn = pool.get()?;
        let mut store = PgStore::new(&mut conn);
        seating::update_table_placement(&mut store, number, &placement)
    })
    .await??;

    Ok(HttpResponse::Ok().json(table))
}

#[post("/guests/import")]
pub async fn import_guests(
    pool: web::Data<DbPool>,
    options: web::Query<ImportOptions>,
    body: String,
) -> Result<HttpResponse, ApiError> {
    let options = options.into_inner();
    let parsed = import::parse_guest_csv(&body)?;

    log::info!(
        "Importing {} guest rows (dry_run: {}, update_existing: {})",
        parsed.rows.len(),
        options.dry_run,
        options.update_existing
    );

    let summary = web::block(move || -> Result<ImportSummary, ApiError> {
        let mut conn = pool.get()?;
        let summary = conn.transaction::<_, DbError, _>(|conn| {
            let mut store = PgStore::new(conn);
            import::apply_import(&mut store, parsed, &options)
        })?;
        Ok(summary)
    })
    .await??;

    log::info!(
        "Import finished: {} created, {} updated, {} skipped, {} errors",
        summary.created,
        summary.updated,
        summary.skipped,
        summary.errors.len()
    );

    Ok(HttpResponse::Ok().json(summary))
}

fn guest_link(req: &HttpRequest, access: &AccessConfig) -> invite::AccessLink {
    let info = req.connection_info();
    invite::access_link(info.scheme(), info.host(), &access.token)
}

#[get("/access/link")]
pub async fn access_link(req: HttpRequest, access: web::Data<AccessConfig>) -> HttpResponse {
    HttpResponse::Ok().json(guest_link(&req, &access))
}

#[get("/access/qr")]
pub async fn access_qr(req: HttpRequest, access: web::Data<AccessConfig>) -> Result<HttpResponse, ApiError> {
    let link = guest_link(&req, &access);
    let png = web::block(move || invite::render_qr_png(&link.url)).await??;

    Ok(HttpResponse::Ok().content_type("image/png").body(png))
}

#[post("/access/token")]
pub async fn new_access_token() -> HttpResponse {
    log::info!("Generated a new access token suggestion");
    HttpResponse::Ok().json(invite::generate_token())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{body::to_bytes, http::header, test, App};

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(AccessConfig {
                        token: "ANNA_TOMEK".to_string(),
                        admin_token: Some("s3cret".to_string()),
                        cookie_days: 7,
                    }))
                    .service(
                        web::scope("/admin/api")
                            .service(access_link)
                            .service(access_qr)
                            .service(new_access_token),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_access_link_uses_request_host() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/admin/api/access/link")
            .insert_header((header::HOST, "wesele.example"))
            .to_request();
        let value: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(value["url"], "http://wesele.example/?token=ANNA_TOMEK");
        assert_eq!(value["token"], "ANNA_TOMEK");
    }

    #[actix_web::test]
    async fn test_access_qr_is_png() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/admin/api/access/qr")
            .insert_header((header::HOST, "wesele.example"))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert!(res.status().is_success());
        assert_eq!(res.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
        let body = to_bytes(res.into_body()).await.unwrap();
        assert!(body.starts_with(b"\x89PNG"));
    }

    #[actix_web::test]
    async fn test_new_access_token() {
        let app = app!();
        let req = test::TestRequest::post().uri("/admin/api/access/token").to_request();
        let value: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        let token = value["token"].as_str().unwrap();
        assert_eq!(token.len(), invite::TOKEN_LEN);
        assert_eq!(value["env_line"], format!("WEDDING_ACCESS_TOKEN={}", token));
    }
}
