#[macro_use]
extern crate diesel;

use actix_web::{get, middleware, post, web, App, HttpResponse, HttpServer};
use diesel::{prelude::*, r2d2};
use dotenvy;
mod access;
mod actions;
mod admin;
mod config;
mod error;
mod gallery;
mod import;
mod invite;
mod models;
mod normalize;
mod program;
mod repository;
mod schema;
mod seating;

use actions::PgStore;
use error::ApiError;

type DbPool = r2d2::Pool<r2d2::ConnectionManager<PgConnection>>;

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(models::ApiResponse::ok("ok"))
}

#[get("/home")]
async fn home(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let page = web::block(move || -> Result<gallery::HomePage, ApiError> {
        let mut conn = pool.get()?;

        let wedding_info = actions::get_wedding_info(&mut conn)?;
        let featured = actions::list_featured_photos(&mut conn, gallery::HOME_FEATURED)?;
        let recent = actions::list_approved_photos(&mut conn, None, 0, gallery::HOME_RECENT)?;

        Ok(gallery::HomePage {
            wedding_info,
            featured_photos: featured.into_iter().map(gallery::PhotoView::from).collect(),
            recent_photos: recent.into_iter().map(gallery::PhotoView::from).collect(),
        })
    })
    .await??;

    Ok(HttpResponse::Ok().json(page))
}

#[get("/photos")]
async fn list_photos(
    pool: web::Data<DbPool>,
    query: web::Query<models::PhotoListQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let category = query.category.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
    if let Some(c) = category.as_deref() {
        if !gallery::is_known_category(c) {
            return Err(ApiError::MalformedInput(format!("unknown photo category '{}'", c)));
        }
    }

    let page = web::block(move || -> Result<gallery::PhotoPage, ApiError> {
        let mut conn = pool.get()?;

        let total = actions::count_approved_photos(&mut conn, category.as_deref())?;
        let window = gallery::page_window(query.page.as_deref(), total, gallery::PHOTOS_PER_PAGE);
        let photos = actions::list_approved_photos(&mut conn, category.as_deref(), window.offset, window.limit)?;

        Ok(gallery::PhotoPage::new(photos, window, total))
    })
    .await??;

    Ok(HttpResponse::Ok().json(page))
}

#[post("/photos")]
async fn submit_photos(
    pool: web::Data<DbPool>,
    form: web::Json<models::PhotoSubmission>,
) -> Result<HttpResponse, ApiError> {
    let rows = gallery::prepare_submission(&form)?;

    let inserted = web::block(move || -> Result<Vec<models::Photo>, ApiError> {
        let mut conn = pool.get()?;
        Ok(actions::insert_photos(&mut conn, &rows)?)
    })
    .await??;

    log::info!("{} photos submitted for moderation", inserted.len());

    let message = match inserted.len() {
        1 => "Photo uploaded, waiting for approval".to_string(),
        n => format!("{} photos uploaded, waiting for approval", n),
    };
    Ok(HttpResponse::Created().json(models::ApiResponse::ok(message)))
}

#[get("/schedule")]
async fn schedule(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let events = web::block(move || -> Result<Vec<models::ScheduleEvent>, ApiError> {
        let mut conn = pool.get()?;
        Ok(actions::list_schedule(&mut conn)?)
    })
    .await??;

    Ok(HttpResponse::Ok().json(events))
}

#[get("/menu")]
async fn menu(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let items = web::block(move || -> Result<Vec<models::MenuItem>, ApiError> {
        let mut conn = pool.get()?;
        Ok(actions::list_menu_items(&mut conn)?)
    })
    .await??;

    Ok(HttpResponse::Ok().json(program::group_menu(items)))
}

#[get("/tables/search")]
async fn search_table(
    pool: web::Data<DbPool>,
    query: web::Query<models::SearchQuery>,
) -> Result<HttpResponse, ApiError> {
    let q = query.into_inner().q.unwrap_or_default();

    let result = web::block(move || -> Result<seating::SearchResult, ApiError> {
        let mut conn = pool.get()?;
        let mut store = PgStore::new(&mut conn);
        Ok(seating::search_guest(&mut store, &q)?)
    })
    .await??;

    Ok(HttpResponse::Ok().json(result))
}

#[get("/tables/map")]
async fn seating_map(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let layout = web::block(move || -> Result<Vec<seating::MapTable>, ApiError> {
        let mut conn = pool.get()?;
        let mut store = PgStore::new(&mut conn);
        Ok(seating::export_map(&mut store)?)
    })
    .await??;

    Ok(HttpResponse::Ok().json(layout))
}

#[post("/tables/chair")]
async fn update_chair(
    pool: web::Data<DbPool>,
    form: web::Json<models::ChairUpdateRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = form.into_inner();

    let guest = web::block(move || -> Result<models::Guest, ApiError> {
        let mut conn = pool.get()?;
        let mut store = PgStore::new(&mut conn);
        seating::update_chair_position(&mut store, &request)
    })
    .await??;

    log::info!("Guest {} moved to chair {:?}", guest.id, guest.chair_position);

    Ok(HttpResponse::Ok().json(models::ApiResponse::ok(format!(
        "Chair position for {} updated",
        guest.full_name()
    ))))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = config::Config::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // initialize DB pool outside of `HttpServer::new` so that it is shared across all workers
    let pool = initialize_db_pool(&config).map_err(|e| {
        log::error!("Failed to create database pool: {}", e);
        std::io::Error::other(e)
    })?;

    let access = web::Data::new(access::AccessConfig {
        token: config.access_token.clone(),
        admin_token: config.admin_token.clone(),
        cookie_days: config.access_cookie_days,
    });

    log::info!("starting HTTP server at http://{}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        App::new()
            // add DB pool handle to app data; enables use of `web::Data<DbPool>` extractor
            .app_data(web::Data::new(pool.clone()))
            .app_data(access.clone())
            .app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
            .wrap(middleware::Logger::default())
            .service(health)
            .service(
                web::scope("/api")
                    .wrap(middleware::from_fn(access::require_access_token))
                    .service(home)
                    .service(list_photos)
                    .service(submit_photos)
                    .service(schedule)
                    .service(menu)
                    .service(search_table)
                    .service(seating_map)
                    .service(update_chair),
            )
            .service(
                web::scope("/admin/api")
                    .wrap(middleware::from_fn(access::require_admin_token))
                    .service(admin::pending_photos)
                    .service(admin::approve_photo)
                    .service(admin::feature_photo)
                    .service(admin::delete_photo)
                    .service(admin::update_placement)
                    .service(admin::import_guests)
                    .service(admin::access_link)
                    .service(admin::access_qr)
                    .service(admin::new_access_token),
            )
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await
}

fn initialize_db_pool(config: &config::Config) -> Result<DbPool, r2d2::PoolError> {
    let manager = r2d2::ConnectionManager::<PgConnection>::new(&config.database_url);
    r2d2::Pool::builder()
        .max_size(config.db_pool_size)
        .build(manager)
}
