use std::future::Future;

use actix_web::http::header::ContentType;
use actix_web::web::{self, Bytes};
use actix_web::{FromRequest, Handler, HttpRequest, HttpResponse, Resource, Responder};
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::cache::ResponseCache;
use crate::error::ApiError;
use crate::format::{self, round_one_decimal};
use crate::queries::{
    GroupedRoute, AVG_DAYS_KEY, AVG_DAYS_SQL, SUMMARY_STATS_KEY, SUMMARY_STATS_SQL,
    TOTAL_WELLS_KEY, TOTAL_WELLS_SQL,
};

const DASHBOARD_HTML: &str = include_str!("../static/dashboard.html");
const DASHBOARD_JS: &str = include_str!("../static/dashboard.js");

/// Registers every route. GET and HEAD are served; other methods on a known
/// path are 405, unknown paths are 404.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_resource("/", index))
        .service(get_resource("/static/dashboard.js", dashboard_js))
        // HEALTH
        .service(get_resource("/heartbeat", heartbeat))
        // SINGLE VALUES
        .service(get_resource(TOTAL_WELLS_KEY, total_wells))
        .service(get_resource(AVG_DAYS_KEY, avg_days))
        .service(get_resource(SUMMARY_STATS_KEY, summary_stats))
        // GROUPED AVERAGES: /api/{days|cost}_per_{era|well_type|region|year}
        .service(
            readable_resource("/api/{endpoint}", grouped_average)
                .default_service(web::to(grouped_method_not_allowed)),
        )
        .default_service(web::to(not_found));
}

fn readable_resource<F, Args>(path: &str, handler: F) -> Resource
where
    F: Handler<Args>,
    Args: FromRequest + 'static,
    F::Output: Responder + 'static,
{
    web::resource(path)
        .route(web::get().to(handler.clone()))
        .route(web::head().to(handler))
}

fn get_resource<F, Args>(path: &str, handler: F) -> Resource
where
    F: Handler<Args>,
    Args: FromRequest + 'static,
    F::Output: Responder + 'static,
{
    readable_resource(path, handler).default_service(web::to(method_not_allowed))
}

pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    log::warn!("No route for {} {}", req.method(), req.path());
    Err(ApiError::NotFound)
}

pub async fn method_not_allowed(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    log::warn!("Method {} not allowed for {}", req.method(), req.path());
    Err(ApiError::MethodNotAllowed)
}

/// `/api/{endpoint}` only names a route when the dimension suffix is known;
/// anything else is 404 whatever the method.
pub async fn grouped_method_not_allowed(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let endpoint = req.match_info().get("endpoint").unwrap_or_default();
    match GroupedRoute::parse(endpoint) {
        Err(ApiError::NotFound) => not_found(req).await,
        _ => method_not_allowed(req).await,
    }
}

fn json_response(body: Bytes, cache_status: &'static str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::json())
        .insert_header(("X-Cache", cache_status))
        .body(body)
}

/// Serves `key` from the cache, or awaits `compute`, serializes the payload
/// and caches it. Errors are returned as-is and never cached. The cache is
/// not locked while `compute` runs.
async fn respond_cached<Fut>(
    cache: &ResponseCache,
    key: &str,
    compute: Fut,
) -> Result<HttpResponse, ApiError>
where
    Fut: Future<Output = Result<Value, ApiError>>,
{
    if let Some(body) = cache.get(key) {
        log::debug!("Cache hit for {key}");
        return Ok(json_response(body, "HIT"));
    }

    log::debug!("Cache miss for {key}");
    let payload = compute.await?;
    let body = Bytes::from(serde_json::to_vec(&payload)?);
    cache.put(key, body.clone());
    Ok(json_response(body, "MISS"))
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(DASHBOARD_HTML)
}

pub async fn dashboard_js() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/javascript")
        .body(DASHBOARD_JS)
}

pub async fn heartbeat(data: web::Data<AppState>) -> HttpResponse {
    match data.db.ping().await {
        Ok(()) => HttpResponse::Ok().body("OK - Database connection is healthy"),
        Err(e) => {
            log::error!("Database health check failed: {e}");
            HttpResponse::InternalServerError().body("Database connection failed")
        }
    }
}

pub async fn total_wells(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    respond_cached(&data.cache, TOTAL_WELLS_KEY, async {
        let rows = data.db.fetch_rows(TOTAL_WELLS_SQL).await?;
        Ok::<_, ApiError>(format::single_value(&rows, "total_wells", None))
    })
    .await
}

pub async fn avg_days(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    respond_cached(&data.cache, AVG_DAYS_KEY, async {
        let rows = data.db.fetch_rows(AVG_DAYS_SQL).await?;
        Ok::<_, ApiError>(format::single_value(
            &rows,
            "avg_days",
            Some(round_one_decimal),
        ))
    })
    .await
}

pub async fn summary_stats(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    respond_cached(&data.cache, SUMMARY_STATS_KEY, async {
        let rows = data.db.fetch_rows(SUMMARY_STATS_SQL).await?;
        Ok::<_, ApiError>(json!({
            "total_wells": format::scalar(&rows, 0, None),
            "avg_cost": format::scalar(&rows, 1, None),
            "avg_days": format::scalar(&rows, 2, None),
        }))
    })
    .await
}

pub async fn grouped_average(
    req: HttpRequest,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let route = GroupedRoute::parse(&path).map_err(|e| {
        log::warn!("Rejected {}: {e}", req.path());
        e
    })?;

    respond_cached(&data.cache, &route.cache_key(), async {
        let rows = data.db.fetch_rows(&route.sql()).await?;
        Ok::<_, ApiError>(format::grouped_pairs(
            &rows,
            route.dimension.label_key(),
            route.metric.avg_key(),
        ))
    })
    .await
}
