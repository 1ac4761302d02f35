use crate::{
    config::Config,
    error::ApiError,
    models::{SearchQuery, SearchResponse},
    services::RecommendationService,
};
use actix_web::{get, web, HttpResponse};
use log::info;

/// Title search: substring matches, falling back to approximate matches.
#[get("/search")]
pub async fn search_books(
    query: web::Query<SearchQuery>,
    recommendation_service: web::Data<RecommendationService>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let SearchQuery { q, limit } = query.into_inner();
    if q.trim().is_empty() {
        return Err(ApiError::InvalidInput("Query cannot be empty".to_string()));
    }

    let limit = limit.unwrap_or(config.max_search_results);
    let service = recommendation_service.into_inner();
    let needle = q.clone();
    let results = web::block(move || service.search(&needle, limit)).await?;
    info!("Search '{}' matched {} books", q, results.len());

    Ok(HttpResponse::Ok().json(SearchResponse { query: q, results }))
}
