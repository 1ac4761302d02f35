use crate::{
    config::Config,
    error::ApiError,
    models::{BookQuery, TopRatedQuery, TopRatedResponse},
    services::RecommendationService,
};
use actix_web::{get, web, HttpResponse};

/// A book looked up by title (exact or approximate) with its neighbours.
#[get("/book")]
pub async fn book_detail(
    query: web::Query<BookQuery>,
    recommendation_service: web::Data<RecommendationService>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let BookQuery { title, k } = query.into_inner();
    if title.trim().is_empty() {
        return Err(ApiError::InvalidInput("Title cannot be empty".to_string()));
    }

    let k = k.unwrap_or(config.default_top_k);
    let service = recommendation_service.into_inner();
    let detail = web::block(move || service.book_detail(&title, k)).await??;

    Ok(HttpResponse::Ok().json(detail))
}

#[get("/books/top")]
pub async fn top_rated(
    query: web::Query<TopRatedQuery>,
    recommendation_service: web::Data<RecommendationService>,
    config: web::Data<Config>,
) -> HttpResponse {
    let limit = query.limit.unwrap_or(config.top_rated_limit);

    HttpResponse::Ok().json(TopRatedResponse {
        books: recommendation_service.top_rated(limit),
    })
}
