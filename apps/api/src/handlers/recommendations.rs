use crate::{
    config::Config,
    error::ApiError,
    models::{BookIdentifier, RecommendationRequest, RecommendationResponse},
    services::RecommendationService,
};
use actix_web::{
    web::{self, Json},
    HttpResponse,
};

pub fn recommendations_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/recommendations").route(web::post().to(get_recommendations)));
}

/// Books similar to the one named by `identifier` (title or catalog row).
///
/// An identifier that matches nothing is a 200 with an empty list.
pub async fn get_recommendations(
    request: Json<RecommendationRequest>,
    recommendation_service: web::Data<RecommendationService>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let RecommendationRequest { identifier, top_k } = request.into_inner();
    let top_k = top_k.unwrap_or(config.default_top_k);

    if let BookIdentifier::Title(title) = &identifier {
        if title.trim().is_empty() {
            return Err(ApiError::InvalidInput("Title cannot be empty".to_string()));
        }
    }

    // Re-encoding the catalog is CPU bound; keep it off the async workers
    let service = recommendation_service.into_inner();
    let recommendations =
        web::block(move || service.recommend(&identifier, top_k)).await??;

    Ok(HttpResponse::Ok().json(RecommendationResponse { recommendations }))
}
