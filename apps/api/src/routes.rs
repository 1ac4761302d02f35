use actix_web::{web, Scope};

use crate::handlers::{book_detail, health_check, recommendations_config, search_books, top_rated};

/// Configure all routes for the API
pub fn api_routes() -> Scope {
    web::scope("/api")
        .service(health_check)
        .service(search_books)
        .service(book_detail)
        .service(top_rated)
        .configure(recommendations_config)
}
