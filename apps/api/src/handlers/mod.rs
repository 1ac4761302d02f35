pub mod books;
pub mod health;
pub mod recommendations;
pub mod search;

pub use books::{book_detail, top_rated};
pub use health::health_check;
pub use recommendations::recommendations_config;
pub use search::search_books;
