//! Repositories wrapping database access per entity.

mod article;
mod category;
mod comment;
mod rating;
mod user;

pub use article::ArticleRepository;
pub use category::CategoryRepository;
pub use comment::CommentRepository;
pub use rating::RatingRepository;
pub use user::UserRepository;
