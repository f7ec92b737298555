//! Business logic services.

pub mod article;
pub mod category;
pub mod comment;
pub mod rating;
pub mod user;

pub use article::{
    ArticleDetail, ArticleService, CommentedArticle, CreateArticleInput, UpdateArticleInput,
};
pub use category::{CategoryDetail, CategoryNode, CategoryService, CreateCategoryInput};
pub use comment::{CommentNode, CommentService, CreateCommentInput};
pub use rating::RatingService;
pub use user::{CreateUserInput, ProfileView, UpdateProfileInput, UserService};
