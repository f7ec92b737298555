//! Database entities.

pub mod article;
pub mod category;
pub mod comment;
pub mod rating;
pub mod user;

pub use article::Entity as Article;
pub use category::Entity as Category;
pub use comment::Entity as Comment;
pub use rating::Entity as Rating;
pub use user::Entity as User;
