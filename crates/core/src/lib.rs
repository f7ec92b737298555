//! Core business logic for quire.
//!
//! The pure building blocks live at the top level:
//!
//! - [`slug`]: unique slug assignment with collision retry
//! - [`tree`]: arena forest ordering categories and comment threads
//! - [`rating`]: like/dislike toggle decisions
//!
//! [`services`] wires them to the repositories of `quire-db`.

pub mod rating;
pub mod services;
pub mod slug;
pub mod tree;

pub use rating::{RatingOutcome, RatingStatus, RatingTransition, RatingValue};
pub use services::*;
pub use crate::slug::{assign_slug, assign_unique_slug, base_slug};
pub use tree::{Forest, TreeError, TreeNode};
