//! Application services: the read side of the blog and its collaborators.

pub mod error;
pub mod feed;
pub mod pagination;
pub mod render;
pub mod repos;
