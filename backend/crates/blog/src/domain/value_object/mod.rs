pub mod post_content;
pub mod tags;
pub mod title;
