pub mod models;
pub mod slug;
