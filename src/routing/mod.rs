pub mod permalink;
pub mod resolver;
pub mod rules;
pub mod structure;
