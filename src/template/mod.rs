//! Recording screen templates

pub mod schema;

pub use schema::Template;
