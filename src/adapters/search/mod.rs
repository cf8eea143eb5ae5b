//! Search backend adapters.

mod searxng;

pub use searxng::SearxngClient;
