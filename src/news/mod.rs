mod fetcher;

pub use fetcher::{NewsFetcher, DEFAULT_SECTION};
