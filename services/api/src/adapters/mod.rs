pub mod db;
pub mod pages;
pub mod translate;

pub use db::DbAdapter;
pub use pages::HttpPageFetcher;
pub use translate::LibreTranslateAdapter;
