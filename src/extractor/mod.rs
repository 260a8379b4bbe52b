pub mod page;
pub mod sitemap;

pub use page::PageDocument;
