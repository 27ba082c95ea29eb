mod reqwest_page_fetcher;
mod scraper_image_link_extractor;

pub use reqwest_page_fetcher::ReqwestPageFetcher;
pub use scraper_image_link_extractor::ScraperImageLinkExtractor;
