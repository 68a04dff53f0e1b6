mod crawl_tests;
mod decode_tests;
mod utils;
