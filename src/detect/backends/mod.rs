pub mod http;
pub mod stub;

pub use http::HttpDetectionService;
pub use stub::StubService;
