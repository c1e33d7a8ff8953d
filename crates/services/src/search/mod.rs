pub mod format;
pub mod ports;
pub mod serper;
pub mod service;

pub use format::{format_search_results, NO_RESULTS_SENTINEL};
pub use ports::{SearchError, SearchProviderTrait, SearchResult};
pub use serper::SerperSearchProvider;
pub use service::{SearchServiceImpl, SearchServiceTrait};

#[cfg(any(test, feature = "test-mocks"))]
pub use ports::MockSearchProviderTrait;
