pub mod types;
pub mod page_order;
pub mod page_request;
pub mod error;

pub use types::*;
pub use page_order::PageOrder;
pub use page_request::{PageDefaults, PageParams};
pub use error::PagingError;
