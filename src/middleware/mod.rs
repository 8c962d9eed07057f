pub mod request_logger;

pub use request_logger::{request_logger_middleware, RequestId, REQUEST_ID_HEADER};
