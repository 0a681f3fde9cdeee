pub mod bootstrap;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use middleware::{CORRELATION_ID_HEADER, RequestContext, correlation_id_middleware};
pub use state::AppState;
