pub mod error;
pub mod http;
pub mod mock;
pub mod path;
pub mod rules;
pub mod sanitize;
pub mod transport;

pub use error::{ClientError, ErrorKind};
pub use http::HttpTransport;
pub use rules::RuleClient;
pub use transport::{
    Method, RequestContext, ResponseBody, Transport, TransportError, TransportRequest,
    TransportResponse,
};
