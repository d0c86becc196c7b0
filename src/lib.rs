pub mod client;
pub mod config;
pub mod domain;
pub mod loader;
pub mod observability;

pub use client::{ClientError, ErrorKind, HttpTransport, RequestContext, RuleClient, Transport};
pub use config::Config;
pub use domain::{Rule, RuleGroup, RuleNamespace, RuleSet};
