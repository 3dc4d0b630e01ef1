//! Zscaler SDK shared layer
//!
//! The request/response plumbing every generated Zscaler resource client
//! (ZIA, ZPA, ZCON, ZTW, ZEASM) is built on.
//!
//! # Features
//!
//! - **Naming**: snake_case ⇄ camelCase keys with a vendor exception table
//! - **Formatting**: JSON responses normalized to snake-cased records or lists
//! - **Retry**: exponential backoff with jitter on 429/502/503/504
//! - **Pagination**: lazy item iterator with item and page caps
//! - **Tokens**: bearer-token expiry check with a clock-skew margin
//!
//! Everything is synchronous; pauses block the calling thread.
//!
//! # Example
//!
//! ```no_run
//! use zscaler_sdk::{Config, ZscalerClient};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let client = ZscalerClient::new(config)?;
//!
//!     let path = "zpa/mgmtconfig/v1/admin/customers/1/policySet/rules";
//!     for rule in client.paginate(path, Default::default(), None) {
//!         println!("{}", rule?["name"]);
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod formatters;
pub mod naming;
pub mod payload;
pub mod response;

pub use client::ZscalerClient;
pub use config::Config;
pub use error::{AuthError, ClientError, ClientResult};
pub use formatters::Formatted;
pub use response::{ApiResponse, HttpResponse};
