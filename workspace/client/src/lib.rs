//! Client side of the retail demo: the remote scenario collection, the local
//! scenario store built on top of it, and the form workflow that feeds it.

pub mod api;
pub mod error;
pub mod http;
pub mod session;
pub mod store;

mod locks;
#[cfg(test)]
mod testing;

pub use api::ScenarioApi;
pub use error::{ClientError, Result};
pub use http::HttpScenarioApi;
pub use session::{FormMode, FormSession, SubmitError};
pub use store::{ScenarioStore, StoreState};
