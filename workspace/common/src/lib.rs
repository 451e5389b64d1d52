//! Common transport-layer types shared between the scenario client, the
//! preview generator and the command line front end.
//! These structs mirror the remote collection's JSON payloads so every
//! consumer can deserialize API responses without duplicating shapes.

pub mod catalog;
pub mod converters;
mod form;
mod preview;
mod scenario;

pub use catalog::MultiplierTier;
pub use form::{FormCommand, FormErrors, FormField, ScenarioForm, TagField};
pub use preview::{PreviewInput, PreviewPoint, PreviewSeries};
pub use scenario::{DateRange, Scenario, ScenarioDraft, ScenarioId, PLACEHOLDER_PREFIX};
