pub mod auth_client;
pub mod failure;
pub mod metrics;
pub mod payables_client;

pub use failure::{CollaboratorFailure, ResponseBody};
pub use payables_client::{PayablesApi, PayablesClient};
