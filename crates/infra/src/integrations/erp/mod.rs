//! ERP REST integration
//!
//! Layers, bottom up: [`ErpTransport`] issues raw requests, [`ErpAuthenticator`]
//! trades credentials for a bearer token kept in a [`FileTokenStore`],
//! [`ResilientClient`] runs one call with fault inspection and a single
//! reauthentication, and [`CustomerLocator`] / [`ResponseReconciler`] build
//! the customer lookup and local write-back on top.

pub mod auth;
pub mod client;
pub mod errors;
pub mod locator;
pub mod reconciler;
pub mod request;
pub mod token_store;
pub mod transport;

pub use auth::ErpAuthenticator;
pub use client::{CallOutcome, ResilientClient};
pub use errors::{ErpError, ErpErrorCategory};
pub use locator::{CustomerLocator, LocatorResult};
pub use reconciler::{ReconcileAction, ResponseReconciler};
pub use request::{ErpRequest, CUSTOMERS_PATH, LOGIN_PATH};
pub use token_store::FileTokenStore;
pub use transport::{ErpResponse, ErpTransport};
