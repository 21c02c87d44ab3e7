//! Resource providers: the repository layer behind SCIM operations.
//!
//! * [`ResourceProvider`] - trait for CRUD, search and patch over stored resources
//! * [`StandardResourceProvider`] - implementation over any
//!   [`StorageProvider`](crate::storage::StorageProvider)
//! * [`AttributeFilterExtension`] - ordered callbacks rewriting outgoing resources

pub mod extensions;
pub mod provider;
pub mod standard;

pub use extensions::{AttributeFilterExtension, RequestContext};
pub use provider::{ResourceProvider, SearchPage, SearchRequest, SortOrder};
pub use standard::StandardResourceProvider;
