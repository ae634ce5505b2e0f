//! archon-core: task records, the file-backed store, completion tokens,
//! and the service that ties them together.

pub mod error;
pub mod service;
pub mod store;
pub mod task;
pub mod token;

pub use error::{ServiceError, StoreError, TokenError, ValidationError};
pub use service::TaskService;
pub use store::FileTaskStore;
pub use task::{Priority, Task};
pub use token::TokenAuthority;
