//! Backend adapters.
//!
//! | Backend | Scheme | Storage |
//! |---------|--------|---------|
//! | [`LocalFs`] | `file://` | Local disk through `std::fs` |
//! | [`MemoryFs`] | `memory://` or custom | Process memory |
//! | [`ObjectStoreFs`] | `gs://`, `s3://` or custom | Any [`ObjectStoreClient`] |

mod local;
mod memory;
mod object_store;

pub use local::LocalFs;
pub use memory::MemoryFs;
pub use object_store::{
    ClientError, ClientFactory, ClientOptions, Credentials, InMemoryObjectStore, Listing,
    ObjectMeta, ObjectStoreClient, ObjectStoreFs,
};
