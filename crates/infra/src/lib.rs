//! Infrastructure layer: identity storage adapters.

pub mod identity_store;

pub use identity_store::{
    CredentialRecord, IdentityStore, IdentityStoreError, InMemoryIdentityStore, NewUser,
    PostgresIdentityStore,
};
