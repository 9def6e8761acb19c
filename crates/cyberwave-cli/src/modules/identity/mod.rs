mod store;

pub(crate) use store::{ephemeral_identity, IdentityStore};
