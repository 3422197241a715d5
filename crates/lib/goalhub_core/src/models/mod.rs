//! Domain models shared by the session store and its collaborators.

pub mod auth;
