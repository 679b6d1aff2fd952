//! Authenticator for the remote store
//!
//! Obtains the bearer credential that every remote store call carries.
//! Google Drive uses the OAuth 2.0 authorization code flow for installed
//! applications (system browser + loopback redirect, PKCE `S256`); the HTTP
//! backup server uses an optional static token.
//!
//! # Module Layout
//!
//! - [`flow`]        -- browser sign-in as an explicit state machine
//! - [`manager`]     -- credential cache, refresh and invalidation
//! - [`pkce`]        -- PKCE `S256` challenge generation
//! - [`token_store`] -- token persistence via OS keyring

pub mod flow;
pub mod manager;
pub mod pkce;
pub mod token_store;

pub use manager::{AuthManager, CredentialProvider, StaticCredential};
pub use token_store::OAuthToken;
