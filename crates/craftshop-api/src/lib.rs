//! Client for the storefront's remote product and auth API.
//!
//! Product endpoints return raw JSON values; turning them into canonical
//! products is the catalog's job.

pub mod client;
pub mod error;
pub mod message;
pub(crate) mod retry;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
pub use message::extract_error_message;
pub use types::{
    AuthResponse, Credentials, ImageUpload, NewReview, SignupRequest, Tokens, UploadedImage,
    UserProfile,
};
