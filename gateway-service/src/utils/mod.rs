pub mod token;
pub mod validation;

pub use token::{generate_token, hash_token, pkce_challenge};
pub use validation::ValidatedJson;
