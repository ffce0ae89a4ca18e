//! Authentication module
//!
//! JWT signing/validation, password hashing, refresh token storage, and
//! the issue/refresh protocol on top of them.

mod claims;
mod jwt;
mod password;
mod refresh_token;
mod tokens;

pub use claims::Claims;
pub use jwt::decode_expired_token;
pub use jwt::generate_access_token;
pub use jwt::validate_access_token;
pub use password::hash_password;
pub use password::verify_password;
pub use refresh_token::find_refresh_token;
pub use refresh_token::generate_refresh_token;
pub use refresh_token::invalidate_user_tokens;
pub use refresh_token::purge_spent_tokens;
pub use refresh_token::redeem_refresh_token;
pub use refresh_token::save_refresh_token;
pub use refresh_token::StoredRefreshToken;
pub use tokens::issue_token_pair;
pub use tokens::refresh_token_pair;
pub use tokens::TokenPair;
