/// Authentication module
///
/// Token signing/verification, password hashing, refresh token digests,
/// and the clock every expiry decision is made against.

mod claims;
mod clock;
mod jwt;
mod password;
mod refresh_token;

pub use claims::{TokenClaims, TokenKind};
pub use clock::{Clock, FixedClock, SystemClock};
pub use jwt::TokenCodec;
pub use password::{hash_password, verify_password};
pub use refresh_token::{hash_refresh_token, RefreshTokenHash};
