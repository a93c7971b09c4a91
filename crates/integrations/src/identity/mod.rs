mod verifier;

pub use verifier::{
    HmacIdentityVerifier, IdentityClaims, IdentityVerifier, JwtIdentityVerifier, StaticIdentityVerifier,
};
