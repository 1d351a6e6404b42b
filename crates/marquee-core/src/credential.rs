//! API credential and the sources it is obtained from.

use std::fmt;

use crate::error::AppError;
use crate::traits::TokenSource;

/// Environment variable holding the TMDB read-access token.
pub const TOKEN_ENV_VAR: &str = "MOVIE_API_TOKEN";

/// Bearer token sent with every API request.
///
/// `Debug` output is redacted so the token never reaches the logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a token, rejecting blank values.
    pub fn new(token: impl Into<String>) -> Result<Self, AppError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(AppError::MissingCredential("empty token".to_string()));
        }
        Ok(Self(token))
    }

    /// Returns the raw token.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Token fixed at startup (CLI flag or already-validated environment).
#[derive(Debug, Clone)]
pub struct StaticToken(Credential);

impl StaticToken {
    pub fn new(credential: Credential) -> Self {
        Self(credential)
    }
}

impl TokenSource for StaticToken {
    fn credential(&self) -> Result<Credential, AppError> {
        Ok(self.0.clone())
    }
}

/// Reads the token from an environment variable on every cycle, so a
/// rotated token is picked up without restarting the schedule.
#[derive(Debug, Clone)]
pub struct EnvTokenSource {
    var: String,
}

impl EnvTokenSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvTokenSource {
    fn default() -> Self {
        Self::new(TOKEN_ENV_VAR)
    }
}

impl TokenSource for EnvTokenSource {
    fn credential(&self) -> Result<Credential, AppError> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Credential::new(token),
            _ => Err(AppError::MissingCredential(self.var.clone())),
        }
    }
}
