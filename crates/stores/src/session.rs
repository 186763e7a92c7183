//! Session state and the stubbed credential check.
//!
//! Real credential validation lives outside this system; the check
//! here is a fixed-value stub that only gates the demo flows and
//! hands out the per-role gateway credentials.

use batido_protocol::types::{Credentials, Role};

/// Demo account accepted by the stub check.
pub const DEMO_EMAIL: &str = "demo@batido.shop";
pub const DEMO_PASSWORD: &str = "12345";

const SHOP_ID: &str = "shop-1";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
}

/// Login state for one running instance.
#[derive(Debug, Default)]
pub struct Session {
    email: Option<String>,
    credentials: Option<Credentials>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the demo account and produces gateway credentials for
    /// the chosen role.
    pub fn login(
        &mut self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Credentials, AuthError> {
        if !email.eq_ignore_ascii_case(DEMO_EMAIL) || password != DEMO_PASSWORD {
            return Err(AuthError::InvalidCredentials);
        }

        let token = match role {
            Role::Customer => "jwt-customer",
            Role::Cashier => "jwt-cashier",
        };
        let credentials = Credentials {
            token: token.into(),
            shop_id: SHOP_ID.into(),
            role,
        };

        self.email = Some(email.to_owned());
        self.credentials = Some(credentials.clone());
        Ok(credentials)
    }

    /// Clears all session state.
    pub fn logout(&mut self) {
        self.email = None;
        self.credentials = None;
    }

    pub fn is_logged_in(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Credentials for the gateway, if logged in.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}
