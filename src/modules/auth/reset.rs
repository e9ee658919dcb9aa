use rand::Rng;

use super::store::{CredentialStore, StoreError, ValidationError};
use crate::modules::storage::KeyValueStore;
use crate::{MIN_PASSWORD_LEN, SENTINEL_PASSWORD};

/// Where the caller currently is in the first-access/reset flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetStep {
    AwaitingEmail,
    AwaitingCode,
    AwaitingNewPassword,
    Done,
}

/// Generate a one-time 4-digit code in [1000, 9999]
pub fn generate_temp_code() -> String {
    rand::thread_rng().gen_range(1000..=9999).to_string()
}

/// Drives the three-step first-access/password-reset flow on top of a
/// credential store. Only the registry writes are durable; the step lives
/// here, with the caller, and a fresh flow always starts at the email
/// prompt regardless of what the registry holds.
pub struct ResetFlow<'a, S: KeyValueStore> {
    store: &'a CredentialStore<S>,
    step: ResetStep,
    email: Option<String>,
}

impl<'a, S: KeyValueStore> ResetFlow<'a, S> {
    pub fn new(store: &'a CredentialStore<S>) -> Self {
        Self {
            store,
            step: ResetStep::AwaitingEmail,
            email: None,
        }
    }

    pub fn step(&self) -> ResetStep {
        self.step
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Step 1 to 2: draw a code and persist it on the user's record,
    /// creating the record if the email is new. The code is returned for
    /// out-of-band delivery once the registry write has succeeded; whether
    /// delivery itself works never decides the transition.
    pub fn request_code(&mut self, email: &str) -> Result<String, StoreError> {
        if email.trim().is_empty() {
            return Err(ValidationError::MissingEmail.into());
        }

        let code = generate_temp_code();

        // A brand-new record cannot exist without a password, so it gets
        // the sentinel until the final step replaces it. An existing
        // record keeps its current digest untouched.
        let password = if self.store.get_user_by_email(email).is_none() {
            Some(SENTINEL_PASSWORD)
        } else {
            None
        };

        self.store.upsert_user(email, password, Some(&code))?;

        self.email = Some(email.to_string());
        self.step = ResetStep::AwaitingCode;
        Ok(code)
    }

    /// Step 2 to 3: exact string match against the stored code, no
    /// normalization and no expiry. A mismatch leaves the flow at the code
    /// prompt.
    pub fn validate_code(&mut self, submitted: &str) -> Result<(), StoreError> {
        if submitted.trim().is_empty() {
            return Err(ValidationError::MissingCode.into());
        }

        let email = match &self.email {
            Some(email) => email,
            None => return Err(ValidationError::MissingEmail.into()),
        };

        match self.store.get_user_by_email(email) {
            Some(record) if record.temp_code.as_deref() == Some(submitted) => {
                self.step = ResetStep::AwaitingNewPassword;
                Ok(())
            }
            _ => Err(ValidationError::InvalidCode.into()),
        }
    }

    /// Step 3 to done: all checks happen before any storage call, then one
    /// write stores the new digest and clears the pending code in the same
    /// update.
    pub fn set_password(
        &mut self,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), StoreError> {
        if new_password.is_empty() || confirm_password.is_empty() {
            return Err(ValidationError::MissingFields.into());
        }
        if new_password != confirm_password {
            return Err(ValidationError::PasswordMismatch.into());
        }
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort.into());
        }

        let email = match &self.email {
            Some(email) => email.clone(),
            None => return Err(ValidationError::MissingEmail.into()),
        };

        self.store.upsert_user(&email, Some(new_password), None)?;

        self.step = ResetStep::Done;
        Ok(())
    }

    /// Caller-initiated cancel back to the email prompt. Never touches the
    /// store; a pending code stays pending.
    pub fn back(&mut self) {
        self.step = ResetStep::AwaitingEmail;
    }
}
