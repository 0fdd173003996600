//! Email Verification Use Cases
//!
//! Issue a 6-digit code by email, then confirm it to mark the account
//! verified. Codes are stored only as Argon2id hashes of code + salt.

use std::sync::Arc;

use chrono::{Duration, Utc};
use platform::crypto::random_numeric_code;
use platform::mail::Mailer;
use platform::password::{hash_secret, verify_secret};
use platform::rate_limit::WindowDecision;

use crate::application::config::AuthConfig;
use crate::application::notification;
use crate::domain::entity::{otp::Otp, user::User};
use crate::domain::repository::{OtpRepository, UserRepository};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

pub const OTP_DIGITS: u32 = 6;

pub struct RequestOtpUseCase<U, O>
where
    U: UserRepository,
    O: OtpRepository,
{
    user_repo: Arc<U>,
    otp_repo: Arc<O>,
    mailer: Mailer,
    config: Arc<AuthConfig>,
}

impl<U, O> RequestOtpUseCase<U, O>
where
    U: UserRepository,
    O: OtpRepository,
{
    pub fn new(user_repo: Arc<U>, otp_repo: Arc<O>, mailer: Mailer, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            otp_repo,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, email: String) -> AuthResult<()> {
        let email = Email::new(email)?;
        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if user.verified {
            return Err(AuthError::AlreadyVerified);
        }

        let now = Utc::now();
        let existing = self.otp_repo.find_otp(&email).await?;

        if let Some(otp) = &existing {
            if !otp.is_expired(now) {
                return Err(AuthError::OtpStillValid);
            }
        }

        let code = random_numeric_code(OTP_DIGITS);
        let code_hash = hash_secret(&code, self.config.otp_salt())?;
        let expires_at = now + Duration::milliseconds(self.config.otp_ttl_ms());

        match existing {
            Some(mut otp) => {
                match self.config.otp_limit.check(otp.attempts, otp.created_at, now) {
                    WindowDecision::Deny { retry_after_ms } => {
                        tracing::info!(retry_after_ms, "OTP attempts exhausted");
                        return Err(AuthError::OtpMaxAttempts);
                    }
                    WindowDecision::Reset => otp.reset_window(now),
                    WindowDecision::Allow { .. } => {}
                }
                otp.reissue(code_hash, expires_at);
                self.otp_repo.update_otp(&otp).await?;
            }
            None => {
                let otp = Otp::first(email.clone(), code_hash, expires_at, now);
                self.otp_repo.insert_otp(&otp).await?;
            }
        }

        self.mailer
            .send(notification::otp_mail(
                &user,
                &code,
                self.config.otp_ttl.as_secs() as i64 / 60,
            ))
            .await?;

        tracing::info!(user_id = %user.user_id, "Verification code sent");

        Ok(())
    }
}

pub struct VerifyOtpInput {
    pub email: String,
    pub code: String,
}

pub struct VerifyOtpUseCase<U, O>
where
    U: UserRepository,
    O: OtpRepository,
{
    user_repo: Arc<U>,
    otp_repo: Arc<O>,
    config: Arc<AuthConfig>,
}

impl<U, O> VerifyOtpUseCase<U, O>
where
    U: UserRepository,
    O: OtpRepository,
{
    pub fn new(user_repo: Arc<U>, otp_repo: Arc<O>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            otp_repo,
            config,
        }
    }

    /// Check `code` against the latest code issued for `email`.
    /// An expired record is deleted on the way out.
    pub async fn verify(&self, email: &Email, code: &str) -> AuthResult<Otp> {
        let otp = self
            .otp_repo
            .find_otp(email)
            .await?
            .ok_or(AuthError::OtpNotFound)?;

        if otp.is_expired(Utc::now()) {
            self.otp_repo.delete_by_id(otp.otp_id).await?;
            return Err(AuthError::OtpExpired);
        }

        if !verify_secret(code.trim(), &otp.code_hash, self.config.otp_salt()) {
            return Err(AuthError::InvalidOtp);
        }

        Ok(otp)
    }

    /// Verify the code, mark the account verified and consume the code
    pub async fn execute(&self, input: VerifyOtpInput) -> AuthResult<User> {
        let email = Email::new(input.email)?;
        let otp = self.verify(&email, &input.code).await?;

        let mut user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        user.mark_verified();
        self.user_repo.update(&user).await?;

        self.otp_repo.delete_by_id(otp.otp_id).await?;

        tracing::info!(user_id = %user.user_id, "Email verified");

        Ok(user)
    }
}
