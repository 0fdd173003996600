//! Use case and router tests against the in-memory repository

use std::sync::Arc;

use chrono::{Duration, Utc};
use platform::image::{ImageHost, MemoryImageStore};
use platform::mail::{Mailer, OutgoingMail, Outbox};

use crate::application::{AuthConfig, RegisterInput, RegisterUseCase, TokenIssuer};
use crate::domain::entity::user::User;
use crate::infra::InMemoryAuthRepository;
use crate::presentation::handlers::AuthAppState;

struct Harness {
    state: AuthAppState<InMemoryAuthRepository>,
    repo: InMemoryAuthRepository,
    outbox: Outbox,
}

fn harness() -> Harness {
    let repo = InMemoryAuthRepository::new();
    let outbox = Outbox::new();
    let state = AuthAppState::new(
        repo.clone(),
        AuthConfig::development(),
        Mailer::Outbox(outbox.clone()),
        ImageHost::Memory(MemoryImageStore::default()),
    );
    Harness {
        state,
        repo,
        outbox,
    }
}

const PASSWORD: &str = "Quiet-Lantern-71";

async fn register(h: &Harness, user_name: &str, email: &str) -> User {
    RegisterUseCase::new(h.state.repo.clone(), h.state.config.clone())
        .execute(RegisterInput {
            user_name: user_name.to_string(),
            email: email.to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap()
        .user
}

fn issuer(h: &Harness) -> Arc<TokenIssuer> {
    h.state.issuer.clone()
}

/// The 6-digit code from a verification email
fn code_from(mail: &OutgoingMail) -> String {
    let text = mail.text.as_deref().unwrap();
    let start = text.find("code is ").unwrap() + "code is ".len();
    text[start..start + 6].to_string()
}

/// The token query parameter from a reset email
fn reset_token_from(mail: &OutgoingMail) -> String {
    let text = mail.text.as_deref().unwrap();
    let start = text.find("token=").unwrap() + "token=".len();
    let rest = &text[start..];
    let end = rest.find('&').unwrap();
    rest[..end].to_string()
}

#[cfg(test)]
mod register_tests {
    use super::*;
    use crate::error::AuthError;

    #[tokio::test]
    async fn test_register_creates_unverified_user() {
        let h = harness();
        let user = register(&h, "Alice", "Alice@Example.com").await;

        assert_eq!(user.user_name.original(), "Alice");
        assert_eq!(user.email.as_str(), "alice@example.com");
        assert!(!user.verified);
        assert_ne!(user.password_hash.as_phc_string(), PASSWORD);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates() {
        let h = harness();
        register(&h, "alice", "alice@example.com").await;
        let use_case = RegisterUseCase::new(h.state.repo.clone(), h.state.config.clone());

        let err = use_case
            .execute(RegisterInput {
                user_name: "ALICE".to_string(),
                email: "other@example.com".to_string(),
                password: PASSWORD.to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserNameTaken));

        let err = use_case
            .execute(RegisterInput {
                user_name: "bob".to_string(),
                email: "alice@example.com".to_string(),
                password: PASSWORD.to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let h = harness();
        let use_case = RegisterUseCase::new(h.state.repo.clone(), h.state.config.clone());

        let err = use_case
            .execute(RegisterInput {
                user_name: "bob".to_string(),
                email: "bob@example.com".to_string(),
                password: "short".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);

        let err = use_case
            .execute(RegisterInput {
                user_name: "bob".to_string(),
                email: "not-an-email".to_string(),
                password: PASSWORD.to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }
}

#[cfg(test)]
mod login_tests {
    use super::*;
    use crate::application::{LoginInput, LoginUseCase};
    use crate::domain::entity::refresh_token::RefreshToken;
    use crate::domain::repository::RefreshTokenRepository;
    use crate::error::AuthError;

    fn login_use_case(h: &Harness) -> LoginUseCase<InMemoryAuthRepository, InMemoryAuthRepository> {
        LoginUseCase::new(
            h.state.repo.clone(),
            h.state.repo.clone(),
            issuer(h),
            h.state.config.clone(),
        )
    }

    fn input(identifier: &str, password: &str) -> LoginInput {
        LoginInput {
            identifier: identifier.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_persists_active_refresh_token() {
        let h = harness();
        let user = register(&h, "alice", "alice@example.com").await;

        let output = login_use_case(&h)
            .execute(input("alice@example.com", PASSWORD))
            .await
            .unwrap();

        let stored = h.repo.find_by_user(&user.user_id).await.unwrap().unwrap();
        assert!(!stored.revoked);
        assert!(stored.matches(&output.tokens.refresh.token));
        assert_eq!(stored.expires_at, output.tokens.refresh.expires_at);
    }

    #[tokio::test]
    async fn test_login_by_user_name_is_case_insensitive() {
        let h = harness();
        register(&h, "Alice", "alice@example.com").await;

        assert!(login_use_case(&h).execute(input("aLiCe", PASSWORD)).await.is_ok());
    }

    #[tokio::test]
    async fn test_sequential_logins_leave_one_token() {
        let h = harness();
        let user = register(&h, "alice", "alice@example.com").await;
        let use_case = login_use_case(&h);

        let first = use_case.execute(input("alice", PASSWORD)).await.unwrap();
        let second = use_case.execute(input("alice", PASSWORD)).await.unwrap();

        assert_eq!(h.repo.refresh_token_count().await, 1);
        let stored = h.repo.find_by_user(&user.user_id).await.unwrap().unwrap();
        assert!(!stored.revoked);
        assert!(stored.matches(&second.tokens.refresh.token));
        assert!(
            h.repo
                .find_by_token(&RefreshToken::digest(&first.tokens.refresh.token))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let h = harness();
        register(&h, "alice", "alice@example.com").await;
        let use_case = login_use_case(&h);

        let wrong_password = use_case
            .execute(input("alice@example.com", "Wrong-Password-00"))
            .await
            .unwrap_err();
        let unknown_user = use_case
            .execute(input("nobody@example.com", PASSWORD))
            .await
            .unwrap_err();
        let malformed = use_case.execute(input("@", PASSWORD)).await.unwrap_err();

        for err in [wrong_password, unknown_user, malformed] {
            assert!(matches!(err, AuthError::InvalidCredentials));
            assert_eq!(err.to_string(), "Invalid email or password");
        }
    }
}

#[cfg(test)]
mod refresh_tests {
    use super::*;
    use crate::application::{
        LoginInput, LoginUseCase, LogoutUseCase, RefreshInput, RefreshUseCase,
    };
    use crate::domain::entity::refresh_token::RefreshToken;
    use crate::domain::repository::RefreshTokenRepository;
    use crate::error::AuthError;

    async fn logged_in(h: &Harness) -> (User, String) {
        let user = register(h, "alice", "alice@example.com").await;
        let output = LoginUseCase::new(
            h.state.repo.clone(),
            h.state.repo.clone(),
            issuer(h),
            h.state.config.clone(),
        )
        .execute(LoginInput {
            identifier: "alice".to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap();
        (user, output.tokens.refresh.token)
    }

    fn refresh_use_case(h: &Harness) -> RefreshUseCase<InMemoryAuthRepository, InMemoryAuthRepository> {
        RefreshUseCase::new(
            h.state.repo.clone(),
            h.state.repo.clone(),
            issuer(h),
            h.state.config.clone(),
        )
    }

    #[tokio::test]
    async fn test_refresh_keeps_token_far_from_expiry() {
        let h = harness();
        let (user, token) = logged_in(&h).await;

        let output = refresh_use_case(&h)
            .execute(RefreshInput {
                body_token: None,
                cookie_token: Some(token.clone()),
            })
            .await
            .unwrap();

        assert!(output.rotated.is_none());
        assert_eq!(output.refresh_token, token);
        let claims = issuer(&h).validate_access_token(&output.access.token).unwrap();
        assert_eq!(claims.sub, user.user_id);
    }

    #[tokio::test]
    async fn test_refresh_rotates_near_expiry() {
        let h = harness();
        let user = register(&h, "alice", "alice@example.com").await;

        let issued = issuer(&h)
            .issue_refresh(&user.user_id, Duration::minutes(30))
            .unwrap();
        h.repo
            .save(&RefreshToken::new(user.user_id, &issued.token, issued.expires_at))
            .await
            .unwrap();

        let output = refresh_use_case(&h)
            .execute(RefreshInput {
                body_token: Some(issued.token.clone()),
                cookie_token: Some(issued.token.clone()),
            })
            .await
            .unwrap();

        let rotated = output.rotated.unwrap();
        assert_ne!(rotated.token, issued.token);
        let stored = h.repo.find_by_user(&user.user_id).await.unwrap().unwrap();
        assert!(stored.matches(&rotated.token));
        assert!(!stored.revoked);
    }

    #[tokio::test]
    async fn test_refresh_with_expired_record_deletes_it() {
        let h = harness();
        let user = register(&h, "alice", "alice@example.com").await;

        let issued = issuer(&h)
            .issue_refresh(&user.user_id, Duration::hours(1))
            .unwrap();
        h.repo
            .save(&RefreshToken::new(
                user.user_id,
                &issued.token,
                Utc::now() - Duration::hours(1),
            ))
            .await
            .unwrap();

        let err = refresh_use_case(&h)
            .execute(RefreshInput {
                body_token: None,
                cookie_token: Some(issued.token),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::RefreshTokenExpired));
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
        assert!(h.repo.find_by_user(&user.user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_requires_matching_cookie() {
        let h = harness();
        let (_, token) = logged_in(&h).await;

        let err = refresh_use_case(&h)
            .execute(RefreshInput {
                body_token: Some(token.clone()),
                cookie_token: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenMismatch));

        let err = refresh_use_case(&h)
            .execute(RefreshInput {
                body_token: Some(token),
                cookie_token: Some("something-else".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenMismatch));
    }

    #[tokio::test]
    async fn test_refresh_rejects_unknown_and_missing() {
        let h = harness();
        logged_in(&h).await;

        let err = refresh_use_case(&h)
            .execute(RefreshInput {
                body_token: None,
                cookie_token: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingRefreshToken));

        let err = refresh_use_case(&h)
            .execute(RefreshInput {
                body_token: None,
                cookie_token: Some("unknown".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidRefreshToken));
    }

    #[tokio::test]
    async fn test_logout_then_refresh_fails() {
        let h = harness();
        let (user, token) = logged_in(&h).await;

        LogoutUseCase::new(h.state.repo.clone(), issuer(&h))
            .execute(Some(token.clone()))
            .await
            .unwrap();
        assert!(h.repo.find_by_user(&user.user_id).await.unwrap().is_none());

        let err = refresh_use_case(&h)
            .execute(RefreshInput {
                body_token: None,
                cookie_token: Some(token.clone()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidRefreshToken));

        let err = LogoutUseCase::new(h.state.repo.clone(), issuer(&h))
            .execute(Some(token))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }
}

#[cfg(test)]
mod otp_tests {
    use super::*;
    use crate::application::{RequestOtpUseCase, VerifyOtpInput, VerifyOtpUseCase};
    use crate::domain::entity::otp::Otp;
    use crate::domain::repository::{OtpRepository, UserRepository};
    use crate::domain::value_object::email::Email;
    use crate::error::AuthError;

    const EMAIL: &str = "alice@example.com";

    fn request(h: &Harness) -> RequestOtpUseCase<InMemoryAuthRepository, InMemoryAuthRepository> {
        RequestOtpUseCase::new(
            h.state.repo.clone(),
            h.state.repo.clone(),
            h.state.mailer.clone(),
            h.state.config.clone(),
        )
    }

    fn verify(h: &Harness) -> VerifyOtpUseCase<InMemoryAuthRepository, InMemoryAuthRepository> {
        VerifyOtpUseCase::new(h.state.repo.clone(), h.state.repo.clone(), h.state.config.clone())
    }

    fn verify_input(code: &str) -> VerifyOtpInput {
        VerifyOtpInput {
            email: EMAIL.to_string(),
            code: code.to_string(),
        }
    }

    fn email() -> Email {
        Email::new(EMAIL).unwrap()
    }

    /// Push the stored code past its expiry
    async fn expire(h: &Harness) -> Otp {
        let mut otp = h.repo.find_otp(&email()).await.unwrap().unwrap();
        otp.expires_at = Utc::now() - Duration::seconds(1);
        h.repo.update_otp(&otp).await.unwrap();
        otp
    }

    #[tokio::test]
    async fn test_otp_round_trip_marks_user_verified() {
        let h = harness();
        register(&h, "alice", EMAIL).await;

        request(&h).execute(EMAIL.to_string()).await.unwrap();
        let mail = h.outbox.last_to(EMAIL).unwrap();
        let code = code_from(&mail);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        let stored = h.repo.find_otp(&email()).await.unwrap().unwrap();
        assert_ne!(stored.code_hash, code);
        assert_eq!(stored.attempts, 1);

        let user = verify(&h).execute(verify_input(&code)).await.unwrap();
        assert!(user.verified);
        assert!(h.repo.find_by_email(&email()).await.unwrap().unwrap().verified);

        // Consumed
        let err = verify(&h).execute(verify_input(&code)).await.unwrap_err();
        assert!(matches!(err, AuthError::OtpNotFound));
    }

    #[tokio::test]
    async fn test_wrong_code_is_rejected() {
        let h = harness();
        register(&h, "alice", EMAIL).await;
        request(&h).execute(EMAIL.to_string()).await.unwrap();
        let code = code_from(&h.outbox.last_to(EMAIL).unwrap());

        let wrong = if code == "000000" { "000001" } else { "000000" };
        let err = verify(&h).execute(verify_input(wrong)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidOtp));

        // The right code still works afterwards
        assert!(verify(&h).execute(verify_input(&code)).await.is_ok());
    }

    #[tokio::test]
    async fn test_second_request_while_valid_is_rejected() {
        let h = harness();
        register(&h, "alice", EMAIL).await;

        request(&h).execute(EMAIL.to_string()).await.unwrap();
        let err = request(&h).execute(EMAIL.to_string()).await.unwrap_err();

        assert!(matches!(err, AuthError::OtpStillValid));
        assert_eq!(err.status_code(), axum::http::StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(h.outbox.len(), 1);
    }

    #[tokio::test]
    async fn test_reissue_after_expiry_counts_attempts() {
        let h = harness();
        register(&h, "alice", EMAIL).await;

        request(&h).execute(EMAIL.to_string()).await.unwrap();
        let first_code = code_from(&h.outbox.last_to(EMAIL).unwrap());
        expire(&h).await;

        request(&h).execute(EMAIL.to_string()).await.unwrap();
        let stored = h.repo.find_otp(&email()).await.unwrap().unwrap();
        assert_eq!(stored.attempts, 2);
        assert_eq!(h.outbox.len(), 2);

        let second_code = code_from(&h.outbox.last_to(EMAIL).unwrap());
        if first_code != second_code {
            let err = verify(&h).execute(verify_input(&first_code)).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidOtp));
        }
        assert!(verify(&h).execute(verify_input(&second_code)).await.is_ok());
    }

    #[tokio::test]
    async fn test_max_attempts_then_window_reset() {
        let h = harness();
        register(&h, "alice", EMAIL).await;
        request(&h).execute(EMAIL.to_string()).await.unwrap();

        let mut otp = expire(&h).await;
        otp.attempts = 5;
        otp.created_at = Utc::now() - Duration::hours(1);
        h.repo.update_otp(&otp).await.unwrap();

        let err = request(&h).execute(EMAIL.to_string()).await.unwrap_err();
        assert!(matches!(err, AuthError::OtpMaxAttempts));

        otp.created_at = Utc::now() - Duration::hours(25);
        h.repo.update_otp(&otp).await.unwrap();

        request(&h).execute(EMAIL.to_string()).await.unwrap();
        let stored = h.repo.find_otp(&email()).await.unwrap().unwrap();
        assert_eq!(stored.attempts, 1);
    }

    #[tokio::test]
    async fn test_expired_code_is_deleted_on_verify() {
        let h = harness();
        register(&h, "alice", EMAIL).await;
        request(&h).execute(EMAIL.to_string()).await.unwrap();
        let code = code_from(&h.outbox.last_to(EMAIL).unwrap());
        expire(&h).await;

        let err = verify(&h).execute(verify_input(&code)).await.unwrap_err();
        assert!(matches!(err, AuthError::OtpExpired));
        assert!(h.repo.find_otp(&email()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_request_for_unknown_or_verified_user() {
        let h = harness();
        let err = request(&h).execute(EMAIL.to_string()).await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));

        let mut user = register(&h, "alice", EMAIL).await;
        user.mark_verified();
        h.repo.update(&user).await.unwrap();

        let err = request(&h).execute(EMAIL.to_string()).await.unwrap_err();
        assert!(matches!(err, AuthError::AlreadyVerified));
        assert!(h.outbox.is_empty());
    }
}

#[cfg(test)]
mod password_reset_tests {
    use super::*;
    use crate::application::{
        LoginInput, LoginUseCase, RequestPasswordResetUseCase, ResetPasswordInput,
        ResetPasswordUseCase,
    };
    use crate::domain::repository::{PasswordResetRepository, RefreshTokenRepository};
    use crate::domain::value_object::email::Email;
    use crate::error::AuthError;

    const EMAIL: &str = "alice@example.com";
    const NEW_PASSWORD: &str = "Brighter-Harbor-58";

    fn request(
        h: &Harness,
    ) -> RequestPasswordResetUseCase<InMemoryAuthRepository, InMemoryAuthRepository> {
        RequestPasswordResetUseCase::new(
            h.state.repo.clone(),
            h.state.repo.clone(),
            h.state.mailer.clone(),
            h.state.config.clone(),
        )
    }

    fn reset(
        h: &Harness,
    ) -> ResetPasswordUseCase<InMemoryAuthRepository, InMemoryAuthRepository, InMemoryAuthRepository>
    {
        ResetPasswordUseCase::new(
            h.state.repo.clone(),
            h.state.repo.clone(),
            h.state.repo.clone(),
            h.state.config.clone(),
        )
    }

    fn reset_input(token: &str) -> ResetPasswordInput {
        ResetPasswordInput {
            email: EMAIL.to_string(),
            token: token.to_string(),
            new_password: NEW_PASSWORD.to_string(),
        }
    }

    #[tokio::test]
    async fn test_reset_link_is_single_use() {
        let h = harness();
        let user = register(&h, "alice", EMAIL).await;

        request(&h).execute(EMAIL.to_string()).await.unwrap();
        let mail = h.outbox.last_to(EMAIL).unwrap();
        assert!(mail.text.as_deref().unwrap().contains("/reset-password?token="));
        let token = reset_token_from(&mail);

        reset(&h).execute(reset_input(&token)).await.unwrap();

        let err = reset(&h).execute(reset_input(&token)).await.unwrap_err();
        assert!(matches!(err, AuthError::ResetTokenInvalidOrExpired));
        assert_eq!(err.to_string(), "Invalid or expired reset token");

        // New password works, old one does not
        let login = LoginUseCase::new(
            h.state.repo.clone(),
            h.state.repo.clone(),
            issuer(&h),
            h.state.config.clone(),
        );
        assert!(
            login
                .execute(LoginInput {
                    identifier: EMAIL.to_string(),
                    password: NEW_PASSWORD.to_string(),
                })
                .await
                .is_ok()
        );
        let err = login
            .execute(LoginInput {
                identifier: EMAIL.to_string(),
                password: PASSWORD.to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(h.repo.find_by_user(&user.user_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reset_ends_existing_sessions() {
        let h = harness();
        let user = register(&h, "alice", EMAIL).await;
        LoginUseCase::new(
            h.state.repo.clone(),
            h.state.repo.clone(),
            issuer(&h),
            h.state.config.clone(),
        )
        .execute(LoginInput {
            identifier: EMAIL.to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap();

        request(&h).execute(EMAIL.to_string()).await.unwrap();
        let token = reset_token_from(&h.outbox.last_to(EMAIL).unwrap());
        reset(&h).execute(reset_input(&token)).await.unwrap();

        assert!(h.repo.find_by_user(&user.user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_wrong_token_is_rejected() {
        let h = harness();
        register(&h, "alice", EMAIL).await;
        request(&h).execute(EMAIL.to_string()).await.unwrap();

        let err = reset(&h)
            .execute(reset_input("00000000-0000-4000-8000-000000000000"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ResetTokenMismatch));
        assert_eq!(err.to_string(), "Invalid reset token");
    }

    #[tokio::test]
    async fn test_one_active_token_per_email() {
        let h = harness();
        register(&h, "alice", EMAIL).await;

        request(&h).execute(EMAIL.to_string()).await.unwrap();
        let err = request(&h).execute(EMAIL.to_string()).await.unwrap_err();
        assert!(matches!(err, AuthError::ResetTokenActive));
        assert_eq!(h.outbox.len(), 1);
    }

    #[tokio::test]
    async fn test_daily_cap() {
        let h = harness();
        register(&h, "alice", EMAIL).await;
        let email = Email::new(EMAIL).unwrap();

        for _ in 0..5 {
            request(&h).execute(EMAIL.to_string()).await.unwrap();
            let mut record = h.repo.find_reset(&email).await.unwrap().unwrap();
            record.expires_at = Utc::now() - Duration::seconds(1);
            h.repo.update_reset(&record).await.unwrap();
        }

        let err = request(&h).execute(EMAIL.to_string()).await.unwrap_err();
        assert!(matches!(err, AuthError::ResetLimitReached));

        let mut record = h.repo.find_reset(&email).await.unwrap().unwrap();
        assert_eq!(record.request_count, 5);
        record.created_at = Utc::now() - Duration::hours(24);
        h.repo.update_reset(&record).await.unwrap();

        request(&h).execute(EMAIL.to_string()).await.unwrap();
        let record = h.repo.find_reset(&email).await.unwrap().unwrap();
        assert_eq!(record.request_count, 1);
    }

    #[tokio::test]
    async fn test_new_password_policy_checked_first() {
        let h = harness();
        register(&h, "alice", EMAIL).await;

        let err = reset(&h)
            .execute(ResetPasswordInput {
                email: EMAIL.to_string(),
                token: "anything".to_string(),
                new_password: "short".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert!(!matches!(err, AuthError::ResetTokenInvalidOrExpired));
    }
}

#[cfg(test)]
mod role_tests {
    use super::*;
    use crate::application::{ChangeRoleInput, ChangeRoleUseCase};
    use crate::domain::repository::UserRepository;
    use crate::domain::value_object::user_role::{RoleChangeError, UserRole};
    use crate::error::AuthError;

    async fn user_with_role(h: &Harness, name: &str, role: UserRole) -> User {
        let mut user = register(h, name, &format!("{name}@example.com")).await;
        user.set_role(role);
        h.repo.update(&user).await.unwrap();
        user
    }

    async fn change(h: &Harness, initiator: &User, target: &User, role: UserRole) -> Result<User, AuthError> {
        ChangeRoleUseCase::new(h.state.repo.clone())
            .execute(ChangeRoleInput {
                initiator_id: initiator.user_id,
                initiator_role: initiator.user_role,
                target_id: target.user_id,
                new_role: role,
            })
            .await
    }

    #[tokio::test]
    async fn test_admin_cannot_assign_superadmin() {
        let h = harness();
        let admin = user_with_role(&h, "carol", UserRole::Admin).await;
        let target = user_with_role(&h, "dave", UserRole::User).await;

        let err = change(&h, &admin, &target, UserRole::SuperAdmin).await.unwrap_err();
        assert!(matches!(err, AuthError::RoleChange(RoleChangeError::AssignSuperAdmin)));
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_superadmin_may_set_any_role() {
        let h = harness();
        let root = user_with_role(&h, "erin", UserRole::SuperAdmin).await;
        let target = user_with_role(&h, "frank", UserRole::User).await;

        let updated = change(&h, &root, &target, UserRole::Admin).await.unwrap();
        assert_eq!(updated.user_role, UserRole::Admin);

        let updated = change(&h, &root, &updated, UserRole::SuperAdmin).await.unwrap();
        assert_eq!(updated.user_role, UserRole::SuperAdmin);

        let err = change(&h, &root, &updated, UserRole::SuperAdmin).await.unwrap_err();
        assert_eq!(err.to_string(), "No change in role");
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_cannot_touch_peers() {
        let h = harness();
        let admin = user_with_role(&h, "grace", UserRole::Admin).await;
        let peer = user_with_role(&h, "heidi", UserRole::Admin).await;

        let err = change(&h, &admin, &peer, UserRole::User).await.unwrap_err();
        assert!(matches!(err, AuthError::RoleChange(RoleChangeError::ModifyPeerAdmin)));
    }

    #[tokio::test]
    async fn test_plain_user_is_refused_before_lookup() {
        let h = harness();
        let user = user_with_role(&h, "ivan", UserRole::User).await;
        let ghost = User {
            user_id: kernel::id::UserId::new(),
            ..user.clone()
        };

        let err = change(&h, &user, &ghost, UserRole::Admin).await.unwrap_err();
        assert!(matches!(err, AuthError::RoleChange(RoleChangeError::NotAnAdmin)));
    }
}

#[cfg(test)]
mod router_tests {
    use super::*;
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::domain::repository::RefreshTokenRepository;
    use crate::domain::value_object::user_role::UserRole;
    use crate::presentation::router::{auth_router, users_router};

    fn app(h: &Harness) -> Router {
        Router::new()
            .nest("/api/auth", auth_router(h.state.clone()))
            .nest("/api/users", users_router(h.state.clone()))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn set_cookies(response: &axum::response::Response) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    async fn login(h: &Harness) -> axum::response::Response {
        app(h)
            .oneshot(post_json(
                "/api/auth/login",
                json!({ "email": "alice@example.com", "password": PASSWORD }),
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_endpoint() {
        let h = harness();
        let response = app(&h)
            .oneshot(post_json(
                "/api/auth/register",
                json!({ "username": "alice", "email": "alice@example.com", "password": PASSWORD }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["username"], "alice");
        assert_eq!(body["role"], "user");
        assert_eq!(body["verified"], false);
        assert!(body.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_login_sets_two_cookies_and_returns_tokens() {
        let h = harness();
        let user = register(&h, "alice", "alice@example.com").await;

        let response = login(&h).await;
        assert_eq!(response.status(), StatusCode::OK);

        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().any(|c| c.starts_with("access_token=") && c.contains("HttpOnly")));
        assert!(cookies.iter().any(|c| c.starts_with("refresh_token=") && c.contains("HttpOnly")));

        let body = json_body(response).await;
        let refresh = body["refreshToken"].as_str().unwrap();
        assert!(body["accessToken"].as_str().is_some());
        assert_eq!(body["user"]["id"], user.user_id.to_string());

        let stored = h.repo.find_by_user(&user.user_id).await.unwrap().unwrap();
        assert!(!stored.revoked);
        assert!(stored.matches(refresh));
    }

    #[tokio::test]
    async fn test_bad_login_is_401_problem_details() {
        let h = harness();
        register(&h, "alice", "alice@example.com").await;

        let response = app(&h)
            .oneshot(post_json(
                "/api/auth/login",
                json!({ "email": "alice@example.com", "password": "Wrong-Password-00" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["status"], 401);
        assert_eq!(body["detail"], "Invalid email or password");
    }

    #[tokio::test]
    async fn test_refresh_with_cookie_and_empty_body() {
        let h = harness();
        register(&h, "alice", "alice@example.com").await;
        let body = json_body(login(&h).await).await;
        let refresh = body["refreshToken"].as_str().unwrap().to_string();

        let response = app(&h)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/refresh")
                    .header(header::COOKIE, format!("refresh_token={refresh}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].starts_with("access_token="));

        let body = json_body(response).await;
        assert_eq!(body["rotated"], false);
        assert_eq!(body["refreshToken"], refresh);
    }

    #[tokio::test]
    async fn test_logout_clears_cookies_even_when_unauthorized() {
        let h = harness();

        let response = app(&h)
            .oneshot(post_json("/api/auth/logout", json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    }

    #[tokio::test]
    async fn test_refresh_with_expired_session_clears_cookies() {
        let h = harness();
        let user = register(&h, "alice", "alice@example.com").await;
        let body = json_body(login(&h).await).await;
        let refresh = body["refreshToken"].as_str().unwrap();

        let mut stored = h.repo.find_by_user(&user.user_id).await.unwrap().unwrap();
        stored.expires_at = Utc::now() - Duration::hours(1);
        h.repo.replace(&stored).await.unwrap();

        let response = app(&h)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/refresh")
                    .header(header::COOKIE, format!("refresh_token={refresh}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().any(|c| c.starts_with("access_token=")));
        assert!(cookies.iter().any(|c| c.starts_with("refresh_token=")));
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
        assert!(h.repo.find_by_user(&user.user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_with_unknown_token_clears_cookies() {
        let h = harness();

        let response = app(&h)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/refresh")
                    .header(header::COOKIE, "refresh_token=not-a-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(set_cookies(&response).len(), 2);
    }

    #[tokio::test]
    async fn test_logout_revokes_session() {
        let h = harness();
        let user = register(&h, "alice", "alice@example.com").await;
        let body = json_body(login(&h).await).await;
        let refresh = body["refreshToken"].as_str().unwrap();

        let response = app(&h)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/logout")
                    .header(header::COOKIE, format!("refresh_token={refresh}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(set_cookies(&response).len(), 2);
        assert!(h.repo.find_by_user(&user.user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_me_requires_access_token() {
        let h = harness();
        register(&h, "alice", "alice@example.com").await;

        let response = app(&h)
            .oneshot(Request::builder().uri("/api/users/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = json_body(login(&h).await).await;
        let access = body["accessToken"].as_str().unwrap();

        let response = app(&h)
            .oneshot(
                Request::builder()
                    .uri("/api/users/me")
                    .header(header::AUTHORIZATION, format!("Bearer {access}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["email"], "alice@example.com");
    }

    #[tokio::test]
    async fn test_profile_update_and_avatar_upload() {
        let h = harness();
        register(&h, "alice", "alice@example.com").await;
        let body = json_body(login(&h).await).await;
        let cookie = format!("access_token={}", body["accessToken"].as_str().unwrap());

        let response = app(&h)
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/users/me")
                    .header(header::COOKIE, &cookie)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({ "name": "Alice", "bio": "Writes" }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["name"], "Alice");
        assert_eq!(body["bio"], "Writes");

        let response = app(&h)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/users/me/avatar")
                    .header(header::COOKIE, &cookie)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "image": "data:image/png;base64,aGVsbG8=", "fileName": "me.png" })
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let avatar = json_body(response).await["avatarUrl"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(avatar.starts_with("memory://images/"));
        assert!(avatar.ends_with("me.png"));
    }

    #[tokio::test]
    async fn test_role_route_requires_admin() {
        let h = harness();
        let target = register(&h, "bob", "bob@example.com").await;
        register(&h, "alice", "alice@example.com").await;
        let body = json_body(login(&h).await).await;
        let access = body["accessToken"].as_str().unwrap().to_string();

        let request = |token: &str| {
            Request::builder()
                .method("PUT")
                .uri(format!("/api/users/{}/role", target.user_id))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "role": "admin" }).to_string()))
                .unwrap()
        };

        let response = app(&h).oneshot(request(&access)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Promote alice out of band, then mint a token carrying the new role
        use crate::domain::repository::UserRepository;
        let mut alice = h
            .repo
            .find_by_email(&"alice@example.com".parse().unwrap())
            .await
            .unwrap()
            .unwrap();
        alice.set_role(UserRole::SuperAdmin);
        h.repo.update(&alice).await.unwrap();
        let admin_token = issuer(&h).issue_access(&alice).unwrap().token;

        let response = app(&h).oneshot(request(&admin_token)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["role"], "admin");
    }
}
