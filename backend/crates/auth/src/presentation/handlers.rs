//! HTTP Handlers

use std::future::Future;
use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{AppendHeaders, IntoResponse, Response};
use kernel::error::app_error::AppError;
use kernel::id::UserId;
use platform::cookie::{delete_cookie_header, extract_cookie, set_cookie_header};
use platform::crypto::from_base64;
use platform::deadline::with_deadline;
use platform::image::ImageHost;
use platform::mail::Mailer;

use crate::application::config::{AuthConfig, REFRESH_COOKIE_NAME};
use crate::application::{
    ChangePasswordInput, ChangeRoleInput, ChangeRoleUseCase, ChangePasswordUseCase, LoginInput,
    LoginUseCase, LogoutUseCase, ProfileUseCase, RefreshInput, RefreshUseCase, RegisterInput,
    RegisterUseCase, RequestOtpUseCase, RequestPasswordResetUseCase, ResetPasswordInput,
    ResetPasswordUseCase, TokenIssuer, UpdateProfileInput, UploadAvatarUseCase, VerifyOtpInput,
    VerifyOtpUseCase,
};
use crate::domain::repository::AuthStore;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    AvatarUploadRequest, ChangePasswordRequest, ChangeRoleRequest, EmailRequest, LoginRequest,
    LoginResponse, MessageResponse, RefreshRequest, RefreshResponse, RegisterRequest,
    ResetPasswordRequest, UpdateProfileRequest, UserResponse, VerifyOtpRequest, VerifyOtpResponse,
};
use crate::presentation::middleware::{AccessGuard, AuthenticatedUser};

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R>
where
    R: AuthStore,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
    pub issuer: Arc<TokenIssuer>,
    pub mailer: Mailer,
    pub images: ImageHost,
}

impl<R> AuthAppState<R>
where
    R: AuthStore,
{
    pub fn new(repo: R, config: AuthConfig, mailer: Mailer, images: ImageHost) -> Self {
        let config = Arc::new(config);
        Self {
            repo: Arc::new(repo),
            issuer: Arc::new(TokenIssuer::new(config.clone())),
            config,
            mailer,
            images,
        }
    }

    /// Guard validating access tokens minted by this state's issuer
    pub fn access_guard(&self) -> AccessGuard {
        AccessGuard::new(self.issuer.clone())
    }
}

/// Run a use case under the configured request deadline
async fn within<T>(
    config: &AuthConfig,
    fut: impl Future<Output = AuthResult<T>>,
) -> AuthResult<T> {
    with_deadline(config.request_timeout, fut).await?
}

// ============================================================================
// Register / Login
// ============================================================================

/// POST /api/auth/register
pub async fn register<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
{
    let use_case = RegisterUseCase::new(state.repo.clone(), state.config.clone());

    let input = RegisterInput {
        user_name: req.username,
        email: req.email,
        password: req.password,
    };

    let output = within(&state.config, use_case.execute(input)).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&output.user))))
}

/// POST /api/auth/login
pub async fn login<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
{
    let use_case = LoginUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.issuer.clone(),
        state.config.clone(),
    );

    let input = LoginInput {
        identifier: req.identifier,
        password: req.password,
    };

    let output = within(&state.config, use_case.execute(input)).await?;
    let tokens = output.tokens;

    let cookies = AppendHeaders([
        (
            header::SET_COOKIE,
            set_cookie_header(&state.config.access_cookie(), &tokens.access.token),
        ),
        (
            header::SET_COOKIE,
            set_cookie_header(&state.config.refresh_cookie(), &tokens.refresh.token),
        ),
    ]);

    Ok((
        StatusCode::OK,
        cookies,
        Json(LoginResponse {
            access_token_expires_at: tokens.access.expires_at,
            refresh_token_expires_at: tokens.refresh.expires_at,
            access_token: tokens.access.token,
            refresh_token: tokens.refresh.token,
            user: UserResponse::from(&output.user),
        }),
    ))
}

// ============================================================================
// Refresh / Logout
// ============================================================================

/// POST /api/auth/refresh
///
/// The body is optional; an empty body falls back to the refresh cookie.
/// A rejected token clears both cookies, as logout does.
pub async fn refresh<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
    body: Bytes,
) -> AuthResult<Response>
where
    R: AuthStore,
{
    let request = parse_optional_body::<RefreshRequest>(&body)?.unwrap_or_default();

    let use_case = RefreshUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.issuer.clone(),
        state.config.clone(),
    );

    let input = RefreshInput {
        body_token: request.refresh_token,
        cookie_token: extract_cookie(&headers, REFRESH_COOKIE_NAME),
    };

    let output = match within(&state.config, use_case.execute(input)).await {
        Ok(output) => output,
        // Rejected session: clear both cookies
        Err(
            err @ (AuthError::RefreshTokenExpired
            | AuthError::InvalidRefreshToken
            | AuthError::RefreshTokenMismatch),
        ) => {
            let mut response = err.into_response();
            append_cleared_cookies(response.headers_mut(), &state.config);
            return Ok(response);
        }
        Err(err) => return Err(err),
    };

    let mut response = Json(RefreshResponse {
        access_token_expires_at: output.access.expires_at,
        access_token: output.access.token.clone(),
        refresh_token: output.refresh_token,
        rotated: output.rotated.is_some(),
    })
    .into_response();

    let headers = response.headers_mut();
    headers.append(
        header::SET_COOKIE,
        set_cookie_header(&state.config.access_cookie(), &output.access.token),
    );
    if let Some(rotated) = &output.rotated {
        headers.append(
            header::SET_COOKIE,
            set_cookie_header(&state.config.refresh_cookie(), &rotated.token),
        );
    }

    Ok(response)
}

/// POST /api/auth/logout
///
/// Both cookies are cleared whether or not the token was valid.
pub async fn logout<R>(State(state): State<AuthAppState<R>>, headers: HeaderMap) -> Response
where
    R: AuthStore,
{
    let use_case = LogoutUseCase::new(state.repo.clone(), state.issuer.clone());
    let token = extract_cookie(&headers, REFRESH_COOKIE_NAME);

    let mut response = match within(&state.config, use_case.execute(token)).await {
        Ok(()) => Json(MessageResponse::new("Logged out successfully")).into_response(),
        Err(err) => err.into_response(),
    };

    append_cleared_cookies(response.headers_mut(), &state.config);
    response
}

fn append_cleared_cookies(headers: &mut HeaderMap, config: &AuthConfig) {
    let cleared: [HeaderValue; 2] = [
        delete_cookie_header(&config.access_cookie()),
        delete_cookie_header(&config.refresh_cookie()),
    ];
    for value in cleared {
        headers.append(header::SET_COOKIE, value);
    }
}

// ============================================================================
// Email verification
// ============================================================================

/// POST /api/auth/otp/request
pub async fn request_otp<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<EmailRequest>,
) -> AuthResult<Json<MessageResponse>>
where
    R: AuthStore,
{
    let use_case = RequestOtpUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    within(&state.config, use_case.execute(req.email)).await?;

    Ok(Json(MessageResponse::new("OTP sent to your email")))
}

/// POST /api/auth/otp/verify
pub async fn verify_otp<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<VerifyOtpRequest>,
) -> AuthResult<Json<VerifyOtpResponse>>
where
    R: AuthStore,
{
    let use_case =
        VerifyOtpUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    let input = VerifyOtpInput {
        email: req.email,
        code: req.code,
    };

    let user = within(&state.config, use_case.execute(input)).await?;

    Ok(Json(VerifyOtpResponse {
        message: "Email verified successfully",
        user: UserResponse::from(&user),
    }))
}

// ============================================================================
// Password reset
// ============================================================================

/// POST /api/auth/forgot-password
pub async fn forgot_password<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<EmailRequest>,
) -> AuthResult<Json<MessageResponse>>
where
    R: AuthStore,
{
    let use_case = RequestPasswordResetUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    within(&state.config, use_case.execute(req.email)).await?;

    Ok(Json(MessageResponse::new("Password reset link sent to your email")))
}

/// POST /api/auth/reset-password
pub async fn reset_password<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<ResetPasswordRequest>,
) -> AuthResult<Json<MessageResponse>>
where
    R: AuthStore,
{
    let use_case = ResetPasswordUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );

    let input = ResetPasswordInput {
        email: req.email,
        token: req.token,
        new_password: req.new_password,
    };

    within(&state.config, use_case.execute(input)).await?;

    Ok(Json(MessageResponse::new("Password reset successfully")))
}

// ============================================================================
// Users (requires authentication)
// ============================================================================

/// GET /api/users/me
pub async fn get_me<R>(
    State(state): State<AuthAppState<R>>,
    caller: AuthenticatedUser,
) -> AuthResult<Json<UserResponse>>
where
    R: AuthStore,
{
    let use_case = ProfileUseCase::new(state.repo.clone());
    let user = within(&state.config, use_case.get(&caller.user_id)).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// PUT /api/users/me
pub async fn update_me<R>(
    State(state): State<AuthAppState<R>>,
    caller: AuthenticatedUser,
    Json(req): Json<UpdateProfileRequest>,
) -> AuthResult<Json<UserResponse>>
where
    R: AuthStore,
{
    let use_case = ProfileUseCase::new(state.repo.clone());

    let input = UpdateProfileInput {
        name: req.name,
        bio: req.bio,
        avatar_url: req.avatar_url,
    };

    let user = within(&state.config, use_case.update(&caller.user_id, input)).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// POST /api/users/me/password
pub async fn change_password<R>(
    State(state): State<AuthAppState<R>>,
    caller: AuthenticatedUser,
    Json(req): Json<ChangePasswordRequest>,
) -> AuthResult<Json<MessageResponse>>
where
    R: AuthStore,
{
    let use_case = ChangePasswordUseCase::new(state.repo.clone(), state.config.clone());

    let input = ChangePasswordInput {
        current_password: req.current_password,
        new_password: req.new_password,
    };

    within(&state.config, use_case.execute(&caller.user_id, input)).await?;

    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// POST /api/users/me/avatar
pub async fn upload_avatar<R>(
    State(state): State<AuthAppState<R>>,
    caller: AuthenticatedUser,
    Json(req): Json<AvatarUploadRequest>,
) -> AuthResult<Json<UserResponse>>
where
    R: AuthStore,
{
    let bytes = decode_image(&req.image)?;
    let file_name = req.file_name.unwrap_or_else(|| "avatar".to_string());

    let use_case = UploadAvatarUseCase::new(state.repo.clone(), state.images.clone());
    let user = within(
        &state.config,
        use_case.execute(&caller.user_id, &bytes, &file_name),
    )
    .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// PUT /api/users/{id}/role (admin only)
pub async fn change_role<R>(
    State(state): State<AuthAppState<R>>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
    Json(req): Json<ChangeRoleRequest>,
) -> AuthResult<Json<UserResponse>>
where
    R: AuthStore,
{
    let target_id: UserId = id
        .parse()
        .map_err(|_| AppError::bad_request("Invalid user id"))?;

    let use_case = ChangeRoleUseCase::new(state.repo.clone());

    let input = ChangeRoleInput {
        initiator_id: caller.user_id,
        initiator_role: caller.role,
        target_id,
        new_role: req.role,
    };

    let user = within(&state.config, use_case.execute(input)).await?;
    Ok(Json(UserResponse::from(&user)))
}

// ============================================================================
// Helpers
// ============================================================================

/// Empty or whitespace-only bodies parse as `None`
fn parse_optional_body<T>(body: &[u8]) -> AuthResult<Option<T>>
where
    T: serde::de::DeserializeOwned,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| AppError::bad_request(format!("Invalid JSON body: {e}")).into())
}

/// Accepts raw base64 or a `data:image/...;base64,` URL
fn decode_image(input: &str) -> AuthResult<Vec<u8>> {
    let encoded = match input.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => input,
    };
    from_base64(encoded.trim()).map_err(|_| {
        AuthError::App(
            AppError::bad_request("Image must be base64 encoded")
                .with_action("Send the file as base64 or a data URL"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_optional_body() {
        let empty: Option<RefreshRequest> = parse_optional_body(b"  ").unwrap();
        assert!(empty.is_none());

        let parsed: Option<RefreshRequest> =
            parse_optional_body(br#"{"refreshToken":"abc"}"#).unwrap();
        assert_eq!(parsed.unwrap().refresh_token.as_deref(), Some("abc"));

        assert!(parse_optional_body::<RefreshRequest>(b"{nope").is_err());
    }

    #[test]
    fn test_decode_image_accepts_data_url() {
        assert_eq!(decode_image("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(
            decode_image("data:image/png;base64,aGVsbG8=").unwrap(),
            b"hello"
        );
        assert!(decode_image("***").is_err());
    }
}
