//! Application Layer
//!
//! Use cases and application services.

pub mod change_role;
pub mod config;
pub mod login;
pub mod logout;
pub mod notification;
pub mod otp;
pub mod password_reset;
pub mod profile;
pub mod refresh;
pub mod register;
pub mod token;

// Re-exports
pub use change_role::{ChangeRoleInput, ChangeRoleUseCase};
pub use config::AuthConfig;
pub use login::{LoginInput, LoginOutput, LoginUseCase};
pub use logout::LogoutUseCase;
pub use otp::{RequestOtpUseCase, VerifyOtpInput, VerifyOtpUseCase};
pub use password_reset::{RequestPasswordResetUseCase, ResetPasswordInput, ResetPasswordUseCase};
pub use profile::{
    ChangePasswordInput, ChangePasswordUseCase, ProfileUseCase, UpdateProfileInput,
    UploadAvatarUseCase,
};
pub use refresh::{RefreshInput, RefreshOutput, RefreshUseCase};
pub use register::{RegisterInput, RegisterOutput, RegisterUseCase};
pub use token::{AccessClaims, IssuedToken, RefreshClaims, TokenIssuer, TokenPair};
