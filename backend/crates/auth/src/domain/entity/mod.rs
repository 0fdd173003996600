pub mod otp;
pub mod password_reset;
pub mod refresh_token;
pub mod user;
