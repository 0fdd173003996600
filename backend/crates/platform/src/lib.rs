//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, Base64, random codes)
//! - Password and secret hashing (Argon2id, NIST SP 800-63B compliant)
//! - Cookie management
//! - Fixed-window rate limit decisions
//! - Per-request deadlines
//! - A TTL cache for read-through listings
//! - Outbound providers: transactional mail, image hosting, generative AI

pub mod cache;
pub mod cookie;
pub mod crypto;
pub mod deadline;
pub mod genai;
pub mod image;
pub mod mail;
pub mod password;
pub mod rate_limit;
