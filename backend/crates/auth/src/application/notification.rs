//! Transactional email bodies

use platform::mail::OutgoingMail;

use crate::domain::entity::user::User;

pub fn otp_mail(user: &User, code: &str, ttl_minutes: i64) -> OutgoingMail {
    let greeting = greeting(user);

    OutgoingMail::new(user.email.as_str(), "Your verification code")
        .to_name(user.user_name.original())
        .text(format!(
            "{greeting}\n\nYour verification code is {code}. It expires in {ttl_minutes} minutes.\n\nIf you did not request it, ignore this email."
        ))
        .html(format!(
            "<p>{greeting}</p>\
             <p>Your verification code is <strong style=\"font-size:20px;letter-spacing:4px\">{code}</strong>.</p>\
             <p>It expires in {ttl_minutes} minutes.</p>\
             <p>If you did not request it, ignore this email.</p>"
        ))
}

pub fn password_reset_mail(user: &User, link: &str, ttl_minutes: i64) -> OutgoingMail {
    let greeting = greeting(user);

    OutgoingMail::new(user.email.as_str(), "Reset your password")
        .to_name(user.user_name.original())
        .text(format!(
            "{greeting}\n\nOpen this link to choose a new password: {link}\nThe link expires in {ttl_minutes} minutes and works once."
        ))
        .html(format!(
            "<p>{greeting}</p>\
             <p><a href=\"{link}\">Choose a new password</a></p>\
             <p>The link expires in {ttl_minutes} minutes and works once.</p>"
        ))
}

fn greeting(user: &User) -> String {
    let name = user
        .profile
        .name
        .as_deref()
        .unwrap_or_else(|| user.user_name.original());
    format!("Hi {name},")
}
