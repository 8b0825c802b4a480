//! Email dispatch collaborator.
//!
//! Delivery is a synchronous point-to-point side effect with no retry
//! policy: OTP emails surface failures to the caller, welcome emails are
//! best-effort. SMTP delivery is not wired up yet; messages are traced so
//! development and tests can observe the codes.

/// Dispatch a verification code for registration or password reset.
pub fn send_otp_email(email: &str, code: &str, purpose: &str) {
    tracing::info!(
        email = %email,
        code = %code,
        purpose = %purpose,
        "OTP email dispatched (SMTP delivery not yet implemented)"
    );
}

/// Dispatch the post-registration welcome email. Failures here must never
/// fail the registration itself.
pub fn send_welcome_email(email: &str) {
    tracing::info!(
        email = %email,
        "Welcome email dispatched (SMTP delivery not yet implemented)"
    );
}
