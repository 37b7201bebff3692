use std::sync::Arc;

use rocket::{
    http::{CookieJar, Status},
    serde::json::{json, Json, Value},
    Route, State,
};

use crate::{
    config::Config,
    crypto::{verify_password, Pseudonym, VoterAnonymizer},
    error::{Error, Result},
    model::{
        api::auth::{
            AdminCredentials, AdminVerifyRequest, LoginRequest, RegisterRequest, VerifyRequest,
        },
        auth::{Admin, AuthToken, Voter, AUTH_TOKEN_COOKIE},
        notifier::{otp_message, Channel, SharedNotifier},
        otp::{Code, OtpManager},
        voter::{Contact, VoterRegistry},
    },
};

/// Number of digits in an Aadhaar number.
const AADHAAR_LENGTH: usize = 12;

pub fn routes() -> Vec<Route> {
    routes![register, login, verify, authenticate_admin, verify_admin, logout]
}

#[post("/auth/voter/register", data = "<request>", format = "json")]
pub async fn register(
    request: Json<RegisterRequest>,
    anonymizer: &State<VoterAnonymizer>,
    registry: &State<VoterRegistry>,
    otp: &State<Arc<OtpManager>>,
    notifier: &State<SharedNotifier>,
) -> Result<Value> {
    let pseudonym = pseudonym_for(anonymizer, &request.aadhaar)?;
    let contact = registry.register(&pseudonym, &request).await?;
    send_codes(otp, notifier, &contact).await?;

    Ok(json!({ "message": "OTP sent to phone and email for verification" }))
}

#[post("/auth/voter/login", data = "<request>", format = "json")]
pub async fn login(
    request: Json<LoginRequest>,
    anonymizer: &State<VoterAnonymizer>,
    registry: &State<VoterRegistry>,
    otp: &State<Arc<OtpManager>>,
    notifier: &State<SharedNotifier>,
) -> Result<Value> {
    let pseudonym = pseudonym_for(anonymizer, &request.aadhaar)?;
    let contact = registry.authenticate(&pseudonym, &request.password).await?;
    send_codes(otp, notifier, &contact).await?;

    Ok(json!({ "message": "OTP sent for verification" }))
}

#[post("/auth/voter/verify", data = "<request>", format = "json")]
pub async fn verify(
    request: Json<VerifyRequest>,
    cookies: &CookieJar<'_>,
    anonymizer: &State<VoterAnonymizer>,
    registry: &State<VoterRegistry>,
    otp: &State<Arc<OtpManager>>,
    config: &State<Config>,
) -> Result<()> {
    let pseudonym = pseudonym_for(anonymizer, &request.aadhaar)?;
    let contact = registry.contact(&pseudonym).await?;

    verify_codes(otp, &contact, &request.phone_otp, &request.email_otp)?;

    let token = AuthToken::<Voter>::new(pseudonym.as_str());
    cookies.add(token.into_cookie(config)?);

    Ok(())
}

#[post("/auth/admin", data = "<credentials>", format = "json")]
pub async fn authenticate_admin(
    credentials: Json<AdminCredentials>,
    config: &State<Config>,
    otp: &State<Arc<OtpManager>>,
    notifier: &State<SharedNotifier>,
) -> Result<Value> {
    // Check the password even for the wrong username, so both take as long.
    let password_ok = verify_password(config.admin_password_hash(), &credentials.password)?;
    if !password_ok || credentials.username != config.admin_username() {
        return Err(Error::Unauthorized(
            "No admin found with the provided username and password combination.".to_string(),
        ));
    }
    send_codes(otp, notifier, &config.admin_contact()).await?;

    Ok(json!({ "message": "OTP sent to admin phone and email for verification" }))
}

#[post("/auth/admin/verify", data = "<request>", format = "json")]
pub async fn verify_admin(
    request: Json<AdminVerifyRequest>,
    cookies: &CookieJar<'_>,
    otp: &State<Arc<OtpManager>>,
    config: &State<Config>,
) -> Result<()> {
    if request.username != config.admin_username() {
        return Err(Error::Unauthorized(
            "No admin found with the provided username.".to_string(),
        ));
    }
    verify_codes(otp, &config.admin_contact(), &request.phone_otp, &request.email_otp)?;

    let token = AuthToken::<Admin>::new(request.username.as_str());
    cookies.add(token.into_cookie(config)?);

    Ok(())
}

#[delete("/auth")]
pub fn logout(cookies: &CookieJar<'_>) -> Status {
    cookies.remove(AUTH_TOKEN_COOKIE);
    Status::Ok
}

/// Pseudonymize an Aadhaar number, ignoring spaces and hyphens between digit groups.
fn pseudonym_for(anonymizer: &VoterAnonymizer, aadhaar: &str) -> Result<Pseudonym> {
    let digits: String = aadhaar
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    if digits.len() != AADHAAR_LENGTH || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::Validation(format!(
            "Aadhaar number must have {AADHAAR_LENGTH} digits"
        )));
    }
    Ok(anonymizer.anonymize(&digits))
}

/// The OTP store key for a destination on a channel.
fn otp_key(channel: Channel, destination: &str) -> String {
    format!("{channel}:{destination}")
}

/// Check the codes for both channels, consuming them only if both match.
/// A wrong code on either channel leaves both live for a retry.
fn verify_codes(
    otp: &OtpManager,
    contact: &Contact,
    phone_otp: &Code,
    email_otp: &Code,
) -> Result<()> {
    let phone = otp_key(Channel::Sms, &contact.phone);
    let email = otp_key(Channel::Email, &contact.email);
    otp.check(&phone, phone_otp)?;
    otp.check(&email, email_otp)?;
    otp.verify(&phone, phone_otp)?;
    otp.verify(&email, email_otp)?;
    Ok(())
}

/// Issue and deliver a fresh code on each of a contact's channels.
async fn send_codes(
    otp: &OtpManager,
    notifier: &SharedNotifier,
    contact: &Contact,
) -> Result<()> {
    for (channel, destination) in [
        (Channel::Sms, &contact.phone),
        (Channel::Email, &contact.email),
    ] {
        let code = otp.issue(&otp_key(channel, destination));
        notifier
            .send(channel, destination, &otp_message(&code, otp.ttl()))
            .await?;
    }
    Ok(())
}
