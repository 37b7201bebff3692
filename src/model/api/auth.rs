use serde::{Deserialize, Serialize};

use crate::model::otp::Code;

use super::{email::Email, sms::Sms};

/// A new voter's registration details.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// National identity number; only its pseudonym is ever stored in the clear.
    pub aadhaar: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub phone: Sms,
    pub email: Email,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub aadhaar: String,
    pub password: String,
}

/// The two codes sent on registration or login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub aadhaar: String,
    pub phone_otp: Code,
    pub email_otp: Code,
}

/// Raw admin credentials, received from a user. The password is never stored.
#[derive(Clone, Deserialize, Serialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

/// The admin's username and the two codes sent after a correct password.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminVerifyRequest {
    pub username: String,
    pub phone_otp: Code,
    pub email_otp: Code,
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;
    use crate::config::{ADMIN_PASSWORD, ADMIN_USERNAME};

    impl RegisterRequest {
        pub fn example() -> Self {
            Self {
                aadhaar: "4567 8901 2345".to_string(),
                name: "Asha Verma".to_string(),
                age: 34,
                gender: "F".to_string(),
                phone: Sms::example(),
                email: Email::example(),
                password: "voting is fun".to_string(),
            }
        }
    }

    impl LoginRequest {
        pub fn example() -> Self {
            let register = RegisterRequest::example();
            Self {
                aadhaar: register.aadhaar,
                password: register.password,
            }
        }
    }

    impl AdminCredentials {
        pub fn example() -> Self {
            Self {
                username: ADMIN_USERNAME.to_string(),
                password: ADMIN_PASSWORD.to_string(),
            }
        }
    }
}
