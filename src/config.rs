use std::sync::Arc;

use aws_config::{BehaviorVersion, SdkConfig};
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_sdk_sns::{
    config::{Credentials, Region},
    Client as SnsClient,
};
use chrono::Duration;
use log::{error, info, warn};
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::{
    clock::{Clock, SystemClock},
    crypto::{SymmetricCipher, VoterAnonymizer},
    model::{
        api::{email::Email, sms::Sms},
        mongodb::{ensure_indexes_exist, MongoStore},
        notifier::{EmailRelay, ExternalNotifier, SharedNotifier},
        otp::{MemoryOtpStore, OtpManager},
        store::{MemoryStore, Store},
        vote::VoteLedger,
        voter::{Contact, VoterRegistry},
    },
};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    otp_ttl: u32,
    auth_ttl: u32,
    kdf_rounds: u32,
    otp_sweep_interval: u32,
    admin_username: String,
    admin_phone: Sms,
    admin_email: Email,
    // secrets
    jwt_secret: String,
    encryption_secret: String,
    encryption_salt: String,
    admin_password_hash: String,
    pseudonym_secret: Option<String>,
}

impl Config {
    /// Valid lifetime of OTPs in seconds.
    pub fn otp_ttl(&self) -> Duration {
        Duration::seconds(self.otp_ttl.into())
    }

    /// Valid lifetime of auth token cookies in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// PBKDF2 iterations used to derive the field encryption key.
    pub fn kdf_rounds(&self) -> u32 {
        self.kdf_rounds
    }

    /// Seconds between sweeps of expired OTPs. Zero disables the sweep.
    pub fn otp_sweep_interval(&self) -> Option<std::time::Duration> {
        (self.otp_sweep_interval > 0)
            .then(|| std::time::Duration::from_secs(self.otp_sweep_interval.into()))
    }

    pub fn admin_username(&self) -> &str {
        &self.admin_username
    }

    /// Where the admin's second-factor codes are sent.
    pub fn admin_contact(&self) -> Contact {
        Contact {
            phone: self.admin_phone.to_string(),
            email: self.admin_email.to_string(),
        }
    }

    /// Secret key used to sign JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Secret the field encryption key is derived from.
    pub fn encryption_secret(&self) -> &[u8] {
        self.encryption_secret.as_bytes()
    }

    pub fn encryption_salt(&self) -> &[u8] {
        self.encryption_salt.as_bytes()
    }

    /// Encoded argon2 hash of the admin password.
    pub fn admin_password_hash(&self) -> &str {
        &self.admin_password_hash
    }

    /// Key for pseudonym HMACs, if pseudonyms are keyed.
    pub fn pseudonym_secret(&self) -> Option<&[u8]> {
        self.pseudonym_secret.as_deref().map(str::as_bytes)
    }

    fn check(&self) -> Result<(), String> {
        if self.kdf_rounds == 0 {
            return Err("`kdf_rounds` must be at least 1".to_string());
        }
        if self.otp_ttl == 0 {
            return Err("`otp_ttl` must be at least 1".to_string());
        }
        if self.encryption_secret.is_empty() || self.jwt_secret.is_empty() {
            return Err("`encryption_secret` and `jwt_secret` must not be empty".to_string());
        }
        Ok(())
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        if let Err(e) = config.check() {
            error!("Invalid application config: {e}");
            return Err(rocket);
        }

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // secrets
    db_uri: Option<String>,
    // non-secrets
    #[serde(default = "default_db_name")]
    db_name: String,
}

fn default_db_name() -> String {
    "securevote".to_string()
}

/// A fairing that loads the database config, connects to MongoDB, performs
/// any setup necessary, and places the resulting [`Store`] into managed state.
///
/// Without a `db_uri` the server falls back to a process-local store.
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "Document store",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        let store: Store = match config.db_uri {
            Some(db_uri) => {
                info!("Loaded database config, connecting...");
                // Construct the connection.
                let client = match MongoClient::with_uri_str(db_uri).await {
                    Ok(client) => client,
                    Err(e) => {
                        error!("Failed to connect to database: {e}");
                        return Err(rocket);
                    }
                };
                let db = client.database(&config.db_name);

                // Ensure the required indexes exist.
                if let Err(e) = ensure_indexes_exist(&db).await {
                    error!("Failed to connect to database: {e}");
                    return Err(rocket);
                }
                info!("...database connection online!");
                Arc::new(MongoStore::new(db))
            }
            None => {
                warn!("No `db_uri` configured, records will only be kept in memory");
                Arc::new(MemoryStore::new())
            }
        };

        // Manage the state.
        rocket = rocket.manage(store);
        Ok(rocket)
    }
}

/// Configuration for outgoing notifications.
#[derive(Deserialize)]
struct NotifierConfig {
    // non-secrets
    aws_region: String,
    email_relay_url: String,
    email_sender: String,
    // secrets
    aws_access_key_id: String,
    aws_secret_access_key: String,
    email_relay_token: String,
}

/// A fairing that loads the notifier config and places a [`SharedNotifier`]
/// sending SMS through Amazon SNS and email through the relay into managed state.
pub struct NotifierFairing;

#[rocket::async_trait]
impl Fairing for NotifierFairing {
    fn info(&self) -> Info {
        Info {
            name: "Notifier",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<NotifierConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load notifier config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        // Construct the connection.
        let aws_config = SdkConfig::builder()
            .region(Region::new(config.aws_region))
            .credentials_provider(SharedCredentialsProvider::new(Credentials::new(
                config.aws_access_key_id,
                config.aws_secret_access_key,
                None,
                None,
                "rocket config",
            )))
            .behavior_version(BehaviorVersion::latest())
            .build();
        let relay = EmailRelay {
            url: config.email_relay_url,
            token: config.email_relay_token,
            sender: config.email_sender,
        };
        let notifier: SharedNotifier =
            Arc::new(ExternalNotifier::new(SnsClient::new(&aws_config), relay));
        info!("Loaded Amazon SNS and email relay config");

        // Manage the state.
        rocket = rocket.manage(notifier);
        Ok(rocket)
    }
}

/// A fairing that builds the voting core from the managed [`Config`] and
/// [`Store`]: the field cipher, the anonymizer, the OTP manager, the voter
/// registry and the vote ledger.
///
/// Must be attached after [`ConfigFairing`] and [`DatabaseFairing`].
pub struct CoreFairing {
    clock: Arc<dyn Clock>,
}

impl CoreFairing {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl Default for CoreFairing {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

#[rocket::async_trait]
impl Fairing for CoreFairing {
    fn info(&self) -> Info {
        Info {
            name: "Voting core",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let Some(store) = rocket.state::<Store>().cloned() else {
            error!("Voting core needs a document store");
            return Err(rocket);
        };
        let Some(config) = rocket.state::<Config>() else {
            error!("Voting core needs the application config");
            return Err(rocket);
        };

        // The key is derived once here and shared by everything that encrypts.
        let cipher = Arc::new(SymmetricCipher::new(
            config.encryption_secret(),
            config.encryption_salt(),
            config.kdf_rounds(),
        ));
        let anonymizer = VoterAnonymizer::new(config.pseudonym_secret());
        if config.pseudonym_secret().is_none() {
            warn!("No `pseudonym_secret` configured, pseudonyms are unkeyed hashes");
        }
        let otp = Arc::new(OtpManager::new(
            MemoryOtpStore::new(),
            self.clock.clone(),
            config.otp_ttl(),
        ));
        let registry = VoterRegistry::new(store.clone(), cipher.clone(), self.clock.clone());
        let ledger = VoteLedger::new(store, cipher, self.clock.clone());
        info!("Voting core ready");

        Ok(rocket
            .manage(anonymizer)
            .manage(otp)
            .manage(registry)
            .manage(ledger))
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;
    use crate::crypto::hash_password;

    pub const ADMIN_USERNAME: &str = "returning-officer";
    pub const ADMIN_PASSWORD: &str = "correct horse battery";
    pub const ADMIN_PHONE: &str = "+447700900001";
    pub const ADMIN_EMAIL: &str = "officer@example.com";

    impl Config {
        pub fn example() -> Self {
            Self {
                otp_ttl: 300,
                auth_ttl: 3600,
                kdf_rounds: 1_000,
                otp_sweep_interval: 0,
                admin_username: ADMIN_USERNAME.to_string(),
                admin_phone: ADMIN_PHONE.parse().unwrap(),
                admin_email: ADMIN_EMAIL.parse().unwrap(),
                jwt_secret: "test jwt secret".to_string(),
                encryption_secret: "test encryption secret".to_string(),
                encryption_salt: "test salt".to_string(),
                admin_password_hash: hash_password(ADMIN_PASSWORD).unwrap(),
                pseudonym_secret: Some("test pseudonym secret".to_string()),
            }
        }
    }
}

#[cfg(test)]
pub use examples::{ADMIN_EMAIL, ADMIN_PASSWORD, ADMIN_PHONE, ADMIN_USERNAME};
