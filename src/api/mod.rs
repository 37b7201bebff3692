use rocket::{
    http::Status,
    serde::json::{json, Json, Value},
    Catcher, Request, Route,
};

mod admin;
mod auth;
mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(auth::routes());
    routes.extend(voting::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![default_catcher]
}

/// Render guard failures and unmatched routes as the same JSON shape as errors.
#[catch(default)]
fn default_catcher(status: Status, _req: &Request) -> Json<Value> {
    Json(json!({ "error": status.reason().unwrap_or("Unknown error") }))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::{Client, LocalResponse},
        serde::json::{json, serde_json, Value},
    };
    use serde::Serialize;

    use crate::{
        clock::ManualClock,
        config::{Config, CoreFairing, ADMIN_EMAIL, ADMIN_PHONE, ADMIN_USERNAME},
        logging::LoggerFairing,
        model::{
            api::auth::{AdminCredentials, RegisterRequest},
            notifier::{RecordingNotifier, SharedNotifier},
            store::{MemoryStore, Store},
        },
    };

    /// A server over an in-memory store, with a notifier that records
    /// instead of sending and a clock that only moves when told to.
    pub struct TestServer {
        pub client: Client,
        pub notifier: Arc<RecordingNotifier>,
        pub clock: Arc<ManualClock>,
    }

    impl TestServer {
        pub async fn new() -> Self {
            Self::with_notifier(RecordingNotifier::new()).await
        }

        pub async fn with_notifier(notifier: RecordingNotifier) -> Self {
            log4rs_test_utils::test_logging::init_logging_once_for(
                ["securevote_backend"],
                None,
                None,
            );

            let clock = Arc::new(ManualClock::new());
            let notifier = Arc::new(notifier);
            let store: Store = Arc::new(MemoryStore::new());
            let shared: SharedNotifier = notifier.clone();

            let rocket = rocket::build()
                .attach(LoggerFairing)
                .manage(Config::example())
                .manage(store)
                .manage(shared)
                .attach(CoreFairing::new(clock.clone()))
                .mount("/", super::routes())
                .register("/", super::catchers());
            let client = Client::tracked(rocket).await.unwrap();

            Self {
                client,
                notifier,
                clock,
            }
        }

        pub async fn post_json<T: Serialize>(&self, uri: &str, body: &T) -> LocalResponse<'_> {
            self.client
                .post(uri.to_string())
                .header(ContentType::JSON)
                .body(json!(body).to_string())
                .dispatch()
                .await
        }

        pub async fn get(&self, uri: &str) -> LocalResponse<'_> {
            self.client.get(uri.to_string()).dispatch().await
        }

        /// Register the example voter under `aadhaar` and complete OTP verification,
        /// leaving the client logged in as that voter.
        pub async fn sign_in_voter(&self, aadhaar: &str) {
            let request = RegisterRequest {
                aadhaar: aadhaar.to_string(),
                ..RegisterRequest::example()
            };
            let response = self.post_json("/auth/voter/register", &request).await;
            assert_eq!(Status::Ok, response.status());

            let verify = json!({
                "aadhaar": aadhaar,
                "phoneOtp": self.notifier.last_code(&request.phone.to_string()).unwrap(),
                "emailOtp": self.notifier.last_code(request.email.as_str()).unwrap(),
            });
            let response = self.post_json("/auth/voter/verify", &verify).await;
            assert_eq!(Status::Ok, response.status());
        }

        /// Complete both admin login steps, leaving the client logged in as the
        /// configured admin.
        pub async fn sign_in_admin(&self) {
            let response = self
                .post_json("/auth/admin", &AdminCredentials::example())
                .await;
            assert_eq!(Status::Ok, response.status());

            let verify = json!({
                "username": ADMIN_USERNAME,
                "phoneOtp": self.notifier.last_code(ADMIN_PHONE).unwrap(),
                "emailOtp": self.notifier.last_code(ADMIN_EMAIL).unwrap(),
            });
            let response = self.post_json("/auth/admin/verify", &verify).await;
            assert_eq!(Status::Ok, response.status());
        }
    }

    /// Parse a response body as JSON.
    pub async fn body_json(response: LocalResponse<'_>) -> Value {
        let body = response.into_string().await.unwrap();
        serde_json::from_str(&body).unwrap()
    }
}
