use rocket::{
    serde::json::{json, Json, Value},
    Route, State,
};

use crate::{
    crypto::signature,
    error::{Error, Result},
    model::{
        api::vote::{VerifySignatureRequest, VerifySignatureResponse, VoteRequest},
        auth::{AuthToken, Voter},
        vote::{ElectionResult, VoteLedger},
    },
};

pub fn routes() -> Vec<Route> {
    routes![vote, verify_signature, results]
}

#[post("/voter/vote", data = "<ballot>", format = "json")]
pub async fn vote(
    token: AuthToken<Voter>,
    ballot: Json<VoteRequest>,
    ledger: &State<VoteLedger>,
) -> Result<Value> {
    let pseudonym = token
        .pseudonym()
        .map_err(|_| Error::Unauthorized("Session does not identify a voter".to_string()))?;
    ledger
        .submit_vote(&pseudonym, &ballot.candidate_id, &ballot.signature)
        .await?;

    Ok(json!({ "message": "Vote recorded" }))
}

/// Check a signature. A well-formed signature that doesn't verify is still a
/// successful request, it just isn't `valid`.
#[post("/votes/verify", data = "<request>", format = "json")]
pub fn verify_signature(
    request: Json<VerifySignatureRequest>,
) -> Result<Json<VerifySignatureResponse>> {
    let valid = signature::verify(
        request.data.as_bytes(),
        &request.signature,
        &request.public_key,
    )?;
    Ok(Json(VerifySignatureResponse { valid }))
}

#[get("/results")]
pub async fn results(ledger: &State<VoteLedger>) -> Result<Json<ElectionResult>> {
    ledger
        .declared_results()
        .await?
        .map(Json)
        .ok_or_else(|| Error::NotFound("Results have not been declared yet".to_string()))
}

#[cfg(test)]
mod tests {
    use rocket::http::Status;
    use rocket::serde::json::json;

    use super::*;
    use crate::api::testing::{body_json, TestServer};
    use crate::crypto::signature::{generate_keypair, sign};

    const AADHAAR: &str = "1234 5678 9012";

    fn ballot(candidate: &str) -> VoteRequest {
        let keys = generate_keypair().unwrap();
        VoteRequest {
            candidate_id: candidate.to_string(),
            signature: sign(candidate.as_bytes(), &keys.private_key_pem).unwrap(),
        }
    }

    #[rocket::async_test]
    async fn vote_requires_login() {
        let server = TestServer::new().await;
        let response = server.post_json("/voter/vote", &ballot("A")).await;
        assert_eq!(Status::Unauthorized, response.status());
        assert_eq!(
            json!({"error": "Unauthorized"}),
            body_json(response).await
        );
    }

    #[rocket::async_test]
    async fn admin_cannot_vote() {
        let server = TestServer::new().await;
        server.sign_in_admin().await;
        let response = server.post_json("/voter/vote", &ballot("A")).await;
        assert_eq!(Status::Forbidden, response.status());
    }

    #[rocket::async_test]
    async fn one_vote_per_voter() {
        let server = TestServer::new().await;
        server.sign_in_voter(AADHAAR).await;

        let response = server.post_json("/voter/vote", &ballot("A")).await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(json!({"message": "Vote recorded"}), body_json(response).await);

        let response = server.post_json("/voter/vote", &ballot("B")).await;
        assert_eq!(Status::Conflict, response.status());

        let ledger = server.client.rocket().state::<VoteLedger>().unwrap();
        let tally = ledger.tally().await.unwrap();
        assert_eq!(1, tally.get("A"));
        assert_eq!(0, tally.get("B"));
    }

    #[rocket::async_test]
    async fn vote_validates_ballot() {
        let server = TestServer::new().await;
        server.sign_in_voter(AADHAAR).await;

        let unsigned = VoteRequest {
            signature: "%%%".to_string(),
            ..ballot("A")
        };
        let response = server.post_json("/voter/vote", &unsigned).await;
        assert_eq!(Status::BadRequest, response.status());

        // The rejected ballot didn't use up the vote.
        let response = server.post_json("/voter/vote", &ballot("A")).await;
        assert_eq!(Status::Ok, response.status());
    }

    #[rocket::async_test]
    async fn verify_signature_reports_validity() {
        let server = TestServer::new().await;
        let keys = generate_keypair().unwrap();
        let signature = sign(b"candidate-1", &keys.private_key_pem).unwrap();

        let genuine = VerifySignatureRequest {
            data: "candidate-1".to_string(),
            signature: signature.clone(),
            public_key: keys.public_key_pem.clone(),
        };
        let response = server.post_json("/votes/verify", &genuine).await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(json!({"valid": true}), body_json(response).await);

        let tampered = VerifySignatureRequest {
            data: "candidate-2".to_string(),
            ..genuine.clone()
        };
        let response = server.post_json("/votes/verify", &tampered).await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(json!({"valid": false}), body_json(response).await);

        let other_key = VerifySignatureRequest {
            public_key: generate_keypair().unwrap().public_key_pem,
            ..genuine.clone()
        };
        let response = server.post_json("/votes/verify", &other_key).await;
        assert_eq!(json!({"valid": false}), body_json(response).await);

        let garbage_key = VerifySignatureRequest {
            public_key: "not a key".to_string(),
            ..genuine
        };
        let response = server.post_json("/votes/verify", &garbage_key).await;
        assert_eq!(Status::BadRequest, response.status());
    }

    #[rocket::async_test]
    async fn results_wait_for_declaration() {
        let server = TestServer::new().await;
        let response = server.get("/results").await;
        assert_eq!(Status::NotFound, response.status());
    }
}
