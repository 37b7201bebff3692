use log::info;
use rocket::{
    serde::json::{json, Json, Value},
    Route, State,
};

use crate::{
    crypto::CryptoError,
    error::{Error, Result},
    logging::RequestId,
    model::{
        api::vote::{DecryptRequest, DecryptResponse},
        auth::{Admin, AuthToken},
        vote::{ElectionResult, Vote, VoteLedger},
    },
};

pub fn routes() -> Vec<Route> {
    routes![tally, declare_results, decrypt, votes]
}

#[get("/admin/tally")]
async fn tally(
    token: AuthToken<Admin>,
    id: &RequestId,
    ledger: &State<VoteLedger>,
) -> Result<Value> {
    info!("  req{id} tally requested by {}", token.subject());
    let tally = ledger.tally().await?;
    let total = tally.total();
    Ok(json!({ "voteCount": tally, "totalVotes": total }))
}

#[post("/admin/results")]
async fn declare_results(
    token: AuthToken<Admin>,
    id: &RequestId,
    ledger: &State<VoteLedger>,
) -> Result<Json<ElectionResult>> {
    info!("  req{id} results declared by {}", token.subject());
    Ok(Json(ledger.declare_results().await?))
}

#[post("/admin/decrypt", data = "<request>", format = "json")]
async fn decrypt(
    token: AuthToken<Admin>,
    id: &RequestId,
    request: Json<DecryptRequest>,
    ledger: &State<VoteLedger>,
) -> Result<Json<DecryptResponse>> {
    info!("  req{id} field decrypted by {}", token.subject());
    let plaintext = ledger.decrypt(&request.ciphertext).map_err(decrypt_error)?;
    Ok(Json(DecryptResponse { plaintext }))
}

/// Malformed input is the caller's fault. Well-formed ciphertext that fails
/// to decrypt points at a key or data problem and stays a server error.
fn decrypt_error(err: CryptoError) -> Error {
    match err {
        CryptoError::Base64(_) | CryptoError::Length(_) => {
            Error::Validation(format!("Ciphertext could not be decrypted: {err}"))
        }
        other => Error::Crypto(other),
    }
}

#[get("/admin/votes")]
async fn votes(
    token: AuthToken<Admin>,
    id: &RequestId,
    ledger: &State<VoteLedger>,
) -> Result<Json<Vec<Vote>>> {
    info!("  req{id} votes listed by {}", token.subject());
    Ok(Json(ledger.votes().await?))
}
