//! Offline helpers for election administrators: generating voter signing keys,
//! signing ballots by hand, and producing the admin password hash for `Rocket.toml`.
//! Uses the server's own crypto, so its output is always accepted by the API.

use std::fs;

use clap::{Arg, ArgAction, ArgMatches, Command};

use securevote_backend::crypto::{hash_password, signature};

const PROGRAM_NAME: &str = "securevote-admin";

const ABOUT_TEXT: &str = "Administrative tools for a SecureVote deployment.

EXIT CODES:
     0: Success.
 Other: Error.";

const KEYGEN: &str = "keygen";
const HASH_PASSWORD: &str = "hash-password";
const SIGN: &str = "sign";

const PASSWORD: &str = "PASSWORD";
const DATA: &str = "DATA";
const KEY_PATH: &str = "KEY_PATH";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .subcommand_required(true)
        .subcommand(Command::new(KEYGEN).about("Generate a P-256 key pair as PEM"))
        .subcommand(
            Command::new(HASH_PASSWORD)
                .about("Hash a password for the `admin_password_hash` setting")
                .arg(
                    Arg::new(PASSWORD)
                        .help("The admin password")
                        .action(ArgAction::Set)
                        .required(true),
                ),
        )
        .subcommand(
            Command::new(SIGN)
                .about("Sign data, printing the base64 signature")
                .arg(
                    Arg::new(DATA)
                        .help("The data to sign, usually a candidate ID")
                        .action(ArgAction::Set)
                        .required(true),
                )
                .arg(
                    Arg::new(KEY_PATH)
                        .help("Path to a PEM private key, as printed by `keygen`")
                        .action(ArgAction::Set)
                        .required(true),
                ),
        )
}

/// Run the chosen subcommand, returning what to print.
fn execute(args: &ArgMatches) -> Result<String, String> {
    match args.subcommand() {
        Some((KEYGEN, _)) => {
            let keys = signature::generate_keypair().map_err(|e| e.to_string())?;
            Ok(format!("{}{}", keys.private_key_pem, keys.public_key_pem))
        }
        Some((HASH_PASSWORD, sub)) => {
            // Required argument is guaranteed to be present.
            let password: &String = sub.get_one(PASSWORD).unwrap();
            hash_password(password).map_err(|e| e.to_string())
        }
        Some((SIGN, sub)) => {
            let data: &String = sub.get_one(DATA).unwrap();
            let path: &String = sub.get_one(KEY_PATH).unwrap();
            let pem = fs::read_to_string(path).map_err(|e| format!("IO error: {e}"))?;
            signature::sign(data.as_bytes(), &pem).map_err(|e| e.to_string())
        }
        _ => unreachable!("a subcommand is required"),
    }
}

fn main() {
    let args = cli().get_matches();
    match execute(&args) {
        Ok(output) => println!("{}", output.trim_end()),
        Err(msg) => {
            eprintln!("Error: {msg}");
            std::process::exit(1)
        }
    }
}
