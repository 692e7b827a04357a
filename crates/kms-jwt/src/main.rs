use std::sync::Arc;

use anyhow::Context;
use clap::{Parser as _, Subcommand, ValueEnum};
use kms_jwt::signing::kms_keyfunc;
use kms_jwt::token::Claims;
use kms_jwt::{
    Algorithm, KeyMaterial, KmsConfig, KmsContext, KmsSigningMethods, LocalKms, Parser,
    SigningMethodRegistry, Token, attach_config,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SigningAlgorithm {
    Rs256,
    Ps256,
    Es256,
    Es384,
}

impl From<SigningAlgorithm> for Algorithm {
    fn from(value: SigningAlgorithm) -> Self {
        match value {
            SigningAlgorithm::Rs256 => Algorithm::Rs256,
            SigningAlgorithm::Ps256 => Algorithm::Ps256,
            SigningAlgorithm::Es256 => Algorithm::Es256,
            SigningAlgorithm::Es384 => Algorithm::Es384,
        }
    }
}

#[derive(clap::Parser)]
struct Args {
    /// Seed the local key-management service derives its keys from.
    #[clap(long, env = "KMS_SEED")]
    seed: String,
    #[clap(long, env = "KMS_KEY_PATH")]
    key_path: String,
    #[clap(long, env = "KMS_ALGORITHM", default_value = "rs256")]
    algorithm: SigningAlgorithm,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign a JSON claims object and print the compact token.
    Sign {
        #[clap(long, default_value = "{}")]
        claims: String,
        #[clap(long)]
        kid: Option<String>,
    },
    /// Verify a token and print its claims.
    Verify {
        #[clap(long)]
        token: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let algorithm = Algorithm::from(args.algorithm);

    let kms = Arc::new(LocalKms::from_seed(args.seed));
    kms.create_key_version(&args.key_path, algorithm)
        .context("creating key version")?;

    let registry = SigningMethodRegistry::global();
    KmsSigningMethods::new(kms).override_in(registry);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });
    let ctx = KmsContext::with_cancellation(cancel);
    let config = KmsConfig::new(args.key_path);

    match args.command {
        Command::Sign { claims, kid } => {
            let claims: Claims = serde_json::from_str(&claims).context("parsing claims")?;
            let method = registry
                .get(algorithm.name())
                .with_context(|| format!("{algorithm} is not registered"))?;

            let mut token = Token::new(method, claims);
            if let Some(kid) = kid {
                token = token.with_kid(kid);
            }
            let signed = token
                .signed_string(&KeyMaterial::Kms(attach_config(&ctx, config)))
                .await
                .context("signing token")?;
            println!("{signed}");
        }
        Command::Verify { token } => {
            let token = Parser::new(registry)
                .parse(&token, kms_keyfunc(&ctx, config))
                .await
                .context("verifying token")?;
            tracing::info!(alg = token.method.alg(), kid = ?token.kid(), "token verified");
            println!("{}", serde_json::to_string_pretty(&token.claims)?);
        }
    }

    Ok(())
}
