use std::{collections::HashMap, sync::Arc, time::Duration};

use jsonwebtoken::{
    DecodingKey, Validation, decode,
    jwk::{AlgorithmParameters, JwkSet},
};
use lectern::platform::{Environment, Platform};
use lectern_types::{Result, Value, bail};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::assets::{DynAssetHost, HttpAssetHost};
use crate::mail::{DynMailClient, create_mail_client};
use crate::otp::{DynOtpStore, MemoryOtpStore};
use crate::payment::{DynPaymentGateway, StripeGateway};
use crate::textgen::{DynOutlineGenerator, GeminiOutlineGenerator};

pub type AppState = Arc<State>;

/// Cached verification result for a bearer token
#[derive(Clone, Debug)]
pub enum CachedAuth {
    Valid { sub: String },
    Invalid,
}

pub struct State {
    pub platform: Platform,
    pub db: DatabaseConnection,
    pub jwks: JwkSet,
    pub payment: Option<DynPaymentGateway>,
    pub mail_client: Option<DynMailClient>,
    pub asset_host: Option<DynAssetHost>,
    pub outline_generator: Option<DynOutlineGenerator>,
    pub otp_store: DynOtpStore,
    /// Auth token cache: token_hash -> CachedAuth
    /// Short TTL (240s) to balance security vs performance
    pub auth_cache: moka::sync::Cache<String, CachedAuth>,
}

impl State {
    pub async fn new(platform: Platform, jwks: JwkSet) -> Self {
        let db_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let mut opt = ConnectOptions::new(db_url);
        opt.max_connections(10)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .sqlx_logging(platform.environment == Environment::Development);

        let db = Database::connect(opt)
            .await
            .expect("Failed to connect to database");

        let payment: Option<DynPaymentGateway> = if platform.features.payments {
            let gateway = StripeGateway::from_env().expect("Payment configuration missing");
            Some(Arc::new(gateway))
        } else {
            None
        };

        let mail_client: Option<DynMailClient> = if let Some(mail_config) = &platform.mail {
            match create_mail_client(mail_config).await {
                Ok(client) => Some(client),
                Err(e) => {
                    tracing::warn!("Failed to initialize mail client: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let asset_host: Option<DynAssetHost> = if platform.features.assets {
            match HttpAssetHost::from_env() {
                Some(host) => Some(Arc::new(host)),
                None => {
                    tracing::warn!(
                        "Asset uploads enabled but ASSET_HOST_URL / ASSET_HOST_KEY not set"
                    );
                    None
                }
            }
        } else {
            None
        };

        let outline_generator: Option<DynOutlineGenerator> = if platform.features.ai_outlines {
            let generator = GeminiOutlineGenerator::from_env();
            if generator.is_none() {
                tracing::info!("GEMINI_API_KEY not set, serving the sample outline");
            }
            generator.map(|g| Arc::new(g) as DynOutlineGenerator)
        } else {
            None
        };

        let otp_ttl = Duration::from_secs(600);
        let otp_store: DynOtpStore = Arc::new(MemoryOtpStore::new(otp_ttl));
        #[cfg(feature = "redis")]
        let otp_store: DynOtpStore = match std::env::var("REDIS_URL") {
            Ok(url) => {
                let store = crate::otp::RedisOtpStore::connect(&url, otp_ttl)
                    .await
                    .expect("Failed to connect to Redis");
                Arc::new(store)
            }
            Err(_) => otp_store,
        };

        Self {
            platform,
            db,
            jwks,
            payment,
            mail_client,
            asset_host,
            outline_generator,
            otp_store,
            // Entries are keyed by token hash to avoid storing raw tokens
            auth_cache: moka::sync::Cache::builder()
                .max_capacity(10_000)
                .time_to_live(Duration::from_secs(240))
                .build(),
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<HashMap<String, Value>> {
        let header = jsonwebtoken::decode_header(token)?;
        let Some(kid) = header.kid else {
            return Err(lectern_types::anyhow!("Missing kid in token header"));
        };
        let Some(jwk) = self.jwks.find(&kid) else {
            return Err(lectern_types::anyhow!("JWK not found for kid: {}", kid));
        };
        let alg = decoding_key_for_algorithm(&jwk.algorithm)?;
        let mut validation = Validation::new(header.alg);
        validation.validate_aud = false;
        let decoded = decode::<HashMap<String, Value>>(token, &alg, &validation)?;
        let claims = decoded.claims;
        Ok(claims)
    }
}

fn decoding_key_for_algorithm(alg: &AlgorithmParameters) -> Result<DecodingKey> {
    let key = match alg {
        AlgorithmParameters::RSA(rsa) => DecodingKey::from_rsa_components(&rsa.n, &rsa.e),
        AlgorithmParameters::EllipticCurve(ec) => DecodingKey::from_ec_components(&ec.x, &ec.y),
        AlgorithmParameters::OctetKeyPair(octet) => DecodingKey::from_ed_components(&octet.x),
        _ => bail!("Unsupported algorithm"),
    }?;
    Ok(key)
}
