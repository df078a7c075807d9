use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
mod auth;
use sailcrypt::credentials::{SystemLogin, SystemTokenRequest, UserLogin};
use sailcrypt::crypto::{self, SALT_LEN};
use sailcrypt::{Config, HashAlgorithm, KdfParams, MagicPolicy};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, clap::Args)]
struct KdfArgs {
    /// Key size in 32-bit words (default: 8)
    #[arg(long = "key-words", default_value_t = 8)]
    key_size_words: usize,

    /// IV size in 32-bit words (default: 4)
    #[arg(long = "iv-words", default_value_t = 4)]
    iv_size_words: usize,

    /// Hash iterations per block (default: 1)
    #[arg(long, default_value_t = 1)]
    iterations: u32,

    /// Digest driving the derivation: md5 or sha256
    #[arg(long, default_value_t = HashAlgorithm::Md5)]
    hash: HashAlgorithm,
}

impl KdfArgs {
    fn to_kdf_params(&self) -> Result<KdfParams> {
        Ok(KdfParams::new(
            self.key_size_words,
            self.iv_size_words,
            self.iterations,
            self.hash,
        )?)
    }
}

#[derive(Debug, Parser)]
#[command(name = "sailcrypt")]
#[command(
    version,
    about = "CryptoJS-compatible credential encryption for the sailing federation API."
)]
struct Cli {
    /// Path to a JSON config file
    #[arg(long, global = true, value_name = "PATH", env = "SAILCRYPT_CONFIG")]
    config: Option<PathBuf>,

    /// Envelope tag check on decrypt: strict or lenient
    #[arg(long, global = true, value_name = "POLICY")]
    magic_policy: Option<MagicPolicy>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Encrypts a secret into a base64 envelope
    Encrypt,

    /// Decrypts a base64 envelope
    #[command(arg_required_else_help = true)]
    Decrypt { payload: String },

    /// Derives a key and IV from a password and salt
    Derive {
        /// Salt as 16 hex digits
        #[arg(long)]
        salt: String,

        #[command(flatten)]
        kdf: KdfArgs,
    },

    /// Prints a login request body with the secret encrypted
    #[command(subcommand)]
    LoginBody(LoginBody),
}

#[derive(Debug, Subcommand)]
enum LoginBody {
    /// Username and password login
    User {
        #[arg(long)]
        username: String,
    },

    /// System token login
    System {
        #[arg(long)]
        token: String,
    },

    /// Request for a new system token
    SystemToken {
        #[arg(long)]
        title: String,
    },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(false),
        )
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = Config::load(cli.config.as_deref())?;

    Ok(match cli.magic_policy {
        Some(policy) => config.with_magic_policy(policy),
        None => config,
    })
}

fn parse_salt(hex_salt: &str) -> Result<[u8; SALT_LEN]> {
    let bytes = hex::decode(hex_salt.trim()).context("salt must be hex encoded")?;
    let Ok(salt) = <[u8; SALT_LEN]>::try_from(bytes.as_slice()) else {
        bail!("salt must be exactly {SALT_LEN} bytes, got {}", bytes.len());
    };
    Ok(salt)
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();
    init_tracing(&args.log_level);

    match &args.command {
        Commands::Encrypt => {
            let cipher = load_config(&args)?.transport_cipher()?;
            let secret = auth::read_secret("Secret: ")?;
            println!("{}", cipher.encrypt(&secret)?);
        }
        Commands::Decrypt { payload } => {
            let cipher = load_config(&args)?.transport_cipher()?;
            let plaintext = cipher.try_decrypt(payload).context("decryption failed")?;
            println!("{plaintext}");
        }
        Commands::Derive { salt, kdf } => {
            let params = kdf.to_kdf_params()?;
            let salt = parse_salt(salt)?;
            let password = auth::read_secret("Password: ")?;
            let material = crypto::derive_key_and_iv(password.as_bytes(), &salt, params)?;

            println!("salt={}", hex::encode_upper(salt));
            println!("key={}", hex::encode_upper(material.key()));
            println!("iv ={}", hex::encode_upper(material.iv()));
        }
        Commands::LoginBody(body) => {
            let config = load_config(&args)?;
            let cipher = config.transport_cipher()?;
            let json = match body {
                LoginBody::User { username } => {
                    let password = auth::read_secret("Password: ")?;
                    let body = UserLogin::new(&cipher, username, &password, config.software())?;
                    serde_json::to_string(&body)?
                }
                LoginBody::System { token } => {
                    let secret = auth::read_secret("Secret: ")?;
                    let body = SystemLogin::new(&cipher, token, &secret, config.software())?;
                    serde_json::to_string(&body)?
                }
                LoginBody::SystemToken { title } => {
                    let secret = auth::read_new_secret_with_confirmation()?;
                    let body = SystemTokenRequest::new(&cipher, &secret, title)?;
                    serde_json::to_string(&body)?
                }
            };
            println!("{json}");
        }
    }

    Ok(())
}
