//! Session cookie settings resolved from the environment.
//!
//! Release builds refuse to start on missing or malformed settings. Debug
//! builds log a warning and fall back to development defaults so a fresh
//! checkout runs without secrets on disk.

pub mod fingerprint;

use std::path::PathBuf;

use actix_web::cookie::{Key, SameSite};
use mockable::Env;
use tracing::warn;
use zeroize::Zeroizing;

/// Default location of the session signing key.
pub const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
/// Minimum key file length in bytes.
pub const SESSION_KEY_MIN_LEN: usize = 64;
/// Overrides [`SESSION_KEY_DEFAULT_PATH`].
pub const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";
/// Whether the cookie carries the `Secure` attribute.
pub const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
/// `SameSite` policy: `Strict`, `Lax` or `None`.
pub const SAMESITE_ENV: &str = "SESSION_SAMESITE";
/// Permit a generated key when the key file is unreadable.
pub const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";

const FLAG_EXPECTED: &str = "1|0|true|false|yes|no|on|off";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// Build profile the settings are validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Lenient: problems are logged and defaulted.
    Debug,
    /// Strict: problems abort start-up.
    Release,
}

impl BuildMode {
    /// Mode of the running binary.
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }

    fn default_same_site(self) -> SameSite {
        if self.is_debug() {
            SameSite::Lax
        } else {
            SameSite::Strict
        }
    }
}

/// Resolved cookie session settings.
#[derive(Clone)]
pub struct SessionSettings {
    /// Signing and encryption key.
    pub key: Key,
    /// `Secure` cookie attribute.
    pub cookie_secure: bool,
    /// `SameSite` cookie attribute.
    pub same_site: SameSite,
}

impl std::fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSettings")
            .field("key", &fingerprint::key_fingerprint(&self.key))
            .field("cookie_secure", &self.cookie_secure)
            .field("same_site", &self.same_site)
            .finish()
    }
}

/// Problems found while resolving [`SessionSettings`].
#[derive(Debug, thiserror::Error)]
pub enum SessionConfigError {
    /// A variable required in release builds is unset.
    #[error("{name} must be set")]
    MissingEnv {
        /// Variable name.
        name: &'static str,
    },
    /// A variable holds an unrecognised value.
    #[error("{name}={value:?} is invalid; expected {expected}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Rejected value.
        value: String,
        /// Accepted spellings.
        expected: &'static str,
    },
    /// The key file could not be read.
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        /// Key file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The key file is shorter than [`SESSION_KEY_MIN_LEN`].
    #[error("session key at {path} is {length} bytes; at least {min_len} required")]
    KeyTooShort {
        /// Key file path.
        path: PathBuf,
        /// Actual length.
        length: usize,
        /// Required length.
        min_len: usize,
    },
    /// Browsers drop `SameSite=None` cookies without `Secure`.
    #[error("SESSION_SAMESITE=None requires SESSION_COOKIE_SECURE=1")]
    InsecureSameSiteNone,
    /// Release builds must load a persistent key.
    #[error("SESSION_ALLOW_EPHEMERAL must not be enabled in release builds")]
    EphemeralNotAllowed,
}

/// Resolve session settings from `env` for `mode`.
///
/// # Examples
///
/// ```
/// use bookmark_backend::inbound::http::session_config::{
///     BuildMode, session_settings_from_env,
/// };
/// use mockable::MockEnv;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|_| None);
///
/// let settings = session_settings_from_env(&env, BuildMode::Debug).unwrap();
/// assert!(settings.cookie_secure);
/// ```
///
/// # Errors
///
/// In release builds any missing or invalid value is an error. In debug
/// builds only contradictory settings are.
pub fn session_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let cookie_secure = tolerate(mode, true, required_flag(env, COOKIE_SECURE_ENV))?;
    let same_site = tolerate(mode, mode.default_same_site(), same_site(env, mode))?;
    if same_site == SameSite::None && !cookie_secure {
        return Err(SessionConfigError::InsecureSameSiteNone);
    }

    let allow_ephemeral = tolerate(
        mode,
        true,
        flag(env, ALLOW_EPHEMERAL_ENV).map(|value| value.unwrap_or(mode.is_debug())),
    )?;
    if allow_ephemeral && !mode.is_debug() {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }

    let path = env
        .string(KEY_FILE_ENV)
        .map_or_else(|| PathBuf::from(SESSION_KEY_DEFAULT_PATH), PathBuf::from);
    let key = match read_key(path) {
        Ok(key) => key,
        Err(error) if allow_ephemeral => {
            warn!(%error, "using an ephemeral session key; sessions end on restart");
            Key::generate()
        }
        Err(error) => return Err(error),
    };

    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

/// Keep `result` in release builds; in debug builds replace an error with
/// `fallback` after logging it.
fn tolerate<T>(
    mode: BuildMode,
    fallback: T,
    result: Result<T, SessionConfigError>,
) -> Result<T, SessionConfigError> {
    match result {
        Err(error) if mode.is_debug() => {
            warn!(%error, "session setting defaulted for development");
            Ok(fallback)
        }
        other => other,
    }
}

fn flag<E: Env>(env: &E, name: &'static str) -> Result<Option<bool>, SessionConfigError> {
    let Some(raw) = env.string(name) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(SessionConfigError::InvalidEnv {
            name,
            value: raw,
            expected: FLAG_EXPECTED,
        }),
    }
}

fn required_flag<E: Env>(env: &E, name: &'static str) -> Result<bool, SessionConfigError> {
    flag(env, name)?.ok_or(SessionConfigError::MissingEnv { name })
}

fn same_site<E: Env>(env: &E, mode: BuildMode) -> Result<SameSite, SessionConfigError> {
    let Some(raw) = env.string(SAMESITE_ENV) else {
        return Ok(mode.default_same_site());
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "strict" => Ok(SameSite::Strict),
        "lax" => Ok(SameSite::Lax),
        "none" => Ok(SameSite::None),
        _ => Err(SessionConfigError::InvalidEnv {
            name: SAMESITE_ENV,
            value: raw,
            expected: SAMESITE_EXPECTED,
        }),
    }
}

fn read_key(path: PathBuf) -> Result<Key, SessionConfigError> {
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => Zeroizing::new(bytes),
        Err(source) => return Err(SessionConfigError::KeyRead { path, source }),
    };
    if bytes.len() < SESSION_KEY_MIN_LEN {
        return Err(SessionConfigError::KeyTooShort {
            path,
            length: bytes.len(),
            min_len: SESSION_KEY_MIN_LEN,
        });
    }
    Ok(Key::derive_from(&bytes))
}
