use std::fs;
use std::path::{Path, PathBuf};

use relay_types::AccountId;

use crate::error::{CryptoError, CryptoResult};
use crate::signer::{SigningKey, VerifyingKey};

const PRIVATE_EXT: &str = "priv";
const PUBLIC_EXT: &str = "pub";

/// An account's key pair as stored on disk.
///
/// Keys live next to each other as `<dir>/<account>.priv` and
/// `<dir>/<account>.pub`, each holding 32 bytes of hex.
#[derive(Debug)]
pub struct KeyPair {
    signing: SigningKey,
    verifying: VerifyingKey,
}

impl KeyPair {
    pub fn new(signing: SigningKey) -> Self {
        let verifying = signing.verifying_key();
        Self { signing, verifying }
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.verifying
    }

    pub fn private_key_path(dir: &Path, account: &AccountId) -> PathBuf {
        dir.join(format!("{account}.{PRIVATE_EXT}"))
    }

    pub fn public_key_path(dir: &Path, account: &AccountId) -> PathBuf {
        dir.join(format!("{account}.{PUBLIC_EXT}"))
    }

    /// Load an account's key pair and check the halves belong together.
    pub fn load(dir: &Path, account: &AccountId) -> CryptoResult<Self> {
        let priv_path = Self::private_key_path(dir, account);
        let pub_path = Self::public_key_path(dir, account);

        let signing = SigningKey::from_bytes(read_hex32(&priv_path)?);
        let verifying = VerifyingKey::from_bytes(read_hex32(&pub_path)?)?;
        if signing.verifying_key() != verifying {
            return Err(CryptoError::KeyMismatch { path: pub_path });
        }
        Ok(Self { signing, verifying })
    }

    /// Write both key files, creating `dir` if needed.
    ///
    /// The private key file is made owner-only on Unix.
    pub fn store(&self, dir: &Path, account: &AccountId) -> CryptoResult<()> {
        fs::create_dir_all(dir).map_err(|source| CryptoError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let priv_path = Self::private_key_path(dir, account);
        write_file(&priv_path, &hex::encode(self.signing.to_bytes()))?;
        restrict_permissions(&priv_path)?;
        write_file(
            &Self::public_key_path(dir, account),
            &self.verifying.to_hex(),
        )
    }
}

fn read_hex32(path: &Path) -> CryptoResult<[u8; 32]> {
    let text = fs::read_to_string(path).map_err(|source| CryptoError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bytes = hex::decode(text.trim()).map_err(|e| CryptoError::InvalidHex {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::InvalidHex {
            path: path.to_path_buf(),
            reason: format!("expected 32 bytes, got {}", bytes.len()),
        })
}

fn write_file(path: &Path, contents: &str) -> CryptoResult<()> {
    fs::write(path, contents).map_err(|source| CryptoError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> CryptoResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|source| {
        CryptoError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> CryptoResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn account() -> AccountId {
        "relay@notary".parse().unwrap()
    }

    fn pair(seed: u64) -> KeyPair {
        KeyPair::new(SigningKey::generate_with(&mut StdRng::seed_from_u64(seed)))
    }

    #[test]
    fn store_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let kp = pair(1);
        kp.store(dir.path(), &account()).unwrap();

        let loaded = KeyPair::load(dir.path(), &account()).unwrap();
        assert_eq!(loaded.verifying_key(), kp.verifying_key());
        assert!(dir.path().join("relay@notary.priv").exists());
        assert!(dir.path().join("relay@notary.pub").exists());
    }

    #[test]
    fn load_tolerates_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let kp = pair(2);
        fs::write(
            KeyPair::private_key_path(dir.path(), &account()),
            format!("{}\n", hex::encode(kp.signing_key().to_bytes())),
        )
        .unwrap();
        fs::write(
            KeyPair::public_key_path(dir.path(), &account()),
            format!("{}\n", kp.verifying_key().to_hex()),
        )
        .unwrap();
        assert!(KeyPair::load(dir.path(), &account()).is_ok());
    }

    #[test]
    fn mismatched_halves_rejected() {
        let dir = tempfile::tempdir().unwrap();
        pair(3).store(dir.path(), &account()).unwrap();
        fs::write(
            KeyPair::public_key_path(dir.path(), &account()),
            pair(4).verifying_key().to_hex(),
        )
        .unwrap();
        let err = KeyPair::load(dir.path(), &account()).unwrap_err();
        assert!(matches!(err, CryptoError::KeyMismatch { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = KeyPair::load(dir.path(), &account()).unwrap_err();
        assert!(matches!(err, CryptoError::Io { .. }));
    }

    #[test]
    fn short_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        pair(5).store(dir.path(), &account()).unwrap();
        fs::write(KeyPair::private_key_path(dir.path(), &account()), "abcd").unwrap();
        let err = KeyPair::load(dir.path(), &account()).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidHex { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn private_key_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        pair(6).store(dir.path(), &account()).unwrap();
        let mode = fs::metadata(KeyPair::private_key_path(dir.path(), &account()))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
