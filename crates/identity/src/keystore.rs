//! Load-or-create persistence of witness keys.
//!
//! One file per witness identity holding the raw 32-byte Ed25519 secret.
//! An existing file is never overwritten; a file that exists but cannot be
//! used is reported as [`IdentityError::KeyStore`].

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::Path;
use tracing::{info, warn};
use zeroize::Zeroize;

use mirrorwitness_crypto::signing::{generate_secret_key, PayloadSigner, SECRET_KEY_LEN};

use crate::error::{IdentityError, IdentityResult};
use crate::keypair::WitnessKeypair;

/// Load the key at `path`, creating it first if no file exists.
pub fn load_or_create(witness_id: u32, path: &Path) -> IdentityResult<WitnessKeypair> {
    match load(witness_id, path) {
        Ok(keypair) => Ok(keypair),
        Err(LoadError::Missing) => match create(witness_id, path) {
            Ok(keypair) => Ok(keypair),
            // Lost a creation race with another process; use its key
            Err(CreateError::Exists) => load(witness_id, path).map_err(|e| e.into_identity(path)),
            Err(CreateError::Failed(e)) => Err(e),
        },
        Err(e) => Err(e.into_identity(path)),
    }
}

enum LoadError {
    Missing,
    Unusable(String),
}

impl LoadError {
    fn into_identity(self, path: &Path) -> IdentityError {
        match self {
            LoadError::Missing => IdentityError::key_store(path, "key file disappeared"),
            LoadError::Unusable(reason) => IdentityError::key_store(path, reason),
        }
    }
}

enum CreateError {
    Exists,
    Failed(IdentityError),
}

fn load(witness_id: u32, path: &Path) -> Result<WitnessKeypair, LoadError> {
    let mut bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(LoadError::Missing),
        Err(e) => return Err(LoadError::Unusable(format!("unreadable: {e}"))),
    };

    if bytes.len() != SECRET_KEY_LEN {
        let len = bytes.len();
        bytes.zeroize();
        return Err(LoadError::Unusable(format!(
            "corrupt key file: {len} bytes (expected {SECRET_KEY_LEN})"
        )));
    }

    let signer = PayloadSigner::from_key(&bytes);
    bytes.zeroize();
    let signer = signer.map_err(|e| LoadError::Unusable(e.to_string()))?;

    info!(
        witness_id,
        public_key_id = signer.public_key_id(),
        path = %path.display(),
        "Loaded witness key"
    );
    Ok(WitnessKeypair::new(witness_id, signer))
}

/// Write `secret` through `out`, removing `path` if anything fails.
///
/// A half-written file would otherwise look like a corrupt identity on
/// every later start.
fn persist_secret<W: Write>(
    path: &Path,
    mut out: W,
    secret: &[u8],
    sync: impl FnOnce(&W) -> io::Result<()>,
) -> io::Result<()> {
    let result = out
        .write_all(secret)
        .and_then(|_| out.flush())
        .and_then(|_| sync(&out));
    drop(out);
    if result.is_err() {
        if let Err(e) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "Could not remove partial key file");
        }
    }
    result
}

fn create(witness_id: u32, path: &Path) -> Result<WitnessKeypair, CreateError> {
    let fail = |reason: String| CreateError::Failed(IdentityError::key_store(path, reason));

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| fail(format!("cannot create directory: {e}")))?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let file = match options.open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Err(CreateError::Exists),
        Err(e) => return Err(fail(format!("cannot create key file: {e}"))),
    };

    let mut secret = generate_secret_key();
    let written = persist_secret(path, file, &secret, File::sync_all);
    let signer = PayloadSigner::from_key(&secret);
    secret.zeroize();

    written.map_err(|e| fail(format!("cannot write key file: {e}")))?;
    let signer = signer.map_err(|e| CreateError::Failed(e.into()))?;

    info!(
        witness_id,
        public_key_id = signer.public_key_id(),
        path = %path.display(),
        "Generated new witness keypair"
    );
    Ok(WitnessKeypair::new(witness_id, signer))
}
