//! Seed persistence: a party's seed lives in a single file in their home directory so that
//! repeated invocations of the CLI derive the same key without the seed being typed twice.
//!
//! Writes are atomic (write to a temp file in the same directory, then rename) so a crash
//! mid-write can never leave a half-written seed file behind, and the file is created
//! `0600` so other local users can't read it.

use std::{
    fs,
    io::{Read, Write},
    path::{Path, PathBuf},
};

use bitcoin::secp256k1::rand::{rngs::OsRng, RngCore};

use crate::error::EngineError;

const SEED_FILE_NAME: &str = ".oraclebond_seed";

pub fn default_seed_path() -> Result<PathBuf, EngineError> {
    let home = dirs::home_dir().ok_or_else(|| {
        EngineError::Protocol("could not determine home directory for seed file".to_string())
    })?;
    Ok(home.join(SEED_FILE_NAME))
}

/// Load the seed at `path`, creating a fresh random one if the file doesn't exist yet.
pub fn load_or_create(path: &Path) -> Result<String, EngineError> {
    match fs::File::open(path) {
        Ok(mut f) => {
            let mut seed = String::new();
            f.read_to_string(&mut seed)?;
            Ok(seed.trim().to_string())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let seed = random_seed();
            write_atomic(path, &seed)?;
            Ok(seed)
        }
        Err(e) => Err(e.into()),
    }
}

fn random_seed() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), EngineError> {
    let dir = path.parent().ok_or_else(|| {
        EngineError::Protocol("seed file path has no parent directory".to_string())
    })?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600))?;
    }

    tmp.persist(path)
        .map_err(|e| EngineError::IO(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_then_reloads_same_seed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SEED_FILE_NAME);

        let created = load_or_create(&path).unwrap();
        assert_eq!(created.len(), 32);

        let reloaded = load_or_create(&path).unwrap();
        assert_eq!(created, reloaded);
    }

    #[test]
    #[cfg(unix)]
    fn seed_file_is_0600() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SEED_FILE_NAME);
        load_or_create(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
