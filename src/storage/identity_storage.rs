use crate::member::MemberIdentity;
use crate::util::errors::Result;
use crate::wire::codec;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;

/// Storage for the local member identity so a restarted process can
/// present the logical id it had before.
pub trait IdentityStorage: Send {
    fn save(&mut self, identity: &MemberIdentity) -> Result<()>;
    fn load(&self) -> Result<Option<MemberIdentity>>;
    fn clear(&mut self) -> Result<()>;
}

/// File-based identity storage in the member wire format
pub struct FileIdentityStorage {
    data_dir: PathBuf,
}

impl FileIdentityStorage {
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        // Create data directory if it doesn't exist
        fs::create_dir_all(&data_dir)?;

        Ok(Self { data_dir })
    }

    pub fn identity_file_path(&self) -> PathBuf {
        self.data_dir.join("member.id")
    }
}

impl IdentityStorage for FileIdentityStorage {
    fn save(&mut self, identity: &MemberIdentity) -> Result<()> {
        let encoded = codec::encode_to_vec(identity)?;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.identity_file_path())?;

        file.write_all(&encoded)?;
        file.sync_all()?;

        tracing::debug!("Saved {} ({} bytes)", identity.summary(false), encoded.len());

        Ok(())
    }

    fn load(&self) -> Result<Option<MemberIdentity>> {
        let path = self.identity_file_path();

        if !path.exists() {
            return Ok(None);
        }

        let mut file = File::open(&path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;

        if buffer.is_empty() {
            return Ok(None);
        }

        let identity = codec::decode_from_slice(&buffer)?;

        tracing::info!(
            "Loaded persisted identity from {}: {}",
            path.display(),
            identity.summary(false)
        );

        Ok(Some(identity))
    }

    fn clear(&mut self) -> Result<()> {
        let path = self.identity_file_path();
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}
