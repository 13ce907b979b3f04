use {
    anyhow::{Result, bail},
    fs_err::{create_dir_all, remove_file, rename},
    ownproof_protocol::Tag,
    std::{
        io::{self, Write},
        path::{Path, PathBuf},
    },
    tempfile::NamedTempFile,
};

/// Content-addressed file storage keyed by tag.
#[derive(Debug)]
pub struct Storage {
    root: PathBuf,
    tmp: PathBuf,
}

fn storage_paths(root: &Path, tag: &Tag) -> (PathBuf, PathBuf) {
    let name = tag.to_string();
    let dir = root
        .join(name.get(0..2).unwrap_or_default())
        .join(name.get(2..4).unwrap_or_default());
    let file_path = dir.join(name);
    (dir, file_path)
}

impl Storage {
    pub fn new(root: PathBuf) -> Result<Self> {
        if !root.try_exists()? {
            bail!("storage root {} doesn't exist", root.display());
        }

        let tmp = root.join("tmp");
        create_dir_all(&tmp)?;

        Ok(Self { root, tmp })
    }

    pub fn create_file(&self) -> Result<NamedTempFile> {
        Ok(NamedTempFile::new_in(&self.tmp)?)
    }

    /// Moves a fully written temporary file to its final location.
    pub fn commit_file(&self, mut file: NamedTempFile, tag: &Tag) -> Result<()> {
        file.flush()?;
        let (dir, new_file_path) = storage_paths(&self.root, tag);
        create_dir_all(dir)?;
        let (_, old_path) = file.keep()?;
        if let Err(err) = rename(&old_path, new_file_path) {
            let _ = remove_file(&old_path);
            return Err(err.into());
        }
        Ok(())
    }

    pub fn contains(&self, tag: &Tag) -> Result<bool> {
        let (_, path) = storage_paths(&self.root, tag);
        Ok(path.try_exists()?)
    }

    pub fn read(&self, tag: &Tag) -> io::Result<Vec<u8>> {
        let (_, path) = storage_paths(&self.root, tag);
        fs_err::read(path)
    }
}
