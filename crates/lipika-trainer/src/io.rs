//! JSON persistence for trained models.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use lipika_core::{LanguagePair, LipikaError, ModelLoader, TransliterationModel};
use tracing::info;

/// Write a model as JSON, creating parent directories as needed.
pub fn save_model<P: AsRef<Path>>(model: &TransliterationModel, path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating model directory {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, model)
        .with_context(|| format!("serializing model to {}", path.display()))?;
    writer.flush()?;
    info!(path = %path.display(), "model saved");
    Ok(())
}

/// Read a model written by [`save_model`].
pub fn load_model<P: AsRef<Path>>(path: P) -> anyhow::Result<TransliterationModel> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening model {}", path.display()))?;
    let model = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing model {}", path.display()))?;
    Ok(model)
}

/// Loads `{dir}/{source}-{target}.json` for a language pair.
#[derive(Debug, Clone)]
pub struct JsonModelLoader {
    dir: PathBuf,
}

impl JsonModelLoader {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// File holding the model for `pair`.
    pub fn model_path(&self, pair: &LanguagePair) -> PathBuf {
        self.dir.join(format!("{pair}.json"))
    }
}

impl ModelLoader for JsonModelLoader {
    fn load(&self, pair: &LanguagePair) -> lipika_core::Result<TransliterationModel> {
        load_model(self.model_path(pair)).map_err(|e| LipikaError::ModelLoad(format!("{e:#}")))
    }
}
