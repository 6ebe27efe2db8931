//! Request-level operations over the entity store and the blob store.
//!
//! Each operation validates its input in a fixed order and returns the first
//! failure: required fields, referenced rows, then uniqueness. Image bytes are
//! only written once all of those checks have passed.

use lexis_blob::{BlobStore, Upload};
use lexis_db::{
    DbError, Language, LexisDb, Pack, PackId, PackKey, Vocab, VocabFilter, VocabKey,
};
use rand::Rng;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{LexisConfig, DEFAULT_UPLOAD_TIMEOUT};
use crate::error::{LexisError, Result};
use crate::flashcards::{self, Flashcard, FlashcardLimit};

/// Fields of a pack creation request.
#[derive(Debug, Clone, Default)]
pub struct NewPack {
    pub name: String,
    pub language_id: String,
    pub owner_id: String,
    pub public: bool,
}

/// Fields of a vocab creation request.
#[derive(Debug, Default)]
pub struct NewVocab {
    pub name: String,
    /// Required; dropped at write time when the store has no translation column
    pub translation: Option<String>,
    pub pack_id: String,
    pub image: Option<Upload>,
}

/// Parameters of a flashcard draw.
#[derive(Debug, Clone, Default)]
pub struct FlashcardRequest {
    pub owner_id: String,
    pub language_id: String,
    /// Restrict the draw to these packs; empty means all of the owner's packs
    pub pack_ids: Vec<String>,
    pub limit: FlashcardLimit,
}

/// A pack with its vocabs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackDetails {
    pub pack: Pack,
    pub vocabs: Vec<Vocab>,
}

/// Lexis operations over a database and an upload root.
#[derive(Clone)]
pub struct Lexis {
    db: LexisDb,
    blobs: BlobStore,
    upload_timeout: Duration,
}

impl Lexis {
    pub fn new(db: LexisDb, blobs: BlobStore) -> Self {
        Self {
            db,
            blobs,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
        }
    }

    /// Budget for streaming one image upload to disk.
    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }

    /// Verify the upload root and open the database described by `config`.
    pub async fn open(config: &LexisConfig) -> Result<Self> {
        let blobs = config
            .blob_store()
            .ok_or_else(|| LexisError::invalid_input("UPLOAD_DIR must be set"))?;
        let path = config.database_path();

        let prepare = {
            let blobs = blobs.clone();
            let path = path.clone();
            tokio::task::spawn_blocking(move || prepare_dirs(&blobs, &path))
        };
        prepare
            .await
            .map_err(|e| LexisError::internal("startup check failed").with_source(e))??;

        let db = LexisDb::connect(config.db_config()).await?;

        info!(upload_dir = %blobs.root().display(), database = %path.display(), "Lexis ready");
        Ok(Self::new(db, blobs).with_upload_timeout(config.upload_timeout()))
    }

    pub fn db(&self) -> &LexisDb {
        &self.db
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub async fn list_languages(&self) -> Vec<Language> {
        self.db.list_languages().await
    }

    pub async fn list_packs(&self) -> Result<Vec<Pack>> {
        Ok(self.db.list_packs().await?)
    }

    pub async fn pack_details(&self, id: &str) -> Result<PackDetails> {
        let id = id.trim();
        if id.is_empty() {
            return Err(LexisError::invalid_input("missing pack id"));
        }
        // An id that does not parse cannot name a stored pack.
        let pack_id = PackId::parse(id).map_err(|_| LexisError::unknown_pack(id))?;
        let pack = self
            .db
            .get_pack(&pack_id)
            .await?
            .ok_or_else(|| LexisError::unknown_pack(id))?;
        let vocabs = self.db.list_vocabs_by_pack(&pack.id).await?;
        Ok(PackDetails { pack, vocabs })
    }

    pub async fn create_pack(&self, request: NewPack) -> Result<Pack> {
        let name = request.name.trim();
        let language_id = request.language_id.trim();
        let owner_id = request.owner_id.trim();

        let missing: Vec<&str> = [("name", name), ("lang_id", language_id), ("user_id", owner_id)]
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(field, _)| field)
            .collect();
        if !missing.is_empty() {
            return Err(LexisError::missing_fields(&missing));
        }

        self.require_language(language_id).await?;

        let key = PackKey::derive(owner_id, language_id, name);
        if self.db.pack_exists(&key).await? {
            return Err(duplicate_pack(name, owner_id, language_id));
        }

        let pack = Pack::new(name, language_id, owner_id).with_public(request.public);
        match self.db.create_pack(&pack).await {
            Ok(()) => Ok(pack),
            Err(DbError::Duplicate(_)) => Err(duplicate_pack(name, owner_id, language_id)),
            Err(DbError::NotFound(_)) => Err(LexisError::unknown_language(language_id)),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn create_vocab(&self, request: NewVocab) -> Result<Vocab> {
        let NewVocab {
            name,
            translation,
            pack_id,
            image,
        } = request;
        let name = name.trim().to_string();
        let pack_id = pack_id.trim().to_string();
        let translation = translation
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        let mut missing = Vec::new();
        if pack_id.is_empty() {
            missing.push("pack_id");
        }
        if image.is_none() {
            missing.push("image");
        }
        if name.is_empty() {
            missing.push("name");
        }
        if translation.is_empty() {
            missing.push("translation");
        }
        let Some(upload) = image.filter(|_| missing.is_empty()) else {
            return Err(LexisError::missing_fields(&missing));
        };

        let parsed = PackId::parse(&pack_id)
            .map_err(|e| LexisError::invalid_input(e.to_string()))?;
        let pack = self
            .db
            .get_pack(&parsed)
            .await?
            .ok_or_else(|| LexisError::unknown_pack(&pack_id))?;

        let key = VocabKey::derive(pack.id.as_str(), &name);
        if self.db.vocab_exists(&key).await? {
            return Err(duplicate_vocab(&name));
        }

        let image = self.store_image(&name, upload).await?;

        let vocab = Vocab::new(pack.id, name, image, Some(translation));
        match self.db.create_vocab(&vocab).await {
            Ok(()) => Ok(vocab),
            Err(DbError::Duplicate(_)) => Err(duplicate_vocab(&vocab.name)),
            Err(DbError::NotFound(_)) => Err(LexisError::unknown_pack(&pack_id)),
            Err(err) => Err(err.into()),
        }
    }

    /// Write the upload on a blocking worker, bounded by the upload timeout.
    ///
    /// On expiry the worker is left to finish; its file is never referenced.
    async fn store_image(&self, name: &str, upload: Upload) -> Result<String> {
        let blobs = self.blobs.clone();
        let logical_name = name.to_string();
        let task = tokio::task::spawn_blocking(move || blobs.save(&logical_name, upload));

        match tokio::time::timeout(self.upload_timeout, task).await {
            Ok(Ok(saved)) => Ok(saved?.reference),
            Ok(Err(join_err)) => Err(LexisError::internal("image writer failed").with_source(join_err)),
            Err(_) => {
                warn!(timeout = ?self.upload_timeout, "Image write timed out");
                Err(LexisError::unavailable("timed out saving file"))
            }
        }
    }

    /// Draw flashcards with a thread-local RNG.
    pub async fn flashcards(&self, request: &FlashcardRequest) -> Result<Vec<Flashcard>> {
        let vocabs = self.flashcard_candidates(request).await?;
        let drawn = flashcards::sample(vocabs, request.limit, &mut rand::thread_rng());
        Ok(flashcards::label(&self.db, drawn).await?)
    }

    /// Draw flashcards with a caller-supplied RNG.
    pub async fn flashcards_with_rng<R: Rng + Send>(
        &self,
        request: &FlashcardRequest,
        rng: &mut R,
    ) -> Result<Vec<Flashcard>> {
        let vocabs = self.flashcard_candidates(request).await?;
        let drawn = flashcards::sample(vocabs, request.limit, rng);
        Ok(flashcards::label(&self.db, drawn).await?)
    }

    async fn flashcard_candidates(&self, request: &FlashcardRequest) -> Result<Vec<Vocab>> {
        let owner_id = request.owner_id.trim();
        let language_id = request.language_id.trim();

        let mut missing = Vec::new();
        if owner_id.is_empty() {
            missing.push("user_id");
        }
        if language_id.is_empty() {
            missing.push("lang_id");
        }
        if !missing.is_empty() {
            return Err(LexisError::missing_fields(&missing));
        }

        self.require_language(language_id).await?;

        let mut pack_ids = Vec::new();
        for raw in request.pack_ids.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
            let id = PackId::parse(raw).map_err(|_| LexisError::unknown_pack(raw))?;
            if self.db.get_pack(&id).await?.is_none() {
                return Err(LexisError::unknown_pack(raw));
            }
            pack_ids.push(id);
        }

        let filter = VocabFilter::new(owner_id, language_id).with_packs(pack_ids);
        Ok(self.db.list_vocabs(&filter).await?)
    }

    /// Remove every pack and vocab. Stored images are kept.
    pub async fn reset(&self) -> Result<()> {
        Ok(self.db.reset().await?)
    }

    async fn require_language(&self, language_id: &str) -> Result<()> {
        match self.db.get_language(language_id).await? {
            Some(_) => Ok(()),
            None => Err(LexisError::unknown_language(language_id)),
        }
    }
}

/// Check the upload root and create the database directory.
fn prepare_dirs(blobs: &BlobStore, database: &Path) -> Result<()> {
    blobs.verify_root().map_err(|e| {
        LexisError::unavailable(format!("upload dir unusable: {}", e)).with_source(e)
    })?;
    if let Some(parent) = database.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            LexisError::unavailable(format!(
                "cannot create database directory {}",
                parent.display()
            ))
            .with_source(e)
        })?;
    }
    Ok(())
}

fn duplicate_pack(name: &str, owner_id: &str, language_id: &str) -> LexisError {
    LexisError::duplicate(format!(
        "pack {:?} already exists for user {:?} and language {:?}",
        name, owner_id, language_id
    ))
}

fn duplicate_vocab(name: &str) -> LexisError {
    LexisError::duplicate(format!("vocab {:?} already exists in this pack", name))
}
