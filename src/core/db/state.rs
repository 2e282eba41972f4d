use sqlx::{
    Sqlite,
    pool::PoolConnection,
    sqlite::{
        SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
    },
};
use tempdir::TempDir;
use tokio::{
    fs as async_fs,
    sync::{RwLock, RwLockReadGuard},
};

use std::{
    fs::{self, File},
    ops::{Deref, DerefMut},
    path::{Path, PathBuf},
};

use anyhow::Context;
use uuid::Uuid;

use tar::{Archive, Builder};
use zstd::stream::{read::Decoder as ZstdDecoder, write::Encoder as ZstdEncoder};

const DB_FILE_NAME: &str = "brochure.db";
const ATTACHMENT_DIR_NAME: &str = "attachments";

/// A brochure studio file is a tar.zst archive holding the SQLite database
/// plus an attachments directory. While open, it is unpacked into a scratch
/// working directory; save_studio checkpoints the WAL and re-packs it.
pub(super) struct StudioState {
    studio_file: PathBuf,
    working_dir: TempDir,
    pool: RwLock<SqlitePool>,
}

impl std::fmt::Debug for StudioState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudioState")
            .field("studio_file", &self.studio_file)
            .field("working_dir", &self.working_dir.path())
            .finish()
    }
}

impl StudioState {
    /// Acquire a pooled connection and hold the pool read lock for the entire
    /// lifetime of the returned guard.
    pub(super) async fn conn(&self) -> anyhow::Result<DbConnGuard<'_>> {
        let pool_guard = self.pool.read().await;

        // The connection must be acquired while the read lock is held; the
        // lock stays held because the guard stores it.
        let conn = pool_guard.acquire().await?;

        Ok(DbConnGuard {
            _pool_guard: pool_guard,
            conn,
        })
    }

    /// Copy a file into the attachment directory under a fresh UUID name and
    /// return the opaque reference. The store never inspects the bytes.
    pub(super) async fn store_attachment<P: AsRef<Path>>(
        &self,
        source: P,
    ) -> anyhow::Result<String> {
        let attachment_dir = self.working_dir.path().join(ATTACHMENT_DIR_NAME);

        let reference = match source.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        let dest_path = attachment_dir.join(&reference);
        async_fs::copy(&source, &dest_path).await.with_context(|| {
            format!(
                "Failed to copy attachment from {:?} to {:?}",
                source.as_ref(),
                dest_path
            )
        })?;
        Ok(reference)
    }

    /// Resolve an attachment reference to its on-disk path inside the open
    /// working directory. Only valid while the studio stays open.
    pub(super) fn attachment_path(&self, reference: &str) -> PathBuf {
        self.working_dir
            .path()
            .join(ATTACHMENT_DIR_NAME)
            .join(reference)
    }

    /// Create a tar.zst archive from the working directory.
    fn save_tar_zstd(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.studio_file.parent() {
            fs::create_dir_all(parent)?;
        }

        let out = File::create(&self.studio_file)
            .with_context(|| format!("Failed to create studio archive {:?}", self.studio_file))?;

        let encoder = ZstdEncoder::new(out, 3)
            .with_context(|| format!("Failed to create zstd encoder for {:?}", self.studio_file))?;

        let mut tar = Builder::new(encoder);

        tar.append_dir_all(".", self.working_dir.path())
            .with_context(|| format!("Failed to add {:?} to tar", self.working_dir.path()))?;

        let encoder = tar
            .into_inner()
            .with_context(|| format!("Failed to finalize tar for {:?}", self.studio_file))?;

        encoder
            .finish()
            .with_context(|| format!("Failed to finalize zstd stream for {:?}", self.studio_file))?;

        Ok(())
    }

    /// Exclusive close+pack:
    /// - waits for all in-flight queries (takes the pool WRITE lock)
    /// - checkpoints WAL so brochure.db is current
    /// - closes the pool to release file handles
    /// - archives the working dir
    pub(super) async fn save_studio(&self) -> anyhow::Result<()> {
        self.internal_close_and_pack(true).await
    }

    pub(super) async fn internal_close_and_pack(&self, reopen: bool) -> anyhow::Result<()> {
        // Exclusive write lock for the whole operation: no queries may run
        // while we checkpoint, close and pack.
        let mut pool_guard = self.pool.write().await;

        // Flush WAL into the main DB and truncate it
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE);")
            .execute(&*pool_guard)
            .await?;

        // Release file handles (important on Windows). After this, any DB use
        // fails until a new pool is opened.
        pool_guard.close().await;

        self.save_tar_zstd()?;

        if reopen {
            let db_file = self.working_dir.path().join(DB_FILE_NAME);
            let pool = open_pool(&db_file).await?;
            *pool_guard = pool;
        }
        Ok(())
    }

    pub(super) async fn new<P: AsRef<Path>>(studio_file: P) -> anyhow::Result<Self> {
        let studio_file = studio_file.as_ref().to_path_buf();

        // Ensure the studio file exists; if not, create an empty tar.zst at
        // that location (the parent directory must already exist).
        if !studio_file.is_file() {
            if studio_file.parent().map(|p| p.is_dir()).unwrap_or(false) {
                let out = File::create(&studio_file).with_context(|| {
                    format!("Failed to create studio archive {:?}", studio_file)
                })?;

                let encoder = ZstdEncoder::new(out, 3).with_context(|| {
                    format!("Failed to create zstd encoder for {:?}", studio_file)
                })?;

                let tar = Builder::new(encoder);
                let encoder = tar
                    .into_inner()
                    .with_context(|| format!("Failed to finalize empty tar {:?}", studio_file))?;

                encoder.finish().with_context(|| {
                    format!("Failed to finalize empty zstd stream {:?}", studio_file)
                })?;
            } else {
                anyhow::bail!("Studio file parent does not exist: {:?}", studio_file);
            }
        }

        let working_dir = TempDir::new("brochurekit_studio")?;

        // Unpack the archive into the working dir.
        {
            let f = File::open(&studio_file)
                .with_context(|| format!("Failed to open studio archive {:?}", studio_file))?;

            let decoder = ZstdDecoder::new(f)
                .with_context(|| format!("Invalid zstd stream in {:?}", studio_file))?;

            let mut archive = Archive::new(decoder);
            archive.unpack(working_dir.path()).with_context(|| {
                format!(
                    "Failed to extract archive {:?} into {:?}",
                    studio_file,
                    working_dir.path()
                )
            })?;
        }

        // Studio layout expectations
        let db_file = working_dir.path().join(DB_FILE_NAME);
        let attachment_dir = working_dir.path().join(ATTACHMENT_DIR_NAME);

        let db_exists = db_file.is_file();
        let attachments_exist = attachment_dir.is_dir();

        match (db_exists, attachments_exist) {
            (true, true) => {}
            (false, false) => {
                fs::create_dir_all(&attachment_dir)?;
                File::create(&db_file)?;
            }
            (true, false) => anyhow::bail!(
                "Corrupt studio: database exists ({:?}) but attachment dir missing ({:?})",
                db_file,
                attachment_dir
            ),
            (false, true) => anyhow::bail!(
                "Corrupt studio: attachment dir exists ({:?}) but database missing ({:?})",
                attachment_dir,
                db_file
            ),
        }

        let pool = open_pool(&db_file).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self {
            studio_file,
            working_dir,
            pool: RwLock::new(pool),
        })
    }
}

async fn open_pool(db_file: &Path) -> anyhow::Result<SqlitePool> {
    let connect_opts = SqliteConnectOptions::new()
        .filename(db_file)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_opts)
        .await?;
    Ok(pool)
}

pub struct DbConnGuard<'a> {
    _pool_guard: RwLockReadGuard<'a, SqlitePool>,
    conn: PoolConnection<Sqlite>,
}

impl<'a> Deref for DbConnGuard<'a> {
    type Target = PoolConnection<Sqlite>;
    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl<'a> DerefMut for DbConnGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

impl Drop for StudioState {
    fn drop(&mut self) {
        // Inside a runtime we cannot block_on; callers must save_studio()
        // explicitly before dropping. Outside a runtime, spin one up so the
        // studio file still reflects the final state.
        if tokio::runtime::Handle::try_current().is_ok() {
            return;
        }
        let result = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt.block_on(async { self.internal_close_and_pack(false).await }),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            tracing::warn!("failed to save studio on drop: {e:#}");
        }
    }
}
