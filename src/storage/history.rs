//! SQLite-backed scoring history. URLs and feature payloads are stored AES-GCM
//! encrypted; a SHA-256 fingerprint of the URL allows lookups without decrypting.

use crate::error::StoreError;
use crate::features::FeatureMap;
use crate::predict::{Confidence, Prediction};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use rand::RngCore;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

fn derive_key(seed: &[u8]) -> [u8; KEY_LEN] {
    use ring::digest;
    let mut out = [0u8; KEY_LEN];
    let h = digest::digest(&digest::SHA256, seed);
    out[..h.as_ref().len().min(KEY_LEN)].copy_from_slice(h.as_ref());
    out
}

fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<String, StoreError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| StoreError::Crypto)?;
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    let ciphertext = cipher.encrypt((&nonce).into(), plaintext)?;
    let mut out = nonce.to_vec();
    out.extend(ciphertext);
    Ok(BASE64.encode(&out))
}

fn decrypt(key: &[u8; KEY_LEN], encoded: &str) -> Result<Vec<u8>, StoreError> {
    let raw = BASE64.decode(encoded)?;
    if raw.len() < NONCE_LEN {
        return Err(StoreError::Encoding("payload too short".into()));
    }
    let (nonce, ct) = raw.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| StoreError::Crypto)?;
    Ok(cipher.decrypt(nonce.into(), ct)?)
}

fn fingerprint(url: &str) -> String {
    format!("{:x}", Sha256::digest(url.as_bytes()))
}

/// Stored scoring event, decrypted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub scan_id: String,
    pub url: String,
    pub model_used: String,
    pub prediction: i64,
    pub confidence: Confidence,
    pub features: FeatureMap,
    pub created_at: DateTime<Utc>,
}

/// One page of history, oldest first
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    pub items: Vec<HistoryRecord>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub pages: usize,
}

impl HistoryPage {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }
}

struct RawRecord {
    id: i64,
    scan_id: String,
    url_enc: String,
    model_used: String,
    prediction: i64,
    confidence: Option<f64>,
    features_enc: String,
    created_at: i64,
}

const SELECT_COLUMNS: &str =
    "id, scan_id, url_enc, model_used, prediction, confidence, features_enc, created_at";

fn raw_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok(RawRecord {
        id: row.get(0)?,
        scan_id: row.get(1)?,
        url_enc: row.get(2)?,
        model_used: row.get(3)?,
        prediction: row.get(4)?,
        confidence: row.get(5)?,
        features_enc: row.get(6)?,
        created_at: row.get(7)?,
    })
}

pub struct HistoryStore {
    conn: Mutex<Connection>,
    key: [u8; KEY_LEN],
}

impl HistoryStore {
    /// Open or create the DB at path. Key is derived from `secret`.
    pub fn open(path: &Path, secret: &[u8]) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                scan_id TEXT NOT NULL UNIQUE,
                url_sha256 TEXT NOT NULL,
                url_enc TEXT NOT NULL,
                model_used TEXT NOT NULL,
                prediction INTEGER NOT NULL,
                confidence REAL,
                features_enc TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_history_url ON history(url_sha256);
            CREATE INDEX IF NOT EXISTS idx_history_created ON history(created_at);
            "#,
        )?;
        tracing::debug!(path = %path.display(), "history store opened");
        Ok(Self {
            conn: Mutex::new(conn),
            key: derive_key(secret),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a scoring event; returns its row id
    pub fn record(&self, prediction: &Prediction) -> Result<i64, StoreError> {
        let url_enc = encrypt(&self.key, prediction.url.as_bytes())?;
        let features_json = serde_json::to_vec(&prediction.features)?;
        let features_enc = encrypt(&self.key, &features_json)?;
        let conn = self.conn();
        conn.execute(
            "INSERT INTO history (scan_id, url_sha256, url_enc, model_used, prediction, confidence, features_enc, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                prediction.scan_id.to_string(),
                fingerprint(&prediction.url),
                url_enc,
                prediction.model,
                prediction.label,
                prediction.confidence.value(),
                features_enc,
                prediction.ts.timestamp_millis(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        tracing::debug!(id, scan_id = %prediction.scan_id, "history record stored");
        Ok(id)
    }

    pub fn get(&self, id: i64) -> Result<Option<HistoryRecord>, StoreError> {
        let raw = self
            .conn()
            .query_row(
                &format!("SELECT {} FROM history WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                raw_from_row,
            )
            .optional()?;
        raw.map(|r| self.decode(r)).transpose()
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    /// 1-based page in ascending id order; page 0 is treated as page 1
    pub fn page(&self, page: usize, per_page: usize) -> Result<HistoryPage, StoreError> {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let total = self.count()?;
        let pages = total.div_ceil(per_page);
        let offset = (page - 1).saturating_mul(per_page);
        let raws = {
            let conn = self.conn();
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM history ORDER BY id ASC LIMIT ?1 OFFSET ?2",
                SELECT_COLUMNS
            ))?;
            let rows = stmt.query_map(params![per_page as i64, offset as i64], raw_from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        let items = raws
            .into_iter()
            .map(|r| self.decode(r))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(HistoryPage {
            items,
            page,
            per_page,
            total,
            pages,
        })
    }

    /// Every stored scoring of exactly this URL, oldest first
    pub fn find_by_url(&self, url: &str) -> Result<Vec<HistoryRecord>, StoreError> {
        let raws = {
            let conn = self.conn();
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM history WHERE url_sha256 = ?1 ORDER BY id ASC",
                SELECT_COLUMNS
            ))?;
            let rows = stmt.query_map(params![fingerprint(url)], raw_from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        raws.into_iter().map(|r| self.decode(r)).collect()
    }

    /// Retention: delete records created before `ts` (milliseconds)
    pub fn prune_before(&self, ts: i64) -> Result<u64, StoreError> {
        let n = self
            .conn()
            .execute("DELETE FROM history WHERE created_at < ?1", params![ts])?;
        Ok(n as u64)
    }

    fn decode(&self, raw: RawRecord) -> Result<HistoryRecord, StoreError> {
        let url = String::from_utf8(decrypt(&self.key, &raw.url_enc)?)
            .map_err(|e| StoreError::Encoding(e.to_string()))?;
        let features: FeatureMap = serde_json::from_slice(&decrypt(&self.key, &raw.features_enc)?)?;
        let created_at = Utc
            .timestamp_millis_opt(raw.created_at)
            .single()
            .ok_or_else(|| StoreError::Encoding(format!("bad timestamp {}", raw.created_at)))?;
        Ok(HistoryRecord {
            id: raw.id,
            scan_id: raw.scan_id,
            url,
            model_used: raw.model_used,
            prediction: raw.prediction,
            confidence: raw.confidence.into(),
            features,
            created_at,
        })
    }
}

/// Secret from the file at `path`, creating 32 random bytes there on first use.
pub fn load_or_create_secret(path: &Path) -> std::io::Result<Vec<u8>> {
    if path.exists() {
        let encoded = std::fs::read_to_string(path)?;
        return BASE64
            .decode(encoded.trim())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e));
    }
    let mut secret = vec![0u8; KEY_LEN];
    rand::thread_rng().fill_bytes(&mut secret);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, BASE64.encode(&secret))?;
    tracing::info!(path = %path.display(), "generated history secret");
    Ok(secret)
}
