//! First-boot seeding: birth timestamp, persona text, one-time origin seeds.
//! Every helper is idempotent and returns `Ok(true)` only when it did work.

use crate::facts::FactStore;
use crate::ledger::{EventKind, EventLedger};
use crate::memory::VectorMemory;
use crate::shared::{now_ms, BoxError};
use std::path::Path;

pub const FACT_BIRTH: &str = "birth";
pub const FACT_PERSONA: &str = "persona";
pub const FACT_SEED_INGESTED: &str = "seed_ingested";

const DEFAULT_PERSONA: &str = "I am a small persistent mind. I watch, remember, and adjust.";

/// Records the birth timestamp on very first boot.
pub fn seed_birth(facts: &FactStore) -> Result<bool, sled::Error> {
    if facts.get(FACT_BIRTH)?.is_some() {
        return Ok(false);
    }
    facts.set(FACT_BIRTH, &serde_json::json!({ "ts_ms": now_ms() }))?;
    Ok(true)
}

/// Installs the persona fact from `persona_path`, falling back to a built-in
/// line when the file is missing.
pub fn seed_persona(facts: &FactStore, persona_path: &Path) -> Result<bool, sled::Error> {
    if facts.get(FACT_PERSONA)?.is_some() {
        return Ok(false);
    }
    let text = std::fs::read_to_string(persona_path).unwrap_or_else(|_| DEFAULT_PERSONA.to_string());
    facts.set(FACT_PERSONA, &serde_json::json!({ "text": text }))?;
    Ok(true)
}

/// Ingests each non-empty line of the origin seed file into vector memory,
/// exactly once across the life of the store. A missing seed file leaves the
/// marker unset so a later boot with the file present still ingests.
pub async fn ingest_origin_seeds(
    facts: &FactStore,
    memory: &VectorMemory,
    ledger: &EventLedger,
    seeds_path: &Path,
) -> Result<bool, BoxError> {
    if facts.get(FACT_SEED_INGESTED)?.is_some() {
        return Ok(false);
    }
    let Ok(raw) = std::fs::read_to_string(seeds_path) else {
        return Ok(false);
    };

    let mut count = 0usize;
    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match memory.ingest(line, serde_json::json!({ "kind": "origin" })).await {
            Ok(_) => count += 1,
            Err(e) => tracing::warn!(target: "mind::bootstrap", error = %e, "origin seed line skipped"),
        }
    }
    facts.set(
        FACT_SEED_INGESTED,
        &serde_json::json!({ "ts_ms": now_ms(), "count": count }),
    )?;
    ledger.append(EventKind::Ingest, serde_json::json!({ "origin_seeds": count }))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::LocalProvider;
    use std::io::Write;
    use std::sync::Arc;

    struct Stores {
        _dir: tempfile::TempDir,
        facts: FactStore,
        memory: VectorMemory,
        ledger: EventLedger,
    }

    fn test_stores() -> Stores {
        let dir = tempfile::tempdir().unwrap();
        let db = sled::open(dir.path().join("mind")).unwrap();
        Stores {
            facts: FactStore::open(&db).unwrap(),
            memory: VectorMemory::open(&db, Arc::new(LocalProvider)).unwrap(),
            ledger: EventLedger::open(&db).unwrap(),
            _dir: dir,
        }
    }

    #[test]
    fn birth_is_written_once() {
        let stores = test_stores();
        assert!(seed_birth(&stores.facts).unwrap());
        let first = stores.facts.get(FACT_BIRTH).unwrap().unwrap();
        assert!(!seed_birth(&stores.facts).unwrap());
        assert_eq!(stores.facts.get(FACT_BIRTH).unwrap().unwrap(), first);
    }

    #[test]
    fn missing_persona_file_falls_back_to_default() {
        let stores = test_stores();
        assert!(seed_persona(&stores.facts, Path::new("/nonexistent/persona.md")).unwrap());
        let persona = stores.facts.get(FACT_PERSONA).unwrap().unwrap();
        assert_eq!(persona["text"], DEFAULT_PERSONA);
    }

    #[tokio::test]
    async fn seeds_ingest_once_and_log_the_count() {
        let stores = test_stores();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "first seed").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "   second seed  ").unwrap();
        file.flush().unwrap();

        assert!(
            ingest_origin_seeds(&stores.facts, &stores.memory, &stores.ledger, file.path())
                .await
                .unwrap()
        );
        assert_eq!(stores.memory.len(), 2);
        let marker = stores.facts.get(FACT_SEED_INGESTED).unwrap().unwrap();
        assert_eq!(marker["count"], 2);
        let events = stores.ledger.recent(10).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload["origin_seeds"], 2);

        // Second boot: marker short-circuits, nothing new ingested.
        assert!(
            !ingest_origin_seeds(&stores.facts, &stores.memory, &stores.ledger, file.path())
                .await
                .unwrap()
        );
        assert_eq!(stores.memory.len(), 2);
    }

    #[tokio::test]
    async fn missing_seed_file_leaves_marker_unset() {
        let stores = test_stores();
        assert!(!ingest_origin_seeds(
            &stores.facts,
            &stores.memory,
            &stores.ledger,
            Path::new("/nonexistent/seeds.txt")
        )
        .await
        .unwrap());
        assert!(stores.facts.get(FACT_SEED_INGESTED).unwrap().is_none());
    }
}
