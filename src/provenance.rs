//! Append-only provenance ledger and its lazy query surface (see spec §3,
//! §4.2).

use chrono::{DateTime, Utc};

use crate::identifier::AssetIdentifier;
use crate::state_machine::Layer;

/// A single on-chain or off-chain layer migration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MigrationEntry {
    pub from_layer: Layer,
    pub to_layer: Layer,
    pub timestamp: DateTime<Utc>,
    pub transaction_id: Option<String>,
    pub inscription_id: Option<String>,
    pub satoshi: Option<u64>,
    pub commit_txid: Option<String>,
    pub reveal_txid: Option<String>,
    pub fee_rate: Option<f64>,
}

/// A single ownership transfer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TransferEntry {
    pub from_address: String,
    pub to_address: String,
    pub timestamp: DateTime<Utc>,
    pub transaction_id: String,
}

/// The two disjoint provenance entry shapes (spec §3), unified for query
/// results that read across both sequences.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum ProvenanceEntry {
    Migration(MigrationEntry),
    Transfer(TransferEntry),
}

impl ProvenanceEntry {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ProvenanceEntry::Migration(m) => m.timestamp,
            ProvenanceEntry::Transfer(t) => t.timestamp,
        }
    }
}

/// Ordered record of an asset's migrations and transfers. Append-only: the
/// only mutators are [`ProvenanceLedger::append_migration`] and
/// [`ProvenanceLedger::append_transfer`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProvenanceLedger {
    migrations: Vec<MigrationEntry>,
    transfers: Vec<TransferEntry>,
    creator: AssetIdentifier,
    created_at: DateTime<Utc>,
    last_txid: Option<String>,
}

impl ProvenanceLedger {
    /// Creates an empty ledger stamped with the creating identifier and
    /// timestamp (spec §4.8 `createAsset` postcondition).
    pub fn new(creator: AssetIdentifier, created_at: DateTime<Utc>) -> Self {
        Self {
            migrations: Vec::new(),
            transfers: Vec::new(),
            creator,
            created_at,
            last_txid: None,
        }
    }

    pub fn creator(&self) -> &AssetIdentifier {
        &self.creator
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_txid(&self) -> Option<&str> {
        self.last_txid.as_deref()
    }

    /// Appends a migration entry, updating `last_txid` if it carries a
    /// transaction id.
    pub fn append_migration(&mut self, entry: MigrationEntry) {
        if let Some(txid) = &entry.transaction_id {
            self.last_txid = Some(txid.clone());
        }
        self.migrations.push(entry);
    }

    /// Appends a transfer entry, updating `last_txid`.
    pub fn append_transfer(&mut self, entry: TransferEntry) {
        self.last_txid = Some(entry.transaction_id.clone());
        self.transfers.push(entry);
    }

    pub fn migrations_raw(&self) -> &[MigrationEntry] {
        &self.migrations
    }

    pub fn transfers_raw(&self) -> &[TransferEntry] {
        &self.transfers
    }

    /// Starts a query over the migrations sequence, snapshotting current
    /// ledger state (spec §4.2: "queries are snapshot-at-construction").
    pub fn migrations(&self) -> ProvenanceQuery {
        ProvenanceQuery::new(self).migrations()
    }

    /// Starts a query over the transfers sequence, snapshotting current
    /// ledger state.
    pub fn transfers(&self) -> ProvenanceQuery {
        ProvenanceQuery::new(self).transfers()
    }
}

#[derive(Debug, Clone, Default)]
struct MigrationFilters {
    from_layer: Option<Layer>,
    to_layer: Option<Layer>,
    with_transaction: Option<String>,
    with_inscription: Option<String>,
}

impl MigrationFilters {
    fn matches(&self, entry: &MigrationEntry) -> bool {
        self.from_layer.map_or(true, |l| l == entry.from_layer)
            && self.to_layer.map_or(true, |l| l == entry.to_layer)
            && self
                .with_transaction
                .as_deref()
                .map_or(true, |id| entry.transaction_id.as_deref() == Some(id))
            && self
                .with_inscription
                .as_deref()
                .map_or(true, |id| entry.inscription_id.as_deref() == Some(id))
    }
}

#[derive(Debug, Clone, Default)]
struct TransferFilters {
    from: Option<String>,
    to: Option<String>,
    with_transaction: Option<String>,
}

impl TransferFilters {
    fn matches(&self, entry: &TransferEntry) -> bool {
        self.from.as_deref().map_or(true, |a| entry.from_address == a)
            && self.to.as_deref().map_or(true, |a| entry.to_address == a)
            && self
                .with_transaction
                .as_deref()
                .map_or(true, |id| entry.transaction_id == id)
    }
}

#[derive(Debug, Clone)]
enum Cursor {
    Migrations(MigrationFilters),
    Transfers(TransferFilters),
}

/// A lazy, composable query over a [`ProvenanceLedger`]'s migrations or
/// transfers sequence. Snapshotted at construction time: mutating the source
/// ledger after the query is built does not affect it. Switching cursors
/// (`.migrations()` <-> `.transfers()`) preserves date predicates and drops
/// cursor-specific filters (spec §4.2).
#[derive(Debug, Clone)]
pub struct ProvenanceQuery {
    migrations_snapshot: Vec<MigrationEntry>,
    transfers_snapshot: Vec<TransferEntry>,
    cursor: Cursor,
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
}

impl ProvenanceQuery {
    fn new(ledger: &ProvenanceLedger) -> Self {
        Self {
            migrations_snapshot: ledger.migrations.clone(),
            transfers_snapshot: ledger.transfers.clone(),
            cursor: Cursor::Migrations(MigrationFilters::default()),
            after: None,
            before: None,
        }
    }

    /// Switches to the migrations cursor, preserving date predicates.
    pub fn migrations(mut self) -> Self {
        self.cursor = Cursor::Migrations(MigrationFilters::default());
        self
    }

    /// Switches to the transfers cursor, preserving date predicates.
    pub fn transfers(mut self) -> Self {
        self.cursor = Cursor::Transfers(TransferFilters::default());
        self
    }

    pub fn from_layer(mut self, layer: Layer) -> Self {
        if let Cursor::Migrations(f) = &mut self.cursor {
            f.from_layer = Some(layer);
        }
        self
    }

    pub fn to_layer(mut self, layer: Layer) -> Self {
        if let Cursor::Migrations(f) = &mut self.cursor {
            f.to_layer = Some(layer);
        }
        self
    }

    pub fn with_inscription(mut self, inscription_id: impl Into<String>) -> Self {
        if let Cursor::Migrations(f) = &mut self.cursor {
            f.with_inscription = Some(inscription_id.into());
        }
        self
    }

    pub fn from(mut self, address: impl Into<String>) -> Self {
        if let Cursor::Transfers(f) = &mut self.cursor {
            f.from = Some(address.into());
        }
        self
    }

    pub fn to(mut self, address: impl Into<String>) -> Self {
        if let Cursor::Transfers(f) = &mut self.cursor {
            f.to = Some(address.into());
        }
        self
    }

    /// Applies to both cursors: migrations filtered by transaction id, or
    /// transfers filtered by transaction id, depending on the active cursor.
    pub fn with_transaction(mut self, transaction_id: impl Into<String>) -> Self {
        let id = transaction_id.into();
        match &mut self.cursor {
            Cursor::Migrations(f) => f.with_transaction = Some(id),
            Cursor::Transfers(f) => f.with_transaction = Some(id),
        }
        self
    }

    pub fn after(mut self, t: DateTime<Utc>) -> Self {
        self.after = Some(t);
        self
    }

    pub fn before(mut self, t: DateTime<Utc>) -> Self {
        self.before = Some(t);
        self
    }

    pub fn between(mut self, lo: DateTime<Utc>, hi: DateTime<Utc>) -> Self {
        self.after = Some(lo);
        self.before = Some(hi);
        self
    }

    fn date_ok(&self, t: DateTime<Utc>) -> bool {
        self.after.map_or(true, |lo| t >= lo) && self.before.map_or(true, |hi| t <= hi)
    }

    /// Terminal reducer: all matching entries, in ledger order.
    pub fn all(&self) -> Vec<ProvenanceEntry> {
        match &self.cursor {
            Cursor::Migrations(filters) => self
                .migrations_snapshot
                .iter()
                .filter(|e| filters.matches(e) && self.date_ok(e.timestamp))
                .cloned()
                .map(ProvenanceEntry::Migration)
                .collect(),
            Cursor::Transfers(filters) => self
                .transfers_snapshot
                .iter()
                .filter(|e| filters.matches(e) && self.date_ok(e.timestamp))
                .cloned()
                .map(ProvenanceEntry::Transfer)
                .collect(),
        }
    }

    pub fn first(&self) -> Option<ProvenanceEntry> {
        self.all().into_iter().next()
    }

    pub fn last(&self) -> Option<ProvenanceEntry> {
        self.all().into_iter().last()
    }

    pub fn count(&self) -> usize {
        self.all().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn creator() -> AssetIdentifier {
        AssetIdentifier::new_peer(b"creator")
    }

    fn migration(from: Layer, to: Layer, ts: DateTime<Utc>) -> MigrationEntry {
        MigrationEntry {
            from_layer: from,
            to_layer: to,
            timestamp: ts,
            transaction_id: None,
            inscription_id: None,
            satoshi: None,
            commit_txid: None,
            reveal_txid: None,
            fee_rate: None,
        }
    }

    #[test]
    fn append_migration_updates_last_txid_only_when_present() {
        let mut ledger = ProvenanceLedger::new(creator(), Utc::now());
        let mut m = migration(Layer::Peer, Layer::Webvh, Utc::now());
        ledger.append_migration(m.clone());
        assert_eq!(ledger.last_txid(), None);

        m.transaction_id = Some("tx1".into());
        ledger.append_migration(m);
        assert_eq!(ledger.last_txid(), Some("tx1"));
    }

    #[test]
    fn filters_and_date_predicates_compose() {
        let mut ledger = ProvenanceLedger::new(creator(), Utc::now());
        let t0 = Utc::now();
        ledger.append_migration(migration(Layer::Peer, Layer::Webvh, t0));
        ledger.append_migration(migration(Layer::Webvh, Layer::Btco, t0 + Duration::seconds(10)));

        let results = ledger.migrations().to_layer(Layer::Btco).all();
        assert_eq!(results.len(), 1);

        let results = ledger.migrations().after(t0 + Duration::seconds(1)).all();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn switching_cursor_preserves_date_predicates_drops_filters() {
        let mut ledger = ProvenanceLedger::new(creator(), Utc::now());
        let t0 = Utc::now();
        ledger.append_migration(migration(Layer::Peer, Layer::Btco, t0));
        ledger.append_transfer(TransferEntry {
            from_address: "addrA".into(),
            to_address: "addrB".into(),
            timestamp: t0 + Duration::seconds(5),
            transaction_id: "tx-transfer".into(),
        });

        let query = ledger
            .migrations()
            .to_layer(Layer::Btco)
            .after(t0 - Duration::seconds(1))
            .transfers();

        // to_layer filter (migrations-specific) is gone; date predicate stays.
        assert_eq!(query.count(), 1);
        let entries = query.all();
        match &entries[0] {
            ProvenanceEntry::Transfer(t) => assert_eq!(t.to_address, "addrB"),
            _ => panic!("expected transfer"),
        }
    }

    #[test]
    fn terminal_reducers() {
        let mut ledger = ProvenanceLedger::new(creator(), Utc::now());
        let t0 = Utc::now();
        ledger.append_migration(migration(Layer::Peer, Layer::Webvh, t0));
        ledger.append_migration(migration(Layer::Webvh, Layer::Btco, t0 + Duration::seconds(1)));

        let q = ledger.migrations();
        assert_eq!(q.count(), 2);
        assert!(matches!(q.first(), Some(ProvenanceEntry::Migration(m)) if m.to_layer == Layer::Webvh));
        assert!(matches!(q.last(), Some(ProvenanceEntry::Migration(m)) if m.to_layer == Layer::Btco));
    }
}
