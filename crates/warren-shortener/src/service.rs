use crate::allocator::{CodeAllocator, INITIAL_CURSOR};
use crate::error::{Result, ShortenerError};
use crate::inspect::{self, KeyspaceDump};
use crate::keyspace::{encode_u64, Keyspace};
use crate::popularity::{self, IndexViolation};
use crate::registry;
use crate::settings::ShortenerSettings;
use crate::shortener::{ShortenParams, Shortener};
use async_trait::async_trait;
use tracing::{debug, info, warn};
use warren_core::{Direction, RankedCode, Ranking, ReservedCodes, ShortCode};
use warren_store::{Database, OrderedStore, Transaction};

/// The shortener backed by an ordered transactional store.
///
/// The service keeps no state of its own between calls: the cursor,
/// mappings, counters and index all live in the store, so any number of
/// services may share one store.
#[derive(Debug)]
pub struct ShortenerService<S> {
    db: Database<S>,
    keyspace: Keyspace,
    allocator: CodeAllocator,
    reserved: ReservedCodes,
    base_url: String,
}

impl<S> Clone for ShortenerService<S> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            keyspace: self.keyspace.clone(),
            allocator: self.allocator.clone(),
            reserved: self.reserved.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

impl<S: OrderedStore> ShortenerService<S> {
    /// Opens the service, bootstrapping the namespace if needed.
    ///
    /// Bootstrapping writes the initial cursor only when none exists and
    /// marks each reserved code as taken in the mapping table.
    pub async fn open(db: Database<S>, settings: ShortenerSettings) -> Result<Self> {
        let reserved = settings.reserved_codes()?;
        let keyspace = Keyspace::new(&settings.namespace);
        let allocator = CodeAllocator::new(keyspace.clone(), reserved.clone());

        let (fresh, shadowed) = db
            .transact(|tr| bootstrap(tr, &keyspace, &reserved))
            .await?;

        for code in &shadowed {
            warn!(%code, "reserved code is already mapped; it is hidden from lookups and rankings");
        }
        info!(
            namespace = %settings.namespace,
            reserved = reserved.len(),
            fresh,
            "shortener opened"
        );

        Ok(Self {
            db,
            keyspace,
            allocator,
            reserved,
            base_url: settings.base_url,
        })
    }

    /// Renders the full short URL for `code`.
    pub fn short_url(&self, code: &ShortCode) -> String {
        code.to_url(&self.base_url)
    }

    /// Reads every table in one transaction.
    pub async fn dump(&self) -> Result<KeyspaceDump> {
        self.db
            .transact(|tr| inspect::dump(tr, &self.keyspace, &self.allocator))
            .await
    }

    /// Checks the counter/index invariant across the whole namespace.
    pub async fn audit(&self) -> Result<Vec<IndexViolation>> {
        self.db
            .transact(|tr| popularity::audit(tr, &self.keyspace, &self.reserved))
            .await
    }

    fn validate_url(url: &str) -> Result<()> {
        if url.trim().is_empty() {
            return Err(ShortenerError::InvalidUrl(
                "URL cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn ensure_not_reserved(&self, code: &ShortCode) -> Result<()> {
        if self.reserved.contains(code) {
            return Err(ShortenerError::NotFound(code.to_string()));
        }
        Ok(())
    }
}

/// Returns whether the cursor was freshly written and which reserved codes
/// were found already mapped to a real URL.
fn bootstrap<T: Transaction>(
    tr: &mut T,
    keyspace: &Keyspace,
    reserved: &ReservedCodes,
) -> Result<(bool, Vec<ShortCode>)> {
    let fresh = tr.get(keyspace.cursor_key())?.is_none();
    if fresh {
        tr.set(keyspace.cursor_key(), &encode_u64(INITIAL_CURSOR));
    }

    let mut shadowed = Vec::new();
    for code in reserved.iter() {
        let key = keyspace.url_key(code);
        match tr.get(&key)? {
            None => tr.set(&key, b""),
            Some(existing) if !existing.is_empty() => shadowed.push(code.clone()),
            Some(_) => {}
        }
    }
    Ok((fresh, shadowed))
}

#[async_trait]
impl<S: OrderedStore> Shortener for ShortenerService<S> {
    async fn create(&self, params: ShortenParams) -> Result<ShortCode> {
        Self::validate_url(&params.original_url)?;

        let alias = params.custom_alias.as_deref();
        let code = self
            .db
            .transact(|tr| -> Result<ShortCode> {
                let code = self.allocator.allocate(tr, alias)?;
                registry::register(tr, &self.keyspace, &code, &params.original_url)?;
                Ok(code)
            })
            .await?;

        info!(%code, url = %params.original_url, "short code created");
        Ok(code)
    }

    async fn resolve(&self, code: &ShortCode) -> Result<String> {
        self.ensure_not_reserved(code)?;
        let url = self
            .db
            .transact(|tr| registry::resolve(tr, &self.keyspace, code))
            .await?;

        debug!(%code, %url, "short code resolved");
        Ok(url)
    }

    async fn rank(&self, direction: Direction) -> Result<Ranking> {
        self.db
            .transact(|tr| popularity::extremal(tr, &self.keyspace, &self.reserved, direction))
            .await
    }

    async fn leaderboard(&self, direction: Direction, limit: usize) -> Result<Vec<RankedCode>> {
        self.db
            .transact(|tr| {
                popularity::leaderboard(tr, &self.keyspace, &self.reserved, direction, limit)
            })
            .await
    }

    async fn count_of(&self, code: &ShortCode) -> Result<u64> {
        self.ensure_not_reserved(code)?;
        self.db
            .transact(|tr| popularity::count_of(tr, &self.keyspace, code))
            .await
    }
}
