//! Session
//!
//! Process-wide state for one register. The cart and held orders survive restarts through a
//! [`CartStore`]; catalog, customers, orders and refunds always start idle and are fetched again.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use till::cart::{Cart, HeldOrders};
use tracing::{debug, warn};

use crate::{refund_desk::RefundDesk, terminal::Terminal};

/// Errors reading or writing the saved cart.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The cart file could not be read or written.
    #[error("failed to access {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,

        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The saved cart is not valid.
    #[error("saved cart is invalid: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// The part of a session that is saved between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    /// The cart
    #[serde(default)]
    pub cart: Cart,

    /// Parked carts
    #[serde(default)]
    pub held: HeldOrders,
}

/// Durable storage for the cart snapshot.
pub trait CartStore: Send + Sync {
    /// Loads the saved snapshot; `None` if nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the snapshot exists but cannot be read.
    fn load(&self) -> Result<Option<CartSnapshot>, SessionError>;

    /// Saves the snapshot, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the snapshot cannot be written.
    fn save(&self, snapshot: &CartSnapshot) -> Result<(), SessionError>;
}

/// Stores the snapshot as a JSON file.
#[derive(Debug, Clone)]
pub struct FileCartStore {
    path: PathBuf,
}

impl FileCartStore {
    /// Store backed by the file at `path`; the file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File the snapshot is kept in.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CartStore for FileCartStore {
    fn load(&self) -> Result<Option<CartSnapshot>, SessionError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(self.io_error(error)),
        };

        Ok(Some(serde_json::from_str(&text)?))
    }

    fn save(&self, snapshot: &CartSnapshot) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|error| self.io_error(error))?;
        }

        let json = serde_json::to_vec_pretty(snapshot)?;

        fs::write(&self.path, json).map_err(|error| self.io_error(error))
    }
}

/// Keeps the snapshot in memory.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    snapshot: Mutex<Option<String>>,
}

impl MemoryCartStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStore for MemoryCartStore {
    fn load(&self) -> Result<Option<CartSnapshot>, SessionError> {
        let saved = self
            .snapshot
            .lock()
            .map_or_else(|poisoned| poisoned.into_inner().clone(), |saved| saved.clone());

        saved
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(SessionError::from)
    }

    fn save(&self, snapshot: &CartSnapshot) -> Result<(), SessionError> {
        let json = serde_json::to_string(snapshot)?;

        match self.snapshot.lock() {
            Ok(mut saved) => *saved = Some(json),
            Err(poisoned) => *poisoned.into_inner() = Some(json),
        }

        Ok(())
    }
}

/// One register's state.
pub struct Session {
    store: Box<dyn CartStore>,
    terminal: Terminal,
    refund_desk: RefundDesk,
}

impl Session {
    /// Starts a session, restoring the saved cart if there is one. An unreadable snapshot is
    /// logged and skipped so the register still opens with an empty cart.
    #[must_use]
    pub fn start(
        store: Box<dyn CartStore>,
        mut terminal: Terminal,
        refund_desk: RefundDesk,
    ) -> Self {
        match store.load() {
            Ok(Some(snapshot)) => {
                debug!(
                    lines = snapshot.cart.len(),
                    held = snapshot.held.len(),
                    "restored saved cart"
                );

                terminal.rehydrate(snapshot);
            }
            Ok(None) => debug!("no saved cart"),
            Err(error) => warn!(%error, "ignoring unreadable saved cart"),
        }

        Self {
            store,
            terminal,
            refund_desk,
        }
    }

    /// Saves the cart and held orders.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the store cannot be written.
    pub fn persist(&self) -> Result<(), SessionError> {
        self.store.save(&self.terminal.snapshot())
    }

    /// The sales terminal.
    #[must_use]
    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    /// Mutable access to the sales terminal.
    pub fn terminal_mut(&mut self) -> &mut Terminal {
        &mut self.terminal
    }

    /// The refund desk.
    #[must_use]
    pub fn refund_desk(&self) -> &RefundDesk {
        &self.refund_desk
    }

    /// Mutable access to the refund desk.
    pub fn refund_desk_mut(&mut self) -> &mut RefundDesk {
        &mut self.refund_desk
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Session")
            .field("terminal", &self.terminal)
            .field("refund_desk", &self.refund_desk)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;
    use till::{
        cart::{Discount, TaxRate},
        products::Product,
        resource::Resource,
        returns::RefundPolicy,
    };

    use crate::{
        api::{MockCatalogService, MockOrdersService, MockRefundsService},
        context::AppContext,
        test::helpers::terminal_context,
    };

    use super::*;

    fn services() -> AppContext {
        AppContext::new(
            MockCatalogService::new(),
            MockOrdersService::new(),
            MockRefundsService::new(),
        )
    }

    fn session(store: Box<dyn CartStore>) -> Session {
        let services = services();

        Session::start(
            store,
            Terminal::new(terminal_context(), services.clone(), TaxRate::default()),
            RefundDesk::new(services, RefundPolicy::default()),
        )
    }

    fn snapshot() -> CartSnapshot {
        let mut cart = Cart::new();

        cart.add_product(&Product::new("1", "Linen Shirt", 59_900));
        cart.add_product(&Product::new("1", "Linen Shirt", 59_900));
        cart.set_discount(Discount::Amount(1_000));

        CartSnapshot {
            cart,
            held: HeldOrders::default(),
        }
    }

    #[test]
    fn file_store_round_trips_snapshot() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = FileCartStore::new(dir.path().join("nested").join("cart.json"));

        assert_eq!(store.load()?, None);

        store.save(&snapshot())?;

        assert_eq!(store.load()?, Some(snapshot()));

        Ok(())
    }

    #[test]
    fn file_store_reports_corrupt_file() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cart.json");

        fs::write(&path, "{ not json")?;

        let store = FileCartStore::new(&path);

        assert!(matches!(store.load(), Err(SessionError::Corrupt(_))));

        Ok(())
    }

    #[test]
    fn start_rehydrates_cart_only() -> TestResult {
        let store = MemoryCartStore::new();

        store.save(&snapshot())?;

        let session = session(Box::new(store));

        assert_eq!(
            session.terminal().cart().lines(),
            snapshot().cart.lines()
        );
        assert_eq!(session.terminal().products(), &Resource::Idle);
        assert!(session.refund_desk().sheet().is_none());

        Ok(())
    }

    #[test]
    fn start_ignores_corrupt_snapshot() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cart.json");

        fs::write(&path, r#"{ "cart": { "lines": "nope" } }"#)?;

        let session = session(Box::new(FileCartStore::new(&path)));

        assert!(session.terminal().cart().is_empty());

        Ok(())
    }

    #[test]
    fn persist_writes_current_cart() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cart.json");

        let mut session = session(Box::new(FileCartStore::new(&path)));

        session
            .terminal_mut()
            .cart_mut()
            .add_product(&Product::new("2", "Denim Jeans", 39_900));
        session.persist()?;

        let saved = FileCartStore::new(&path).load()?;

        assert_eq!(saved.map(|snapshot| snapshot.cart.len()), Some(1));

        Ok(())
    }
}
