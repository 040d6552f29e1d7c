//! Query client.
//!
//! [`Sf`] runs paginated SOQL queries over a [`Session`] and hands out one
//! [`SfType`] per object name.
//!
//! # Example
//!
//! ```rust,ignore
//! use sftools_auth::{FileProfileStore, SfConfig};
//! use sftools_query::{QueryOptions, Sf, SfOptions};
//!
//! let store = FileProfileStore::new()?;
//! let config = SfConfig::load(&store, "production")?;
//! let sf = Sf::connect(&config, SfOptions::default())?;
//!
//! // Filter only: object and field come from the first token
//! let result = sf.query_where("Case.CaseNumber = '00001234'").await?;
//!
//! // Through a type: open cases only, active record types only
//! let cases = sf.sftype("Case").query("Priority = 'High'", &QueryOptions::new()).await?;
//! ```
//!
//! # Concurrency
//!
//! Calls are awaited one after the other. The type and object caches are
//! behind mutexes that are never held across an await, so a client may be
//! shared, but it performs no request coalescing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use sftools_auth::SfConfig;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use crate::error::{Error, ErrorKind, Result};
use crate::paginate::{self, PagePlan, FIELDS_ALL};
use crate::registry::TypeRegistry;
use crate::result::{PagedResult, Record};
use crate::session::{call_with_refresh, lock, Session, SessionRefresher};
use crate::sftype::SfType;
use crate::soql::{Soql, ID_FIELD};

/// Client-wide options.
#[derive(Debug, Clone)]
pub struct SfOptions {
    /// Select every field (`FIELDS(ALL)`) unless a query says otherwise.
    pub preload_fields: bool,
    /// Profiles for object types.
    pub registry: TypeRegistry,
}

impl Default for SfOptions {
    fn default() -> Self {
        Self {
            preload_fields: false,
            registry: TypeRegistry::builtin(),
        }
    }
}

impl SfOptions {
    pub fn with_preload_fields(mut self, preload: bool) -> Self {
        self.preload_fields = preload;
        self
    }

    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }
}

/// Salesforce query client.
///
/// Cloning is cheap and clones share the session and all caches.
#[derive(Clone)]
pub struct Sf {
    inner: Arc<SfInner>,
}

pub(crate) struct SfInner {
    session: Session,
    options: SfOptions,
    types: Mutex<HashMap<String, SfType>>,
    object_names: OnceCell<Vec<String>>,
}

impl std::fmt::Debug for Sf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sf")
            .field("session", &self.inner.session)
            .field("preload_fields", &self.inner.options.preload_fields)
            .finish_non_exhaustive()
    }
}

impl Sf {
    /// Create a client over an existing session.
    pub fn new(session: Session, options: SfOptions) -> Self {
        Self {
            inner: Arc::new(SfInner {
                session,
                options,
                types: Mutex::new(HashMap::new()),
                object_names: OnceCell::new(),
            }),
        }
    }

    /// Create a client for a resolved profile.
    pub fn connect(config: &SfConfig, options: SfOptions) -> Result<Self> {
        Ok(Self::new(Session::from_config(config)?, options))
    }

    pub(crate) fn downgrade(&self) -> Weak<SfInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(inner: &Weak<SfInner>) -> Result<Self> {
        inner.upgrade().map(|inner| Self { inner }).ok_or_else(|| {
            Error::new(ErrorKind::Other(
                "Salesforce client was dropped".to_string(),
            ))
        })
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    pub fn options(&self) -> &SfOptions {
        &self.inner.options
    }

    /// Client-wide `FIELDS(ALL)` default.
    pub fn preload_fields(&self) -> bool {
        self.inner.options.preload_fields
    }

    /// Refresh the session now.
    pub async fn refresh(&self) -> Result<()> {
        self.inner.session.refresh_session().await
    }

    /// Build a query from a filter of the form `Object.Field ...`.
    ///
    /// See [`Soql::from_filter`]; the client's preload default is applied.
    pub fn soql(&self, filter: &str) -> Result<Soql> {
        Ok(Soql::from_filter(filter)?.with_preload_fields(self.preload_fields()))
    }

    /// Number of records matching `soql`, capped by its limit.
    #[instrument(skip(self))]
    pub async fn query_count(&self, soql: &Soql) -> Result<u64> {
        let count = soql.count_query().render()?;
        Ok(self.fetch(count).await?.total)
    }

    /// Run `soql` and return every matching record.
    ///
    /// The matches are counted first, then fetched in pages of up to 2000
    /// records (200 with `FIELDS(ALL)`). `Id` is always selected. The
    /// query's own OFFSET is ignored.
    ///
    /// Fails with [`ErrorKind::TooManyResults`] when the matches cannot all
    /// be reached by paging.
    #[instrument(skip(self))]
    pub async fn query(&self, soql: &Soql) -> Result<PagedResult> {
        let mut soql = soql.clone();
        let counted = self.query_count(&soql).await?;

        let fields_all = soql.preload_fields().unwrap_or(self.preload_fields());
        if fields_all {
            soql.set_select(FIELDS_ALL);
        } else {
            soql.add_select(ID_FIELD);
        }

        let plan = PagePlan::new(counted, soql.limit(), fields_all)?;
        debug!(
            total = plan.total,
            ceiling = plan.ceiling,
            pages = plan.pages(),
            "Paging query"
        );

        paginate::fetch_pages(&soql, plan, |statement| self.fetch(statement)).await
    }

    /// Run a raw filter through [`Sf::soql`] and [`Sf::query`].
    pub async fn query_where(&self, filter: &str) -> Result<PagedResult> {
        let soql = self.soql(filter)?;
        self.query(&soql).await
    }

    /// One query call, refreshing the session once if it expired.
    async fn fetch(&self, statement: String) -> Result<PagedResult> {
        let session = &self.inner.session;
        call_with_refresh(
            session,
            || {
                let client = session.client();
                let statement = statement.clone();
                async move {
                    client
                        .query::<Record>(&statement)
                        .await
                        .map(PagedResult::from_page)
                        .map_err(Error::from)
                }
            },
            None,
        )
        .await
    }

    /// The proxy for `name`.
    ///
    /// Repeated calls return the same proxy, so describe results and
    /// materialized objects are shared. The name is not checked against the
    /// org; see [`Sf::resolve_type`].
    pub fn sftype(&self, name: &str) -> SfType {
        let mut types = lock(&self.inner.types);
        types
            .entry(name.to_string())
            .or_insert_with(|| {
                let profile = self.inner.options.registry.profile(name);
                SfType::new(name, self, profile)
            })
            .clone()
    }

    /// Names of the objects that are both queryable and searchable.
    ///
    /// Fetched once per client.
    pub async fn object_names(&self) -> Result<&[String]> {
        let names = self
            .inner
            .object_names
            .get_or_try_init(|| async {
                let session = &self.inner.session;
                let global = call_with_refresh(
                    session,
                    || {
                        let client = session.client();
                        async move { client.describe_global().await.map_err(Error::from) }
                    },
                    None,
                )
                .await?;
                Ok::<_, Error>(global.queryable_names().map(str::to_string).collect())
            })
            .await?;
        Ok(names)
    }

    /// Like [`Sf::sftype`], but fails with [`ErrorKind::UnknownType`] if the
    /// org has no queryable object of that name.
    pub async fn resolve_type(&self, name: &str) -> Result<SfType> {
        if self.object_names().await?.iter().any(|n| n == name) {
            Ok(self.sftype(name))
        } else {
            Err(Error::new(ErrorKind::UnknownType(name.to_string())))
        }
    }
}
