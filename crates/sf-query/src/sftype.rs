//! Per-type query proxy.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use sftools_client::describe::{DescribeSObjectResult, FieldDescribe};
use sftools_client::SalesforceClient;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use crate::client::{Sf, SfInner};
use crate::error::{Error, ErrorKind, Result};
use crate::object::SfObject;
use crate::query::QueryOptions;
use crate::registry::{KeyLookup, TypeProfile};
use crate::result::{PagedResult, Record};
use crate::session::{call_with_refresh, lock};
use crate::soql::{Soql, ID_FIELD};
use crate::where_util;

/// Query proxy for one object type.
///
/// Obtained from [`Sf::sftype`]. Holds the type's describe result (fetched
/// once) and an identity cache of every object materialized for the type:
/// a record whose `Id` was seen before updates the existing [`SfObject`]
/// instead of creating a new one. The cache is never evicted.
#[derive(Clone)]
pub struct SfType {
    inner: Arc<SfTypeInner>,
}

pub(crate) struct SfTypeInner {
    name: String,
    client: Weak<SfInner>,
    profile: Arc<dyn TypeProfile>,
    // Rebound to the session's client after a refresh.
    handle: Mutex<SalesforceClient>,
    describe: OnceCell<DescribeSObjectResult>,
    objects: Mutex<HashMap<String, SfObject>>,
}

impl std::fmt::Debug for SfType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SfType")
            .field("name", &self.inner.name)
            .field("profile", &self.inner.profile)
            .field("cached_objects", &self.cached_count())
            .finish()
    }
}

impl std::fmt::Display for SfType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner.name)
    }
}

impl SfType {
    pub(crate) fn new(name: &str, sf: &Sf, profile: Arc<dyn TypeProfile>) -> Self {
        Self {
            inner: Arc::new(SfTypeInner {
                name: name.to_string(),
                client: sf.downgrade(),
                profile,
                handle: Mutex::new(sf.session().client()),
                describe: OnceCell::new(),
                objects: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<SfTypeInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(inner: &Weak<SfTypeInner>) -> Result<Self> {
        inner
            .upgrade()
            .map(|inner| Self { inner })
            .ok_or_else(|| Error::new(ErrorKind::Other("Object type was dropped".into())))
    }

    /// The object's API name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn profile(&self) -> &dyn TypeProfile {
        self.inner.profile.as_ref()
    }

    /// The owning client.
    pub fn client(&self) -> Result<Sf> {
        Sf::upgrade(&self.inner.client)
    }

    /// True if both are the same proxy.
    pub fn ptr_eq(&self, other: &SfType) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn rebind(&self, sf: &Sf) {
        *lock(&self.inner.handle) = sf.session().client();
    }

    /// The type's describe result, fetched on first use.
    pub async fn describe(&self) -> Result<&DescribeSObjectResult> {
        self.inner
            .describe
            .get_or_try_init(|| async {
                let sf = self.client()?;
                let rebind = || self.rebind(&sf);
                call_with_refresh(
                    sf.session(),
                    || {
                        let handle = lock(&self.inner.handle).clone();
                        let name = self.inner.name.clone();
                        async move { handle.describe_sobject(&name).await.map_err(Error::from) }
                    },
                    Some(&rebind),
                )
                .await
            })
            .await
    }

    pub async fn fields(&self) -> Result<&[FieldDescribe]> {
        Ok(&self.describe().await?.fields)
    }

    pub async fn field_names(&self) -> Result<Vec<String>> {
        Ok(self.fields().await?.iter().map(|f| f.name.clone()).collect())
    }

    /// Ids of the type's active record types.
    pub async fn active_record_type_ids(&self) -> Result<Vec<String>> {
        Ok(self.describe().await?.active_record_type_ids())
    }

    /// `<Type>.RecordTypeId IN (...)` over the active record types, or `""`
    /// if the type has none.
    pub async fn record_type_restriction(&self) -> Result<String> {
        let ids = self.active_record_type_ids().await?;
        Ok(where_util::in_list(
            &format!("{}.RecordTypeId", self.name()),
            ids,
        ))
    }

    /// Build the query [`SfType::query`] would run.
    ///
    /// The filter is ANDed with the active record type restriction and,
    /// unless `options.unrestricted`, with the profile's restriction.
    pub async fn soql(&self, filter: &str, options: &QueryOptions) -> Result<Soql> {
        let mut soql = Soql::new()
            .with_from(self.name())?
            .with_select(options.select.as_slice());
        soql.add_select(ID_FIELD);

        let mut fragments = vec![filter.to_string(), self.record_type_restriction().await?];
        if !options.unrestricted {
            if let Some(restriction) = self.inner.profile.restriction() {
                fragments.push(restriction.to_string());
            }
        }
        soql.set_filter(where_util::and(fragments));

        if let Some(order_by) = &options.order_by {
            soql.set_order_by(order_by.as_slice());
        }
        soql.set_limit(options.limit);
        soql.set_preload_fields(options.preload_fields);
        Ok(soql)
    }

    /// Query records of this type.
    #[instrument(skip(self, options), fields(sobject = %self.inner.name))]
    pub async fn query(&self, filter: &str, options: &QueryOptions) -> Result<PagedResult> {
        let soql = self.soql(filter, options).await?;
        self.client()?.query(&soql).await
    }

    /// Query and materialize the matching objects.
    pub async fn query_objects(&self, filter: &str, options: &QueryOptions) -> Result<Vec<SfObject>> {
        let result = self.query(filter, options).await?;
        self.objects(result)
    }

    /// Materialize every record of `result`.
    pub fn objects(&self, result: PagedResult) -> Result<Vec<SfObject>> {
        result.into_iter().map(|r| self.materialize(r)).collect()
    }

    /// The object for `record`'s `Id`.
    ///
    /// If the `Id` was materialized before, the record's fields are merged
    /// into that object and the same object is returned.
    pub fn materialize(&self, record: Record) -> Result<SfObject> {
        let id = record
            .id()
            .ok_or_else(|| Error::validation(format!("{} record has no Id", self.name())))?
            .to_string();

        let mut objects = lock(&self.inner.objects);
        if let Some(existing) = objects.get(&id) {
            existing.merge_record(record);
            return Ok(existing.clone());
        }

        let object = SfObject::new(self, id.clone(), record);
        objects.insert(id, object.clone());
        Ok(object)
    }

    /// A previously materialized object.
    pub fn cached(&self, id: &str) -> Option<SfObject> {
        lock(&self.inner.objects).get(id).cloned()
    }

    pub fn cached_count(&self) -> usize {
        lock(&self.inner.objects).len()
    }

    /// The object with this `Id`, `None` if there is none.
    ///
    /// Served from the identity cache when possible. The profile's
    /// restriction does not apply; record types still do. A request the
    /// remote rejects as malformed (such as an invalid id) counts as absent.
    pub async fn by_id(&self, id: &str) -> Result<Option<SfObject>> {
        if id.is_empty() {
            return Ok(None);
        }
        if let Some(object) = self.cached(id) {
            return Ok(Some(object));
        }

        let options = QueryOptions::new().unrestricted();
        match self.query(&where_util::eq(ID_FIELD, id), &options).await {
            Ok(result) => result
                .into_iter()
                .next()
                .map(|record| self.materialize(record))
                .transpose(),
            Err(err) if err.is_malformed_request() => {
                debug!(sobject = %self.name(), id, error = %err, "Lookup rejected, treating as absent");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Look up an object by a key the profile understands (for `Case` a
    /// case number, for `User` an alias), falling back to treating the key
    /// as an `Id`.
    pub async fn get(&self, key: &str) -> Result<Option<SfObject>> {
        let (filter, unrestricted) = match self.inner.profile.key_lookup(key) {
            KeyLookup::Id(id) => return self.by_id(&id).await,
            KeyLookup::Filter {
                filter,
                unrestricted,
            } => (filter, unrestricted),
        };

        let mut options = QueryOptions::new();
        options.unrestricted = unrestricted;
        match self.query(&filter, &options).await {
            Ok(result) => {
                if let Some(record) = result.into_iter().next() {
                    return self.materialize(record).map(Some);
                }
            }
            Err(err) if err.is_malformed_request() => {
                debug!(sobject = %self.name(), key, error = %err, "Key lookup rejected");
            }
            Err(err) => return Err(err),
        }
        self.by_id(key).await
    }
}
