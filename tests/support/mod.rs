//! Shared fixture domain for the test suite: a customer aggregate with
//! has-one, belongs-to, and has-many relations, hand-mapped to storage
//! records the way a storage package would do it.
#![allow(dead_code)]

use storemap::prelude::*;

// ---------------------------------------------------------------------------
// Domain entities (plain, storage-oblivious)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Customer {
    pub id: Uuid,
    pub given_name: String,
    pub family_name: String,
    pub profile: Option<Profile>,
    pub location: Option<Location>,
    pub addresses: Vec<Address>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub about: String,
    pub favorite_color: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location {
    pub id: Uuid,
    pub latitude: String,
    pub longitude: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub id: Uuid,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditEntry {
    pub id: Uuid,
    pub action: String,
    pub customer_id: Uuid,
}

// ---------------------------------------------------------------------------
// Storage records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, FromRow)]
pub struct CustomerRecord {
    pub id: Uuid,
    pub given_name: String,
    pub family_name: String,
    pub profile_id: Option<Uuid>,
    #[sqlx(skip)]
    pub profile: Option<ProfileRecord>,
    #[sqlx(skip)]
    pub location: Option<LocationRecord>,
    #[sqlx(skip)]
    pub addresses: Vec<AddressRecord>,
}

#[derive(Debug, Clone, Default, FromRow)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub about: String,
    pub favorite_color: String,
}

impl ProfileRecord {
    fn row(&self) -> TableRow {
        TableRow {
            table: "profiles",
            columns: &["id", "about", "favorite_color"],
            values: vec![json!(self.id), json!(self.about), json!(self.favorite_color)],
        }
    }
}

#[derive(Debug, Clone, Default, FromRow)]
pub struct LocationRecord {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub latitude: String,
    pub longitude: String,
}

impl LocationRecord {
    fn row(&self) -> TableRow {
        TableRow {
            table: "locations",
            columns: &["id", "customer_id", "latitude", "longitude"],
            values: vec![
                json!(self.id),
                json!(self.customer_id),
                json!(self.latitude),
                json!(self.longitude),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, FromRow)]
pub struct AddressRecord {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl AddressRecord {
    fn row(&self) -> TableRow {
        TableRow {
            table: "addresses",
            columns: &["id", "customer_id", "street", "city", "state", "zip"],
            values: vec![
                json!(self.id),
                json!(self.customer_id),
                json!(self.street),
                json!(self.city),
                json!(self.state),
                json!(self.zip),
            ],
        }
    }
}

impl TableMetadata for CustomerRecord {
    fn table_name() -> &'static str {
        "customers"
    }

    fn table_alias() -> &'static str {
        "customer"
    }

    fn primary_key_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "given_name", "family_name", "profile_id"]
    }

    fn primary_key_value(&self) -> serde_json::Value {
        json!(self.id)
    }

    fn row(&self) -> TableRow {
        TableRow {
            table: Self::table_name(),
            columns: Self::columns(),
            values: vec![
                json!(self.id),
                json!(self.given_name),
                json!(self.family_name),
                json!(self.profile_id),
            ],
        }
    }

    fn relations(&self) -> Vec<Relation> {
        vec![
            Relation {
                name: "profile",
                kind: RelationKind::HasOne,
                table: "profiles",
                foreign_key: vec![("id", json!(self.profile_id))],
                rows: self.profile.iter().map(ProfileRecord::row).collect(),
            },
            Relation {
                name: "location",
                kind: RelationKind::BelongsTo,
                table: "locations",
                foreign_key: vec![("customer_id", json!(self.id))],
                rows: self.location.iter().map(LocationRecord::row).collect(),
            },
            Relation {
                name: "addresses",
                kind: RelationKind::HasMany,
                table: "addresses",
                foreign_key: vec![("customer_id", json!(self.id))],
                rows: self.addresses.iter().map(AddressRecord::row).collect(),
            },
        ]
    }
}

impl Model for CustomerRecord {
    type Entity = Customer;

    fn from_entity(&mut self, entity: &Customer) -> anyhow::Result<()> {
        self.id = entity.id;
        self.given_name = entity.given_name.clone();
        self.family_name = entity.family_name.clone();

        if let Some(profile) = &entity.profile {
            self.profile = Some(ProfileRecord {
                id: profile.id,
                about: profile.about.clone(),
                favorite_color: profile.favorite_color.clone(),
            });
            self.profile_id = Some(profile.id);
        }

        if let Some(location) = &entity.location {
            self.location = Some(LocationRecord {
                id: location.id,
                customer_id: self.id,
                latitude: location.latitude.clone(),
                longitude: location.longitude.clone(),
            });
        }

        for address in &entity.addresses {
            self.addresses.push(AddressRecord {
                id: address.id,
                customer_id: self.id,
                street: address.street.clone(),
                city: address.city.clone(),
                state: address.state.clone(),
                zip: address.zip.clone(),
            });
        }

        Ok(())
    }

    fn to_entity(&self) -> anyhow::Result<Customer> {
        let mut entity = Customer {
            id: self.id,
            given_name: self.given_name.clone(),
            family_name: self.family_name.clone(),
            profile: None,
            location: None,
            addresses: Vec::new(),
        };

        if let Some(profile) = &self.profile {
            entity.profile = Some(Profile {
                id: profile.id,
                about: profile.about.clone(),
                favorite_color: profile.favorite_color.clone(),
            });
        }

        if let Some(location) = &self.location {
            entity.location = Some(Location {
                id: location.id,
                latitude: location.latitude.clone(),
                longitude: location.longitude.clone(),
            });
        }

        for address in &self.addresses {
            entity.addresses.push(Address {
                id: address.id,
                street: address.street.clone(),
                city: address.city.clone(),
                state: address.state.clone(),
                zip: address.zip.clone(),
            });
        }

        Ok(entity)
    }
}

#[async_trait]
impl FetchRelated for CustomerRecord {
    async fn fetch_related(&mut self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        if let Some(profile_id) = self.profile_id {
            self.profile = sqlx::query_as::<_, ProfileRecord>(
                "SELECT id, about, favorite_color FROM profiles WHERE id = $1",
            )
            .bind(profile_id)
            .fetch_optional(&mut *conn)
            .await?;
        }

        self.location = sqlx::query_as::<_, LocationRecord>(
            "SELECT id, customer_id, latitude, longitude FROM locations WHERE customer_id = $1",
        )
        .bind(self.id)
        .fetch_optional(&mut *conn)
        .await?;

        self.addresses = sqlx::query_as::<_, AddressRecord>(
            "SELECT id, customer_id, street, city, state, zip FROM addresses \
             WHERE customer_id = $1 ORDER BY street",
        )
        .bind(self.id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl Hooks for CustomerRecord {
    async fn before_save(&self, store: &Store, entity: &Customer) -> anyhow::Result<()> {
        if entity.family_name == "Rejected" {
            anyhow::bail!("save rejected by hook");
        }

        store
            .save(&AuditEntry {
                id: Uuid::new_v4(),
                action: "save".to_string(),
                customer_id: entity.id,
            })
            .await?;
        Ok(())
    }

    async fn before_delete(&self, store: &Store, entity: &Customer) -> anyhow::Result<()> {
        store
            .save(&AuditEntry {
                id: Uuid::new_v4(),
                action: "delete".to_string(),
                customer_id: entity.id,
            })
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, FromRow)]
pub struct AuditEntryRecord {
    pub id: Uuid,
    pub action: String,
    pub customer_id: Uuid,
}

impl TableMetadata for AuditEntryRecord {
    fn table_name() -> &'static str {
        "audit_entries"
    }

    fn table_alias() -> &'static str {
        "audit_entry"
    }

    fn primary_key_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "action", "customer_id"]
    }

    fn primary_key_value(&self) -> serde_json::Value {
        json!(self.id)
    }

    fn row(&self) -> TableRow {
        TableRow {
            table: Self::table_name(),
            columns: Self::columns(),
            values: vec![json!(self.id), json!(self.action), json!(self.customer_id)],
        }
    }

    fn relations(&self) -> Vec<Relation> {
        Vec::new()
    }
}

impl Model for AuditEntryRecord {
    type Entity = AuditEntry;

    fn from_entity(&mut self, entity: &AuditEntry) -> anyhow::Result<()> {
        self.id = entity.id;
        self.action = entity.action.clone();
        self.customer_id = entity.customer_id;
        Ok(())
    }

    fn to_entity(&self) -> anyhow::Result<AuditEntry> {
        Ok(AuditEntry {
            id: self.id,
            action: self.action.clone(),
            customer_id: self.customer_id,
        })
    }
}

#[async_trait]
impl FetchRelated for AuditEntryRecord {
    async fn fetch_related(&mut self, _conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Registries and database wiring
// ---------------------------------------------------------------------------

const CUSTOMER_FIELDS: &[(&str, &str)] = &[
    ("GivenName", "given_name"),
    ("FamilyName", "family_name"),
];

pub fn registry() -> Registry {
    Mappings::new()
        .model::<CustomerRecord>(CUSTOMER_FIELDS)
        .model::<AuditEntryRecord>(&[("Action", "action")])
        .build()
}

/// Same mappings, with the customer's save/delete hooks enabled.
pub fn hooked_registry() -> Registry {
    Mappings::new()
        .hooked_model::<CustomerRecord>(CUSTOMER_FIELDS)
        .model::<AuditEntryRecord>(&[("Action", "action")])
        .build()
}

pub async fn connect(registry: Registry) -> (Store, PgPool) {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

    let pool = PgPool::connect(&database_url)
        .await
        .expect("connecting to PostgreSQL");

    create_schema(&pool).await;

    (Store::new(pool.clone(), registry), pool)
}

async fn create_schema(pool: &PgPool) {
    let ddl = [
        "CREATE TABLE IF NOT EXISTS customers (
            id UUID PRIMARY KEY,
            given_name TEXT NOT NULL,
            family_name TEXT NOT NULL,
            profile_id UUID
        )",
        "CREATE TABLE IF NOT EXISTS profiles (
            id UUID PRIMARY KEY,
            about TEXT NOT NULL,
            favorite_color TEXT NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS locations (
            id UUID PRIMARY KEY,
            customer_id UUID NOT NULL,
            latitude TEXT NOT NULL,
            longitude TEXT NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS addresses (
            id UUID PRIMARY KEY,
            customer_id UUID NOT NULL,
            street TEXT NOT NULL,
            city TEXT NOT NULL,
            state TEXT NOT NULL,
            zip TEXT NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS audit_entries (
            id UUID PRIMARY KEY,
            action TEXT NOT NULL,
            customer_id UUID NOT NULL
        )",
    ];

    for statement in ddl {
        sqlx::query(statement)
            .execute(pool)
            .await
            .expect("creating test schema");
    }
}

/// A customer with every relation populated. Streets are pre-sorted so deep
/// equality holds against the street-ordered relation loader.
pub fn sample_customer() -> Customer {
    Customer {
        id: Uuid::new_v4(),
        given_name: format!("John-{}", Uuid::new_v4()),
        family_name: format!("Smith-{}", Uuid::new_v4()),
        profile: Some(Profile {
            id: Uuid::new_v4(),
            about: "Hi! I'm John.".to_string(),
            favorite_color: "blue".to_string(),
        }),
        location: Some(Location {
            id: Uuid::new_v4(),
            latitude: "42.3601 N".to_string(),
            longitude: "71.0589 W".to_string(),
        }),
        addresses: vec![
            Address {
                id: Uuid::new_v4(),
                street: "131 Tremont St".to_string(),
                city: "Boston".to_string(),
                state: "MA".to_string(),
                zip: "02108".to_string(),
            },
            Address {
                id: Uuid::new_v4(),
                street: "245 Summer St".to_string(),
                city: "Boston".to_string(),
                state: "MA".to_string(),
                zip: "02210".to_string(),
            },
        ],
    }
}
