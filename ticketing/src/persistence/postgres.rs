//! `PostgreSQL` persistence.
//!
//! One table per entity. Every `save` runs in a single transaction and upserts by
//! primary key, so replaying the same changes is harmless. Claims keep their audit
//! trail in a JSONB column.

use super::{next_booking_number, Changes, Persistence, PersistenceError, PersistenceFuture};
use crate::aggregates::confirmation::ClaimSubmission;
use crate::aggregates::{AuditNote, ClaimStatus, EventInventory, PaymentClaim};
use crate::types::{
    Booking, BookingId, Category, ClaimId, Customer, Event, EventId, Money, PaymentMethod,
    TicketingState, Tier, UserId,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

const SCHEMA: [&str; 6] = [
    r"
    CREATE TABLE IF NOT EXISTS categories (
        slug TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS events (
        id UUID PRIMARY KEY,
        category TEXT NOT NULL REFERENCES categories(slug) ON DELETE CASCADE,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        date DATE NOT NULL,
        time TIME,
        location TEXT NOT NULL,
        organizer_name TEXT NOT NULL,
        organizer_phone TEXT NOT NULL,
        vip_remaining BIGINT NOT NULL CHECK (vip_remaining >= 0),
        gold_remaining BIGINT NOT NULL CHECK (gold_remaining >= 0),
        standard_remaining BIGINT NOT NULL CHECK (standard_remaining >= 0)
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS bookings (
        id UUID PRIMARY KEY,
        number BIGINT NOT NULL UNIQUE,
        customer_id UUID NOT NULL,
        customer_username TEXT NOT NULL,
        customer_email TEXT,
        event_id UUID NOT NULL REFERENCES events(id) ON DELETE CASCADE,
        tier TEXT NOT NULL,
        quantity BIGINT NOT NULL CHECK (quantity > 0),
        unit_price BIGINT NOT NULL,
        total_price BIGINT NOT NULL,
        booked_at TIMESTAMPTZ NOT NULL,
        claim_id UUID
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS payment_claims (
        id UUID PRIMARY KEY,
        booking_id UUID NOT NULL UNIQUE REFERENCES bookings(id) ON DELETE CASCADE,
        method TEXT NOT NULL,
        amount BIGINT NOT NULL,
        status TEXT NOT NULL,
        contact TEXT,
        proof_reference TEXT,
        transaction_reference TEXT NOT NULL UNIQUE,
        notes JSONB NOT NULL DEFAULT '[]',
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_bookings_customer ON bookings(customer_id)",
    "CREATE INDEX IF NOT EXISTS idx_payment_claims_status ON payment_claims(status)",
];

/// Ticketing state stored in `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Connect with a pool of at most `max_connections`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Database`] if the database is unreachable.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, PersistenceError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(database)?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the tables if they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Database`] if a statement fails.
    pub async fn migrate(&self) -> Result<(), PersistenceError> {
        let mut conn = self.pool.acquire().await.map_err(database)?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut *conn).await.map_err(database)?;
        }
        tracing::info!("Database schema ready");
        Ok(())
    }

    async fn load_state(&self) -> Result<TicketingState, PersistenceError> {
        let mut state = TicketingState::new();

        for row in sqlx::query("SELECT slug, name FROM categories")
            .fetch_all(&self.pool)
            .await
            .map_err(database)?
        {
            let category = Category {
                slug: column(&row, "categories", "slug")?,
                name: column(&row, "categories", "name")?,
            };
            state.categories.insert(category.slug.clone(), category);
        }

        for row in sqlx::query(
            r"
            SELECT id, category, title, description, date, time, location, organizer_name,
                   organizer_phone, vip_remaining, gold_remaining, standard_remaining
            FROM events
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(database)?
        {
            let event = event_from_row(&row)?;
            state.events.insert(event.id, event);
        }

        for row in sqlx::query(
            r"
            SELECT id, number, customer_id, customer_username, customer_email, event_id, tier,
                   quantity, unit_price, total_price, booked_at, claim_id
            FROM bookings
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(database)?
        {
            let booking = booking_from_row(&row)?;
            state.bookings.insert(booking.id, booking);
        }

        for row in sqlx::query(
            r"
            SELECT id, booking_id, method, amount, status, contact, proof_reference,
                   transaction_reference, notes, created_at, updated_at
            FROM payment_claims
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(database)?
        {
            let claim = claim_from_row(&row)?;
            state.claims.insert(claim.id, claim);
        }

        state.next_booking_number = next_booking_number(&state);
        tracing::info!(
            categories = state.categories.len(),
            events = state.events.len(),
            bookings = state.bookings.len(),
            claims = state.claims.len(),
            "Ticketing state loaded"
        );
        Ok(state)
    }

    async fn save_changes(&self, changes: &Changes) -> Result<(), PersistenceError> {
        let mut tx = self.pool.begin().await.map_err(database)?;

        for category in &changes.categories {
            sqlx::query(
                r"
                INSERT INTO categories (slug, name) VALUES ($1, $2)
                ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
                ",
            )
            .bind(&category.slug)
            .bind(&category.name)
            .execute(&mut *tx)
            .await
            .map_err(database)?;
        }
        for event in &changes.events {
            upsert_event(&mut tx, event).await?;
        }
        for booking in &changes.bookings {
            upsert_booking(&mut tx, booking).await?;
        }
        for claim in &changes.claims {
            upsert_claim(&mut tx, claim).await?;
        }

        tx.commit().await.map_err(database)?;
        Ok(())
    }
}

impl Persistence for PostgresPersistence {
    fn load(&self) -> PersistenceFuture<'_, TicketingState> {
        Box::pin(self.load_state())
    }

    fn save<'a>(&'a self, changes: &'a Changes) -> PersistenceFuture<'a, ()> {
        Box::pin(self.save_changes(changes))
    }
}

async fn upsert_event(tx: &mut Transaction<'_, Postgres>, event: &Event) -> Result<(), PersistenceError> {
    sqlx::query(
        r"
        INSERT INTO events (
            id, category, title, description, date, time, location, organizer_name,
            organizer_phone, vip_remaining, gold_remaining, standard_remaining
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (id) DO UPDATE SET
            vip_remaining = EXCLUDED.vip_remaining,
            gold_remaining = EXCLUDED.gold_remaining,
            standard_remaining = EXCLUDED.standard_remaining
        ",
    )
    .bind(event.id.as_uuid())
    .bind(&event.category)
    .bind(&event.title)
    .bind(&event.description)
    .bind(event.date)
    .bind(event.time)
    .bind(&event.location)
    .bind(&event.organizer_name)
    .bind(&event.organizer_phone)
    .bind(i64::from(event.inventory.remaining(Tier::Vip)))
    .bind(i64::from(event.inventory.remaining(Tier::Gold)))
    .bind(i64::from(event.inventory.remaining(Tier::Standard)))
    .execute(&mut **tx)
    .await
    .map_err(database)?;
    Ok(())
}

async fn upsert_booking(tx: &mut Transaction<'_, Postgres>, booking: &Booking) -> Result<(), PersistenceError> {
    sqlx::query(
        r"
        INSERT INTO bookings (
            id, number, customer_id, customer_username, customer_email, event_id, tier,
            quantity, unit_price, total_price, booked_at, claim_id
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (id) DO UPDATE SET claim_id = EXCLUDED.claim_id
        ",
    )
    .bind(booking.id.as_uuid())
    .bind(signed(booking.number)?)
    .bind(booking.customer.id.as_uuid())
    .bind(&booking.customer.username)
    .bind(booking.customer.email.as_deref())
    .bind(booking.event_id.as_uuid())
    .bind(booking.tier.as_str())
    .bind(i64::from(booking.quantity))
    .bind(signed(booking.unit_price.amount())?)
    .bind(signed(booking.total_price.amount())?)
    .bind(booking.booked_at)
    .bind(booking.claim_id.map(|id| *id.as_uuid()))
    .execute(&mut **tx)
    .await
    .map_err(database)?;
    Ok(())
}

async fn upsert_claim(tx: &mut Transaction<'_, Postgres>, claim: &PaymentClaim) -> Result<(), PersistenceError> {
    sqlx::query(
        r"
        INSERT INTO payment_claims (
            id, booking_id, method, amount, status, contact, proof_reference,
            transaction_reference, notes, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (id) DO UPDATE SET
            status = EXCLUDED.status,
            notes = EXCLUDED.notes,
            updated_at = EXCLUDED.updated_at
        ",
    )
    .bind(claim.id.as_uuid())
    .bind(claim.booking_id.as_uuid())
    .bind(claim.method.as_str())
    .bind(signed(claim.amount.amount())?)
    .bind(claim.status().as_str())
    .bind(claim.contact.as_deref())
    .bind(claim.proof_reference.as_deref())
    .bind(&claim.transaction_reference)
    .bind(Json(claim.notes()))
    .bind(claim.created_at)
    .bind(claim.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(database)?;
    Ok(())
}

fn event_from_row(row: &PgRow) -> Result<Event, PersistenceError> {
    const TABLE: &str = "events";
    let seats = |name: &str| -> Result<u32, PersistenceError> {
        let value: i64 = column(row, TABLE, name)?;
        u32::try_from(value).map_err(|_| corrupt(TABLE, format!("{name} = {value}")))
    };

    Ok(Event {
        id: EventId::from_uuid(column(row, TABLE, "id")?),
        category: column(row, TABLE, "category")?,
        title: column(row, TABLE, "title")?,
        description: column(row, TABLE, "description")?,
        date: column::<NaiveDate>(row, TABLE, "date")?,
        time: column::<Option<NaiveTime>>(row, TABLE, "time")?,
        location: column(row, TABLE, "location")?,
        organizer_name: column(row, TABLE, "organizer_name")?,
        organizer_phone: column(row, TABLE, "organizer_phone")?,
        inventory: EventInventory::new(
            seats("vip_remaining")?,
            seats("gold_remaining")?,
            seats("standard_remaining")?,
        ),
    })
}

fn booking_from_row(row: &PgRow) -> Result<Booking, PersistenceError> {
    const TABLE: &str = "bookings";
    let tier: String = column(row, TABLE, "tier")?;
    let quantity: i64 = column(row, TABLE, "quantity")?;

    Ok(Booking {
        id: BookingId::from_uuid(column(row, TABLE, "id")?),
        number: unsigned(TABLE, column(row, TABLE, "number")?)?,
        customer: Customer::new(
            UserId::from_uuid(column(row, TABLE, "customer_id")?),
            column::<String>(row, TABLE, "customer_username")?,
            column(row, TABLE, "customer_email")?,
        ),
        event_id: EventId::from_uuid(column(row, TABLE, "event_id")?),
        tier: tier.parse().map_err(|_| corrupt(TABLE, format!("tier = {tier}")))?,
        quantity: u32::try_from(quantity).map_err(|_| corrupt(TABLE, format!("quantity = {quantity}")))?,
        unit_price: Money::new(unsigned(TABLE, column(row, TABLE, "unit_price")?)?),
        total_price: Money::new(unsigned(TABLE, column(row, TABLE, "total_price")?)?),
        booked_at: column::<DateTime<Utc>>(row, TABLE, "booked_at")?,
        claim_id: column::<Option<Uuid>>(row, TABLE, "claim_id")?.map(ClaimId::from_uuid),
    })
}

fn claim_from_row(row: &PgRow) -> Result<PaymentClaim, PersistenceError> {
    const TABLE: &str = "payment_claims";
    let method: String = column(row, TABLE, "method")?;
    let status: String = column(row, TABLE, "status")?;
    let Json(notes): Json<Vec<AuditNote>> = column(row, TABLE, "notes")?;

    let submission = ClaimSubmission {
        id: ClaimId::from_uuid(column(row, TABLE, "id")?),
        booking_id: BookingId::from_uuid(column(row, TABLE, "booking_id")?),
        method: method
            .parse::<PaymentMethod>()
            .map_err(|_| corrupt(TABLE, format!("method = {method}")))?,
        amount: Money::new(unsigned(TABLE, column(row, TABLE, "amount")?)?),
        contact: column(row, TABLE, "contact")?,
        proof_reference: column(row, TABLE, "proof_reference")?,
        transaction_reference: column(row, TABLE, "transaction_reference")?,
    };
    Ok(PaymentClaim::restored(
        submission,
        status.parse::<ClaimStatus>().map_err(|reason| corrupt(TABLE, reason))?,
        notes,
        column(row, TABLE, "created_at")?,
        column(row, TABLE, "updated_at")?,
    ))
}

fn column<'r, T>(row: &'r PgRow, table: &'static str, name: &str) -> Result<T, PersistenceError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name).map_err(|e| corrupt(table, format!("{name}: {e}")))
}

fn signed(value: u64) -> Result<i64, PersistenceError> {
    i64::try_from(value).map_err(|_| PersistenceError::OutOfRange(value.to_string()))
}

fn unsigned(table: &'static str, value: i64) -> Result<u64, PersistenceError> {
    u64::try_from(value).map_err(|_| corrupt(table, format!("negative value {value}")))
}

fn corrupt(table: &'static str, reason: String) -> PersistenceError {
    PersistenceError::Corrupt { table, reason }
}

#[allow(clippy::needless_pass_by_value)]
fn database(error: sqlx::Error) -> PersistenceError {
    PersistenceError::Database(error.to_string())
}
