//! Guest RSVPs, their short ids, and reception check-in.

use super::{decode_all, require, ServiceError, ServiceResult};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use wedding_core::document::{encode, Collection, DocumentStore};
use wedding_core::environment::Clock;

const RESOURCE: &str = "RSVP";

/// Length of a guest-facing RSVP id
pub const RSVP_ID_LEN: usize = 8;

const RSVP_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Draw a fresh 8-character `[A-Z0-9]` RSVP id.
#[must_use]
pub fn generate_rsvp_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..RSVP_ID_LEN)
        .map(|_| char::from(RSVP_ID_ALPHABET[rng.gen_range(0..RSVP_ID_ALPHABET.len())]))
        .collect()
}

/// Whether `id` has the 8-character `[A-Z0-9]` shape.
#[must_use]
pub fn is_valid_rsvp_id(id: &str) -> bool {
    id.len() == RSVP_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// Will the guest come
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Attendance {
    /// Coming
    Attending,
    /// Not coming
    NotAttending,
    /// Undecided
    Maybe,
}

impl Attendance {
    /// Parse a wire name
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        serde_json::from_value(Value::String(value.to_string())).ok()
    }
}

/// Which parts of the day the guest attends
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Church only
    Ceremony,
    /// Party only
    Reception,
    /// Both
    Both,
}

/// One person on an RSVP
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpGuest {
    /// Full name
    pub name: String,
    /// Email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Dietary needs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dietary_restrictions: Option<String>,
    /// Bringing someone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plus_one: Option<bool>,
    /// Their name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plus_one_name: Option<String>,
}

/// A stored RSVP
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rsvp {
    /// Document id
    #[serde(default)]
    pub id: String,
    /// Guest-facing id; legacy records may lack it
    #[serde(default)]
    pub rsvp_id: String,
    /// Person who replied
    pub primary_guest: RsvpGuest,
    /// Reply
    pub attendance: Attendance,
    /// Parts of the day
    pub event_type: EventType,
    /// Head count including the primary guest
    pub number_of_guests: u32,
    /// Everyone else on the reply
    #[serde(default)]
    pub guests: Vec<RsvpGuest>,
    /// Free text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    /// Reply received
    #[serde(default)]
    pub responded: bool,
    /// Arrived at the reception
    #[serde(default)]
    pub checked_in: bool,
    /// Assigned table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_group_id: Option<String>,
    /// Created
    pub created_at: DateTime<Utc>,
    /// Last changed
    pub updated_at: DateTime<Utc>,
    /// Staff confirmation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// Reply submitted by a guest
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRsvp {
    /// Person replying
    pub primary_guest: RsvpGuest,
    /// Reply
    pub attendance: Attendance,
    /// Parts of the day
    pub event_type: EventType,
    /// Head count
    #[serde(default = "one")]
    pub number_of_guests: u32,
    /// Everyone else
    #[serde(default)]
    pub guests: Vec<RsvpGuest>,
    /// Free text
    #[serde(default)]
    pub special_requests: Option<String>,
    /// Defaults to true: submitting is responding
    #[serde(default = "yes")]
    pub responded: bool,
    /// Table assignment
    #[serde(default)]
    pub table_group_id: Option<String>,
}

const fn one() -> u32 {
    1
}

const fn yes() -> bool {
    true
}

/// Head counts across every RSVP
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpStats {
    /// Records
    pub total_invited: usize,
    /// Records with a reply
    pub total_responded: usize,
    /// Attending replies
    pub attending: usize,
    /// Declines
    pub not_attending: usize,
    /// Undecided
    pub maybe: usize,
    /// Ceremony only
    pub ceremony_only: usize,
    /// Reception only
    pub reception_only: usize,
    /// Both parts
    pub both: usize,
    /// Sum of head counts
    pub total_guest_count: u64,
}

impl RsvpStats {
    /// Tally a set of RSVPs
    #[must_use]
    pub fn from_rsvps(rsvps: &[Rsvp]) -> Self {
        let count = |pred: &dyn Fn(&Rsvp) -> bool| rsvps.iter().filter(|r| pred(r)).count();
        Self {
            total_invited: rsvps.len(),
            total_responded: count(&|r| r.responded),
            attending: count(&|r| r.attendance == Attendance::Attending),
            not_attending: count(&|r| r.attendance == Attendance::NotAttending),
            maybe: count(&|r| r.attendance == Attendance::Maybe),
            ceremony_only: count(&|r| r.event_type == EventType::Ceremony),
            reception_only: count(&|r| r.event_type == EventType::Reception),
            both: count(&|r| r.event_type == EventType::Both),
            total_guest_count: rsvps.iter().map(|r| u64::from(r.number_of_guests)).sum(),
        }
    }
}

/// RSVP records in the `rsvps` collection
#[derive(Clone)]
pub struct RsvpService {
    docs: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl RsvpService {
    /// Create the service over a document store
    #[must_use]
    pub fn new(docs: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { docs, clock }
    }

    /// Store a reply under a fresh RSVP id.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] without a primary guest name;
    /// [`ServiceError::Document`] if storing fails.
    #[tracing::instrument(skip(self, reply))]
    pub async fn create(&self, reply: NewRsvp) -> ServiceResult<Rsvp> {
        require("primaryGuest.name", &reply.primary_guest.name)?;

        let now = self.clock.now();
        let mut rsvp = Rsvp {
            id: String::new(),
            rsvp_id: generate_rsvp_id(&mut rand::thread_rng()),
            primary_guest: reply.primary_guest,
            attendance: reply.attendance,
            event_type: reply.event_type,
            number_of_guests: reply.number_of_guests.max(1),
            guests: reply.guests,
            special_requests: reply.special_requests,
            responded: reply.responded,
            checked_in: false,
            table_group_id: reply.table_group_id,
            created_at: now,
            updated_at: now,
            confirmed_at: None,
        };

        rsvp.id = self.docs.create(Collection::Rsvps, encode(&rsvp)?).await?;
        tracing::info!(id = %rsvp.id, rsvp_id = %rsvp.rsvp_id, "RSVP created");
        Ok(rsvp)
    }

    /// Every RSVP, newest first.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Document`] if the read fails.
    pub async fn list(&self) -> ServiceResult<Vec<Rsvp>> {
        let docs = self.docs.list(Collection::Rsvps).await?;
        let mut rsvps: Vec<Rsvp> = decode_all(RESOURCE, docs);
        rsvps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rsvps)
    }

    /// Fetch one RSVP by document id.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Document`] if the read fails or the record is malformed.
    pub async fn get(&self, id: &str) -> ServiceResult<Option<Rsvp>> {
        match self.docs.get(Collection::Rsvps, id).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// Merge top-level fields into an RSVP and bump `updatedAt`.
    ///
    /// `id`, `rsvpId` and `createdAt` cannot be changed this way.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] for a non-object patch;
    /// [`ServiceError::NotFound`] if the RSVP does not exist.
    pub async fn update(&self, id: &str, patch: Value) -> ServiceResult<()> {
        let Value::Object(mut fields) = patch else {
            return Err(ServiceError::validation("RSVP updates must be a JSON object"));
        };
        for locked in ["id", "rsvpId", "createdAt"] {
            fields.remove(locked);
        }
        fields.insert("updatedAt".into(), json!(self.clock.now()));
        self.patch(id, Value::Object(fields)).await
    }

    /// Remove an RSVP.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Document`] if the delete fails.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.docs.delete(Collection::Rsvps, id).await?;
        Ok(())
    }

    /// Head counts across every RSVP.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Document`] if the read fails.
    pub async fn stats(&self) -> ServiceResult<RsvpStats> {
        Ok(RsvpStats::from_rsvps(&self.list().await?))
    }

    /// RSVPs with one reply, newest first.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Document`] if the read fails.
    pub async fn by_attendance(&self, attendance: Attendance) -> ServiceResult<Vec<Rsvp>> {
        let mut rsvps = self.list().await?;
        rsvps.retain(|rsvp| rsvp.attendance == attendance);
        Ok(rsvps)
    }

    /// Give every RSVP with a missing or malformed id a fresh one.
    ///
    /// Reads raw documents so records too old to decode still get fixed.
    /// Returns how many were rewritten.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Document`] if a read or write fails.
    #[tracing::instrument(skip(self))]
    pub async fn migrate_ids(&self) -> ServiceResult<usize> {
        let docs = self.docs.list(Collection::Rsvps).await?;
        let mut migrated = 0;

        for doc in docs {
            let current = doc.field("rsvpId").and_then(Value::as_str).unwrap_or("");
            if is_valid_rsvp_id(current) {
                continue;
            }
            let fresh = generate_rsvp_id(&mut rand::thread_rng());
            tracing::debug!(id = %doc.id, old = current, new = %fresh, "Migrating RSVP id");
            self.docs
                .update(
                    Collection::Rsvps,
                    &doc.id,
                    json!({ "rsvpId": fresh, "updatedAt": self.clock.now() }),
                )
                .await?;
            migrated += 1;
        }

        tracing::info!(migrated, "RSVP id migration finished");
        Ok(migrated)
    }

    /// Mark a guest as arrived.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the RSVP does not exist.
    pub async fn check_in(&self, id: &str) -> ServiceResult<()> {
        self.set_checked_in(id, true).await
    }

    /// Undo a check-in.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the RSVP does not exist.
    pub async fn check_out(&self, id: &str) -> ServiceResult<()> {
        self.set_checked_in(id, false).await
    }

    async fn set_checked_in(&self, id: &str, checked_in: bool) -> ServiceResult<()> {
        self.patch(
            id,
            json!({ "checkedIn": checked_in, "updatedAt": self.clock.now() }),
        )
        .await
    }

    async fn patch(&self, id: &str, patch: Value) -> ServiceResult<()> {
        self.docs
            .update(Collection::Rsvps, id, patch)
            .await
            .map_err(|err| ServiceError::from_document(RESOURCE, err))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use wedding_testing::{test_clock, InMemoryDocumentStore};

    fn service(docs: &InMemoryDocumentStore) -> RsvpService {
        RsvpService::new(Arc::new(docs.clone()), Arc::new(test_clock()))
    }

    fn reply(name: &str, attendance: Attendance, event_type: EventType, guests: u32) -> NewRsvp {
        NewRsvp {
            primary_guest: RsvpGuest {
                name: name.into(),
                ..RsvpGuest::default()
            },
            attendance,
            event_type,
            number_of_guests: guests,
            guests: vec![],
            special_requests: None,
            responded: true,
            table_group_id: None,
        }
    }

    proptest! {
        #[test]
        fn generated_ids_are_well_formed(seed in any::<u64>()) {
            let id = generate_rsvp_id(&mut StdRng::seed_from_u64(seed));
            prop_assert!(is_valid_rsvp_id(&id));
        }
    }

    #[test]
    fn id_shape_check() {
        assert!(is_valid_rsvp_id("AB12CD34"));
        assert!(!is_valid_rsvp_id("ab12cd34"));
        assert!(!is_valid_rsvp_id("AB12CD3"));
        assert!(!is_valid_rsvp_id("AB12-D34"));
    }

    #[tokio::test]
    async fn create_assigns_an_rsvp_id() {
        let docs = InMemoryDocumentStore::new();
        let rsvp = service(&docs)
            .create(reply("Ada Obi", Attendance::Attending, EventType::Both, 2))
            .await
            .unwrap();

        assert!(is_valid_rsvp_id(&rsvp.rsvp_id));
        assert_eq!(rsvp.created_at, test_clock().now());
        let body = docs.body(Collection::Rsvps, &rsvp.id).unwrap();
        assert_eq!(body["attendance"], "attending");
        assert_eq!(body["checkedIn"], false);
    }

    #[tokio::test]
    async fn create_requires_a_name() {
        let docs = InMemoryDocumentStore::new();
        let err = service(&docs)
            .create(reply(" ", Attendance::Maybe, EventType::Both, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn stats_and_attendance_filter() {
        let docs = InMemoryDocumentStore::new();
        let rsvps = service(&docs);
        rsvps.create(reply("A", Attendance::Attending, EventType::Both, 2)).await.unwrap();
        rsvps.create(reply("B", Attendance::NotAttending, EventType::Ceremony, 1)).await.unwrap();
        let mut undecided = reply("C", Attendance::Maybe, EventType::Reception, 3);
        undecided.responded = false;
        rsvps.create(undecided).await.unwrap();

        let stats = rsvps.stats().await.unwrap();
        assert_eq!(
            stats,
            RsvpStats {
                total_invited: 3,
                total_responded: 2,
                attending: 1,
                not_attending: 1,
                maybe: 1,
                ceremony_only: 1,
                reception_only: 1,
                both: 1,
                total_guest_count: 6,
            }
        );

        let attending = rsvps.by_attendance(Attendance::Attending).await.unwrap();
        assert_eq!(attending.len(), 1);
        assert_eq!(attending[0].primary_guest.name, "A");
    }

    #[tokio::test]
    async fn migration_only_touches_invalid_ids() {
        let docs = InMemoryDocumentStore::new();
        let created = test_clock().now();
        let legacy = |rsvp_id: Option<&str>| {
            let mut body = json!({
                "primaryGuest": { "name": "Guest" },
                "attendance": "attending",
                "eventType": "both",
                "numberOfGuests": 1,
                "createdAt": created,
                "updatedAt": created,
            });
            if let Some(id) = rsvp_id {
                body["rsvpId"] = json!(id);
            }
            body
        };
        docs.insert(Collection::Rsvps, "good", legacy(Some("ABCD1234")));
        docs.insert(Collection::Rsvps, "short", legacy(Some("ABC")));
        docs.insert(Collection::Rsvps, "lower", legacy(Some("abcd1234")));
        docs.insert(Collection::Rsvps, "missing", legacy(None));

        let rsvps = service(&docs);
        assert_eq!(rsvps.migrate_ids().await.unwrap(), 3);

        assert_eq!(docs.body(Collection::Rsvps, "good").unwrap()["rsvpId"], "ABCD1234");
        for id in ["short", "lower", "missing"] {
            let body = docs.body(Collection::Rsvps, id).unwrap();
            assert!(is_valid_rsvp_id(body["rsvpId"].as_str().unwrap()), "{id}");
        }
        assert_eq!(rsvps.migrate_ids().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_protects_identity_fields_and_check_in_toggles() {
        let docs = InMemoryDocumentStore::new();
        let rsvps = service(&docs);
        let rsvp = rsvps
            .create(reply("Ada", Attendance::Maybe, EventType::Both, 1))
            .await
            .unwrap();

        rsvps
            .update(&rsvp.id, json!({ "attendance": "attending", "rsvpId": "HACKED00" }))
            .await
            .unwrap();
        rsvps.check_in(&rsvp.id).await.unwrap();

        let stored = rsvps.get(&rsvp.id).await.unwrap().unwrap();
        assert_eq!(stored.attendance, Attendance::Attending);
        assert_eq!(stored.rsvp_id, rsvp.rsvp_id);
        assert!(stored.checked_in);

        rsvps.check_out(&rsvp.id).await.unwrap();
        assert!(!rsvps.get(&rsvp.id).await.unwrap().unwrap().checked_in);

        assert!(matches!(
            rsvps.check_in("missing").await,
            Err(ServiceError::NotFound { .. })
        ));

        rsvps.delete(&rsvp.id).await.unwrap();
        assert!(rsvps.get(&rsvp.id).await.unwrap().is_none());
    }
}
