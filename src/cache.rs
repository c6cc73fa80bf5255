use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;

use crate::api::BookingApi;
use crate::error::AppError;
use crate::models::*;

#[derive(Clone)]
struct Entry<V> {
    value: V,
    created_at: Instant,
}

/// Map whose entries expire after a fixed TTL. When full, the oldest entry
/// is evicted.
pub struct TtlCache<K, V> {
    ttl: Duration,
    max_entries: usize,
    entries: HashMap<K, Entry<V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries,
            entries: HashMap::new(),
        }
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn get_at(&mut self, key: &K, now: Instant) -> Option<V> {
        self.evict_expired(now);
        self.entries.get(key).map(|e| e.value.clone())
    }

    pub fn insert_at(&mut self, key: K, value: V, now: Instant) {
        self.evict_expired(now);
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            if let Some(victim) = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.created_at)
                .map(|(k, _)| k.clone())
            {
                self.entries.remove(&victim);
            }
        }
        self.entries.insert(
            key,
            Entry {
                value,
                created_at: now,
            },
        );
    }

    pub fn invalidate(&mut self, key: &K) {
        self.entries.remove(key);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, e| now.saturating_duration_since(e.created_at) < ttl);
    }
}

const MAX_CACHED_ENTRIES: usize = 256;

struct Caches {
    courses: TtlCache<i64, Course>,
    course_slots: TtlCache<String, Course>,
    reservations: TtlCache<(), Vec<Reservation>>,
    slots: TtlCache<(), Vec<Slot>>,
    // bumped on every invalidation; a read only fills if it is unchanged
    generation: u64,
}

/// Read-through cache shared by every view that holds the same `Arc`.
/// Mutations go straight to the backend and drop every cached booking read.
pub struct CachedBookingApi {
    inner: Arc<dyn BookingApi>,
    caches: Mutex<Caches>,
}

impl CachedBookingApi {
    pub fn new(inner: Arc<dyn BookingApi>, ttl: Duration) -> Self {
        Self {
            inner,
            caches: Mutex::new(Caches {
                courses: TtlCache::new(ttl, MAX_CACHED_ENTRIES),
                course_slots: TtlCache::new(ttl, MAX_CACHED_ENTRIES),
                reservations: TtlCache::new(ttl, 1),
                slots: TtlCache::new(ttl, 1),
                generation: 0,
            }),
        }
    }

    fn with_caches<T>(&self, f: impl FnOnce(&mut Caches) -> T) -> T {
        let mut guard = self.caches.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    fn generation(&self) -> u64 {
        self.with_caches(|c| c.generation)
    }

    /// Runs `fill` only when no invalidation happened since `started`.
    fn fill_if_current(&self, started: u64, fill: impl FnOnce(&mut Caches)) {
        self.with_caches(|c| {
            if c.generation == started {
                fill(c);
            } else {
                debug!("discarding read that overlapped an invalidation");
            }
        });
    }

    /// Manual invalidation signal, e.g. after a payment completes elsewhere.
    pub fn invalidate_bookings(&self) {
        debug!("invalidating cached booking reads");
        self.with_caches(|c| {
            c.generation = c.generation.wrapping_add(1);
            c.courses.clear();
            c.course_slots.clear();
            c.reservations.clear();
            c.slots.clear();
        });
    }
}

#[async_trait]
impl BookingApi for CachedBookingApi {
    async fn get_course(&self, course_id: i64) -> Result<Course, AppError> {
        if let Some(course) = self.with_caches(|c| c.courses.get(&course_id)) {
            debug!("cache hit: course {}", course_id);
            return Ok(course);
        }
        let started = self.generation();
        let course = self.inner.get_course(course_id).await?;
        self.fill_if_current(started, |c| c.courses.insert(course_id, course.clone()));
        Ok(course)
    }

    async fn get_course_slots(&self, course_ref: &str) -> Result<Course, AppError> {
        let key = course_ref.to_string();
        if let Some(course) = self.with_caches(|c| c.course_slots.get(&key)) {
            debug!("cache hit: slots of course {}", course_ref);
            return Ok(course);
        }
        let started = self.generation();
        let course = self.inner.get_course_slots(course_ref).await?;
        self.fill_if_current(started, |c| c.course_slots.insert(key, course.clone()));
        Ok(course)
    }

    async fn get_course_sessions(&self, course_id: i64) -> Result<Vec<CourseClass>, AppError> {
        self.inner.get_course_sessions(course_id).await
    }

    async fn get_course_session(
        &self,
        course_id: i64,
        session_id: i64,
    ) -> Result<CourseClass, AppError> {
        self.inner.get_course_session(course_id, session_id).await
    }

    async fn list_slots(&self) -> Result<Vec<Slot>, AppError> {
        if let Some(slots) = self.with_caches(|c| c.slots.get(&())) {
            return Ok(slots);
        }
        let started = self.generation();
        let slots = self.inner.list_slots().await?;
        self.fill_if_current(started, |c| c.slots.insert((), slots.clone()));
        Ok(slots)
    }

    async fn list_reservations(&self) -> Result<Vec<Reservation>, AppError> {
        if let Some(reservations) = self.with_caches(|c| c.reservations.get(&())) {
            return Ok(reservations);
        }
        let started = self.generation();
        let reservations = self.inner.list_reservations().await?;
        self.fill_if_current(started, |c| c.reservations.insert((), reservations.clone()));
        Ok(reservations)
    }

    async fn create_reservation(
        &self,
        req: &NewReservationRequest,
    ) -> Result<Reservation, AppError> {
        let result = self.inner.create_reservation(req).await;
        self.invalidate_bookings();
        result
    }

    async fn cancel_reservation(&self, reservation_id: i64) -> Result<(), AppError> {
        let result = self.inner.cancel_reservation(reservation_id).await;
        self.invalidate_bookings();
        result
    }

    async fn get_reschedule_options(&self, reservation_id: i64) -> Result<Vec<Slot>, AppError> {
        self.inner.get_reschedule_options(reservation_id).await
    }

    async fn reschedule_reservation(
        &self,
        reservation_id: i64,
        new_slot_id: i64,
    ) -> Result<(), AppError> {
        let result = self
            .inner
            .reschedule_reservation(reservation_id, new_slot_id)
            .await;
        self.invalidate_bookings();
        result
    }

    async fn request_refund(&self, reservation_id: i64) -> Result<(), AppError> {
        let result = self.inner.request_refund(reservation_id).await;
        self.invalidate_bookings();
        result
    }

    async fn get_admin_dashboard(&self) -> Result<AdminDashboardStats, AppError> {
        self.inner.get_admin_dashboard().await
    }
}
