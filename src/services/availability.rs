use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, FixedOffset, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};

use crate::api::BookingApi;
use crate::error::AppError;
use crate::models::{Slot, SlotStatus};

/// Occupancy of a slot as derived from its embedded reservations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotOccupancy {
    pub confirmed_count: usize,
    /// May go negative if the backend ever overbooks.
    pub available_spots: i64,
    pub is_full: bool,
    /// Any reservation at all, whoever holds it.
    pub has_reservation: bool,
    pub reserved_by_current_user: bool,
}

impl SlotOccupancy {
    pub fn derive(slot: &Slot, viewer: Option<i64>) -> Self {
        let confirmed_count = slot.confirmed_count();
        let available_spots = i64::from(slot.max_students) - confirmed_count as i64;

        let reserved_by_current_user = slot.reserved_by_current_user.unwrap_or_else(|| {
            viewer.is_some_and(|student_id| {
                slot.reservations
                    .iter()
                    .any(|r| r.student_id == student_id && r.status.is_active())
            })
        });

        Self {
            confirmed_count,
            available_spots,
            is_full: available_spots <= 0,
            has_reservation: !slot.reservations.is_empty(),
            reserved_by_current_user,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotView {
    pub slot: Slot,
    pub occupancy: SlotOccupancy,
}

impl SlotView {
    pub fn new(slot: Slot, viewer: Option<i64>) -> Self {
        let occupancy = SlotOccupancy::derive(&slot, viewer);
        Self { slot, occupancy }
    }

    /// Whether the reserve button is enabled.
    pub fn can_reserve(&self) -> bool {
        self.slot.is_bookable()
            && !self.occupancy.is_full
            && !self.occupancy.reserved_by_current_user
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub slots: Vec<SlotView>,
}

impl DayBucket {
    pub fn label(&self) -> String {
        day_label(self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityView {
    pub course_id: i64,
    pub acronym: String,
    pub title: String,
    pub days: Vec<DayBucket>,
}

impl AvailabilityView {
    pub fn slot_count(&self) -> usize {
        self.days.iter().map(|d| d.slots.len()).sum()
    }

    pub fn find_slot(&self, slot_id: i64) -> Option<&SlotView> {
        self.days
            .iter()
            .flat_map(|d| d.slots.iter())
            .find(|v| v.slot.id == slot_id)
    }
}

/// Buckets slots by the local calendar date of their start time. Buckets
/// come out in ascending date order; inside a bucket the input order is kept.
pub fn group_by_day(slots: Vec<SlotView>, offset: FixedOffset) -> Vec<DayBucket> {
    let mut buckets: BTreeMap<NaiveDate, Vec<SlotView>> = BTreeMap::new();
    for view in slots {
        let date = view.slot.start_time.with_timezone(&offset).date_naive();
        buckets.entry(date).or_default().push(view);
    }

    buckets
        .into_iter()
        .map(|(date, slots)| DayBucket { date, slots })
        .collect()
}

const WEEKDAYS: [&str; 7] = [
    "lunes", "martes", "miércoles", "jueves", "viernes", "sábado", "domingo",
];
const MONTHS: [&str; 12] = [
    "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto",
    "septiembre", "octubre", "noviembre", "diciembre",
];

/// e.g. "lunes 2 de marzo"
pub fn day_label(date: NaiveDate) -> String {
    let weekday = WEEKDAYS[date.weekday().num_days_from_monday() as usize];
    let month = MONTHS[date.month0() as usize];
    format!("{} {} de {}", weekday, date.day(), month)
}

pub struct SlotAvailability {
    api: Arc<dyn BookingApi>,
    offset: FixedOffset,
    viewer: Option<i64>,
}

impl SlotAvailability {
    pub fn new(api: Arc<dyn BookingApi>, offset: FixedOffset) -> Self {
        Self {
            api,
            offset,
            viewer: None,
        }
    }

    /// Student whose own reservations should be recognised in the listing.
    pub fn for_student(mut self, student_id: i64) -> Self {
        self.viewer = Some(student_id);
        self
    }

    pub async fn load_slots(&self, course_ref: &str) -> Result<AvailabilityView, AppError> {
        let course = self.api.get_course_slots(course_ref).await.map_err(|e| {
            warn!("Failed to load slots for course {}: {}", course_ref, e);
            e
        })?;

        let views: Vec<SlotView> = course
            .slots()
            .filter(|s| matches!(s.status, SlotStatus::Available | SlotStatus::Full))
            .cloned()
            .map(|s| SlotView::new(s, self.viewer))
            .collect();

        let days = group_by_day(views, self.offset);
        info!(
            "Loaded {} slots across {} days for course {}",
            days.iter().map(|d| d.slots.len()).sum::<usize>(),
            days.len(),
            course.acronym
        );

        Ok(AvailabilityView {
            course_id: course.id,
            acronym: course.acronym,
            title: course.title,
            days,
        })
    }
}
