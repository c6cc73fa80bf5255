use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::api::BookingApi;
use crate::error::AppError;
use crate::models::{Course, CourseClass, Reservation};
use crate::services::reconciler::accessible_class_ids;

/// A course with the classes the current student has paid access to.
#[derive(Debug, Clone)]
pub struct CoursePage {
    pub course: Course,
    pub reservations: Vec<Reservation>,
    accessible: BTreeSet<i64>,
}

impl CoursePage {
    /// Course and reservations are fetched concurrently and joined.
    pub async fn load(api: Arc<dyn BookingApi>, course_id: i64) -> Result<Self, AppError> {
        let (course, reservations) =
            tokio::try_join!(api.get_course(course_id), api.list_reservations())?;
        debug!(
            "Course {} loaded with {} reservations",
            course.acronym,
            reservations.len()
        );
        Ok(Self::new(course, reservations))
    }

    pub fn new(course: Course, reservations: Vec<Reservation>) -> Self {
        let accessible = accessible_class_ids(&reservations);
        Self {
            course,
            reservations,
            accessible,
        }
    }

    pub fn has_access(&self, class_id: i64) -> bool {
        self.accessible.contains(&class_id)
    }

    /// Classes by syllabus order, each paired with its access flag.
    pub fn classes(&self) -> Vec<(&CourseClass, bool)> {
        self.course
            .classes_in_order()
            .into_iter()
            .map(|c| (c, self.has_access(c.id)))
            .collect()
    }
}
