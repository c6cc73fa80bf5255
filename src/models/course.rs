use serde::Serialize;

use super::Slot;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Course {
    pub id: i64,
    pub acronym: String,
    pub title: String,
    pub description: Option<String>,
    pub classes: Vec<CourseClass>,
}

/// A syllabus unit of a course. The backend calls these "sessions".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseClass {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub order_index: i32,
    pub base_price: i64,
    pub slots: Vec<Slot>,
}

impl Course {
    pub fn find_class(&self, class_id: i64) -> Option<&CourseClass> {
        self.classes.iter().find(|c| c.id == class_id)
    }

    /// Every slot of every class, in class then backend order.
    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.classes.iter().flat_map(|c| c.slots.iter())
    }

    pub fn classes_in_order(&self) -> Vec<&CourseClass> {
        let mut classes: Vec<&CourseClass> = self.classes.iter().collect();
        classes.sort_by_key(|c| c.order_index);
        classes
    }
}
