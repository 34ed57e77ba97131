//! Course catalog and enrollment.
//!
//! Reads come straight from Firestore; the public listing is cached
//! in-process for 5 minutes since it backs the busiest page and tolerates
//! staleness. Mutations go through [`CatalogService::invalidate_listing`].

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde_json::{Map, json};
use tracing::instrument;

use chalkboard_core::{CourseId, LessonId, UserId};

use crate::firebase::{FirestoreClient, FirestoreError};
use crate::models::{Course, CurrentUser, Lesson};

/// Cache key for the public course listing.
const LISTING_KEY: &str = "courses";

/// Errors that can occur in catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The requested course or lesson does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Document store operation failed.
    #[error("document store error: {0}")]
    Persistence(#[from] FirestoreError),
}

/// Course catalog over the document store.
///
/// Cheaply cloneable via `Arc`; one instance lives in the application state.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    firestore: FirestoreClient,
    listing: Cache<&'static str, Arc<Vec<Course>>>,
}

impl CatalogService {
    /// Create a new catalog service.
    #[must_use]
    pub fn new(firestore: FirestoreClient) -> Self {
        let listing = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CatalogInner { firestore, listing }),
        }
    }

    /// The public course listing (cached).
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Persistence` if the read fails.
    #[instrument(skip(self))]
    pub async fn list_courses(&self) -> Result<Arc<Vec<Course>>, CatalogError> {
        if let Some(cached) = self.inner.listing.get(LISTING_KEY).await {
            return Ok(cached);
        }

        let docs = self.inner.firestore.list_documents("courses").await?;
        let courses: Vec<Course> = docs.iter().filter_map(Course::from_document).collect();
        let courses = Arc::new(courses);
        self.inner
            .listing
            .insert(LISTING_KEY, Arc::clone(&courses))
            .await;
        Ok(courses)
    }

    /// Drop the cached listing after a mutation.
    pub async fn invalidate_listing(&self) {
        self.inner.listing.invalidate(LISTING_KEY).await;
    }

    /// Fetch one course.
    ///
    /// # Errors
    ///
    /// `CatalogError::NotFound` if it does not exist or fails to decode.
    #[instrument(skip(self))]
    pub async fn get_course(&self, id: &CourseId) -> Result<Course, CatalogError> {
        let doc = self
            .inner
            .firestore
            .get_document("courses", id.as_str())
            .await?;
        doc.as_ref()
            .and_then(Course::from_document)
            .ok_or_else(|| CatalogError::NotFound(format!("course {id}")))
    }

    /// List a course's lessons.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Persistence` if the read fails.
    #[instrument(skip(self))]
    pub async fn list_lessons(&self, course_id: &CourseId) -> Result<Vec<Lesson>, CatalogError> {
        let collection = format!("courses/{}/lessons", course_id.as_str());
        let docs = self.inner.firestore.list_documents(&collection).await?;
        Ok(docs.iter().map(Lesson::from_document).collect())
    }

    /// Fetch one lesson of a course.
    ///
    /// # Errors
    ///
    /// `CatalogError::NotFound` if it does not exist.
    #[instrument(skip(self))]
    pub async fn get_lesson(
        &self,
        course_id: &CourseId,
        lesson_id: &LessonId,
    ) -> Result<Lesson, CatalogError> {
        let collection = format!("courses/{}/lessons", course_id.as_str());
        let doc = self
            .inner
            .firestore
            .get_document(&collection, lesson_id.as_str())
            .await?;
        doc.as_ref()
            .map(Lesson::from_document)
            .ok_or_else(|| CatalogError::NotFound(format!("lesson {lesson_id}")))
    }

    /// List the courses owned by an educator.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Persistence` if the query fails.
    #[instrument(skip(self))]
    pub async fn courses_by_educator(&self, uid: &UserId) -> Result<Vec<Course>, CatalogError> {
        let docs = self
            .inner
            .firestore
            .query_equal("courses", "educatorId", &json!(uid.as_str()))
            .await?;
        Ok(docs.iter().filter_map(Course::from_document).collect())
    }

    /// Enroll a student in a course.
    ///
    /// Appends the student to the course's enrollment list and the course to
    /// the student's `enrolledCourses`. The two updates are independent
    /// writes with last-write-wins semantics; no client-side locking.
    /// Already-enrolled students are a no-op.
    ///
    /// # Errors
    ///
    /// `CatalogError::NotFound` for an unknown course, `Persistence` if a
    /// write fails.
    #[instrument(skip(self, user), fields(student = %user.uid))]
    pub async fn enroll(&self, user: &CurrentUser, course_id: &CourseId) -> Result<(), CatalogError> {
        let course = self.get_course(course_id).await?;
        if course.students.contains(&user.uid) {
            return Ok(());
        }

        let mut students: Vec<String> = course
            .students
            .iter()
            .map(|s| s.as_str().to_owned())
            .collect();
        students.push(user.uid.as_str().to_owned());

        let mut course_fields = Map::new();
        course_fields.insert("students".to_owned(), json!(students));
        self.inner
            .firestore
            .update_fields("courses", course_id.as_str(), &course_fields)
            .await?;

        // The student's own enrollment list; read-modify-write like above.
        let profile_doc = self
            .inner
            .firestore
            .get_document("users", user.uid.as_str())
            .await?;
        let mut enrolled: Vec<String> = profile_doc
            .as_ref()
            .and_then(|d| d.array_field("enrolledCourses"))
            .map(|values| {
                values
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        if !enrolled.iter().any(|c| c == course_id.as_str()) {
            enrolled.push(course_id.as_str().to_owned());
            let mut user_fields = Map::new();
            user_fields.insert("enrolledCourses".to_owned(), json!(enrolled));
            self.inner
                .firestore
                .update_fields("users", user.uid.as_str(), &user_fields)
                .await?;
        }

        self.invalidate_listing().await;
        tracing::info!(course = %course_id, "student enrolled");
        Ok(())
    }
}
