//! Upload-and-link workflow.
//!
//! Every mutation that couples binary assets to a document goes through
//! here: course creation, lesson creation, and profile updates all follow
//! the same sequence - validate the scalar payload, upload the attachments,
//! then write exactly one document referencing the resulting download URLs.
//!
//! Ordering contract: the document write happens only after every upload
//! has resolved. Independent uploads for the same submission are issued
//! concurrently. If any upload fails the write is not attempted; assets
//! that did complete are left orphaned (no compensating delete).
//!
//! Deletion runs the other way around and is NOT atomic: the document is
//! deleted first, then each referenced blob. A blob failure after the
//! document is gone surfaces as [`PublishError::BlobDelete`] - the record
//! stays deleted and the blob is orphaned.

use serde_json::{Map, Value, json};
use tracing::instrument;

use chalkboard_core::{CourseCategory, CourseId, LessonId, Price};

use crate::firebase::{
    FirestoreClient, FirestoreError, StorageClient, StorageError, StoragePath, UploadedObject,
};
use crate::models::{Course, CurrentUser, Lesson};

/// Errors from the upload-and-link workflow.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// A required field is missing or empty. Raised before any side effect.
    #[error("required field missing or invalid: {field}")]
    Validation {
        /// Name of the offending form field.
        field: &'static str,
    },

    /// An attachment upload failed; the document write was not attempted.
    #[error("upload failed: {0}")]
    Upload(#[source] StorageError),

    /// The document write or delete failed. Any uploads that succeeded
    /// before this are orphaned.
    #[error("document write failed: {0}")]
    Persistence(#[source] FirestoreError),

    /// A blob delete failed after its document was already removed; the
    /// blob is orphaned.
    #[error("blob delete failed after document removal: {0}")]
    BlobDelete(#[source] StorageError),
}

/// A binary attachment taken from a multipart form.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Client-supplied file name; becomes the object's file name.
    pub filename: String,
    /// MIME type forwarded to the blob store.
    pub content_type: String,
    /// File bytes.
    pub bytes: Vec<u8>,
}

// =============================================================================
// Form Drafts
// =============================================================================

/// Raw course form fields, as submitted.
#[derive(Debug, Clone, Default)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    /// Raw price input; coerced to numeric during validation.
    pub price: String,
    pub category: String,
}

/// Validated course fields.
#[derive(Debug, Clone)]
pub struct ValidCourse {
    pub title: String,
    pub description: String,
    pub price: Price,
    pub category: CourseCategory,
}

impl CourseDraft {
    /// Validate the required fields, coercing price to a number.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::Validation` naming the first offending field.
    pub fn validate(&self) -> Result<ValidCourse, PublishError> {
        let title = require("title", &self.title)?;
        let description = require("description", &self.description)?;
        let price = Price::parse(require("price", &self.price)?)
            .map_err(|_| PublishError::Validation { field: "price" })?;
        let category: CourseCategory = require("category", &self.category)?
            .parse()
            .map_err(|_| PublishError::Validation { field: "category" })?;

        Ok(ValidCourse {
            title: title.to_owned(),
            description: description.to_owned(),
            price,
            category,
        })
    }
}

/// Raw lesson form fields, as submitted.
#[derive(Debug, Clone, Default)]
pub struct LessonDraft {
    pub title: String,
    /// Optional in the form; stored as an empty string when absent.
    pub description: String,
}

impl LessonDraft {
    /// Validate the required fields.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::Validation` if the title is empty.
    pub fn validate(&self) -> Result<&Self, PublishError> {
        require("title", &self.title)?;
        Ok(self)
    }
}

/// Raw profile form fields, as submitted.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: String,
    pub subject: String,
    pub bio: String,
}

/// Reject empty (after trimming) required fields.
fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str, PublishError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PublishError::Validation { field });
    }
    Ok(trimmed)
}

// =============================================================================
// PublishService
// =============================================================================

/// The upload-and-link workflow over the Firestore and Storage clients.
pub struct PublishService<'a> {
    firestore: &'a FirestoreClient,
    storage: &'a StorageClient,
}

impl<'a> PublishService<'a> {
    /// Create a new publish service.
    #[must_use]
    pub const fn new(firestore: &'a FirestoreClient, storage: &'a StorageClient) -> Self {
        Self { firestore, storage }
    }

    /// Create a course for `user`, uploading the optional thumbnail and
    /// intro video first.
    ///
    /// # Errors
    ///
    /// `Validation` before any side effect, `Upload` if a transfer fails
    /// (no document is written), `Persistence` if the document write fails
    /// (uploaded assets are orphaned).
    #[instrument(skip_all, fields(educator = %user.uid))]
    pub async fn create_course(
        &self,
        user: &CurrentUser,
        draft: &CourseDraft,
        thumbnail: Option<Attachment>,
        video: Option<Attachment>,
    ) -> Result<CourseId, PublishError> {
        let valid = draft.validate()?;

        // Independent uploads; neither orders before the other, and the
        // document write below waits on both.
        let (thumbnail, video) = tokio::try_join!(
            self.maybe_upload(thumbnail, |name| StoragePath::thumbnail(&user.uid, name)),
            self.maybe_upload(video, |name| StoragePath::course_video(&user.uid, name)),
        )
        .map_err(PublishError::Upload)?;

        let mut fields = Map::new();
        fields.insert("educatorId".to_owned(), json!(user.uid.as_str()));
        fields.insert("title".to_owned(), json!(valid.title));
        fields.insert("description".to_owned(), json!(valid.description));
        fields.insert("price".to_owned(), json!(valid.price.as_f64()));
        fields.insert("category".to_owned(), json!(valid.category.as_str()));
        fields.insert("thumbnail".to_owned(), json!(url_or_empty(&thumbnail)));
        fields.insert("videoUrl".to_owned(), json!(url_or_empty(&video)));

        let id = self
            .firestore
            .create_document("courses", &fields, Some("createdAt"))
            .await
            .map_err(PublishError::Persistence)?;

        tracing::info!(course = %id, "course published");
        Ok(CourseId::new(id))
    }

    /// Update a course's scalar fields (no attachments).
    ///
    /// # Errors
    ///
    /// `Validation` or `Persistence`.
    #[instrument(skip_all, fields(course = %course_id))]
    pub async fn update_course(
        &self,
        course_id: &CourseId,
        draft: &CourseDraft,
    ) -> Result<(), PublishError> {
        let valid = draft.validate()?;

        let mut fields = Map::new();
        fields.insert("title".to_owned(), json!(valid.title));
        fields.insert("description".to_owned(), json!(valid.description));
        fields.insert("price".to_owned(), json!(valid.price.as_f64()));
        fields.insert("category".to_owned(), json!(valid.category.as_str()));

        self.firestore
            .update_fields("courses", course_id.as_str(), &fields)
            .await
            .map_err(PublishError::Persistence)
    }

    /// Add a lesson to a course, uploading its video first.
    ///
    /// # Errors
    ///
    /// `Validation` if the title or video is missing, `Upload` if the
    /// transfer fails, `Persistence` if the document write fails.
    #[instrument(skip_all, fields(course = %course_id))]
    pub async fn add_lesson(
        &self,
        course_id: &CourseId,
        draft: &LessonDraft,
        video: Option<Attachment>,
    ) -> Result<LessonId, PublishError> {
        draft.validate()?;
        let video = video.ok_or(PublishError::Validation { field: "video" })?;

        let path = StoragePath::lesson_video(course_id, &video.filename);
        let uploaded = self
            .storage
            .upload(&path, video.bytes, &video.content_type)
            .await
            .map_err(PublishError::Upload)?;

        let mut fields = Map::new();
        fields.insert("title".to_owned(), json!(draft.title.trim()));
        fields.insert("description".to_owned(), json!(draft.description.trim()));
        fields.insert("videoUrl".to_owned(), json!(uploaded.download_url));

        let collection = format!("courses/{}/lessons", course_id.as_str());
        let id = self
            .firestore
            .create_document(&collection, &fields, Some("createdAt"))
            .await
            .map_err(PublishError::Persistence)?;

        Ok(LessonId::new(id))
    }

    /// Update the user's profile, uploading a replacement photo first when
    /// one is attached.
    ///
    /// # Errors
    ///
    /// `Validation` if the name is empty, `Upload`/`Persistence` as above.
    #[instrument(skip_all, fields(user = %user.uid))]
    pub async fn update_profile(
        &self,
        user: &CurrentUser,
        update: &ProfileUpdate,
        photo: Option<Attachment>,
    ) -> Result<(), PublishError> {
        require("name", &update.name)?;

        let photo = self
            .maybe_upload(photo, |_| StoragePath::profile_photo(&user.uid))
            .await
            .map_err(PublishError::Upload)?;

        let mut fields = Map::new();
        fields.insert("name".to_owned(), json!(update.name.trim()));
        fields.insert("subject".to_owned(), json!(update.subject.trim()));
        fields.insert("bio".to_owned(), json!(update.bio.trim()));
        if let Some(photo) = &photo {
            fields.insert("photoURL".to_owned(), json!(photo.download_url));
        }

        self.firestore
            .update_fields("users", user.uid.as_str(), &fields)
            .await
            .map_err(PublishError::Persistence)
    }

    /// Delete a course: document first, then its referenced blobs.
    ///
    /// # Errors
    ///
    /// `Persistence` if the document delete fails (nothing else is
    /// touched); `BlobDelete` if a blob delete fails afterwards (the
    /// document is already gone).
    #[instrument(skip_all, fields(course = %course.id))]
    pub async fn delete_course(&self, course: &Course) -> Result<(), PublishError> {
        self.firestore
            .delete_document("courses", course.id.as_str())
            .await
            .map_err(PublishError::Persistence)?;

        for url in [&course.thumbnail_url, &course.video_url]
            .into_iter()
            .flatten()
        {
            self.storage
                .delete_by_url(url)
                .await
                .map_err(PublishError::BlobDelete)?;
        }

        Ok(())
    }

    /// Delete a lesson: document first, then its video blob.
    ///
    /// # Errors
    ///
    /// As [`Self::delete_course`].
    #[instrument(skip_all, fields(course = %course_id, lesson = %lesson.id))]
    pub async fn delete_lesson(
        &self,
        course_id: &CourseId,
        lesson: &Lesson,
    ) -> Result<(), PublishError> {
        let collection = format!("courses/{}/lessons", course_id.as_str());
        self.firestore
            .delete_document(&collection, lesson.id.as_str())
            .await
            .map_err(PublishError::Persistence)?;

        if let Some(url) = &lesson.video_url {
            self.storage
                .delete_by_url(url)
                .await
                .map_err(PublishError::BlobDelete)?;
        }

        Ok(())
    }

    /// Upload an attachment if present; `None` passes through untouched.
    async fn maybe_upload(
        &self,
        attachment: Option<Attachment>,
        path: impl FnOnce(&str) -> StoragePath,
    ) -> Result<Option<UploadedObject>, StorageError> {
        match attachment {
            Some(attachment) => {
                let path = path(&attachment.filename);
                let uploaded = self
                    .storage
                    .upload(&path, attachment.bytes, &attachment.content_type)
                    .await?;
                Ok(Some(uploaded))
            }
            None => Ok(None),
        }
    }
}

/// The stored URL for an optional attachment; early records use `""` for
/// "no asset" and readers treat the two the same.
fn url_or_empty(uploaded: &Option<UploadedObject>) -> String {
    uploaded
        .as_ref()
        .map_or_else(String::new, |u| u.download_url.clone())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn full_draft() -> CourseDraft {
        CourseDraft {
            title: "Intro to Rust".to_string(),
            description: "Ownership without tears".to_string(),
            price: "49".to_string(),
            category: "Programming".to_string(),
        }
    }

    #[test]
    fn test_course_draft_valid() {
        let valid = full_draft().validate().unwrap();
        assert_eq!(valid.price, Price::parse("49").unwrap());
        assert_eq!(valid.category, CourseCategory::Programming);
    }

    #[test]
    fn test_course_draft_each_required_field() {
        for (field, mutate) in [
            ("title", Box::new(|d: &mut CourseDraft| d.title.clear()) as Box<dyn Fn(&mut CourseDraft)>),
            ("description", Box::new(|d| d.description.clear())),
            ("price", Box::new(|d| d.price.clear())),
            ("category", Box::new(|d| d.category.clear())),
        ] {
            let mut draft = full_draft();
            mutate(&mut draft);
            match draft.validate() {
                Err(PublishError::Validation { field: f }) => assert_eq!(f, field),
                other => panic!("expected validation error for {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_course_draft_whitespace_is_empty() {
        let mut draft = full_draft();
        draft.title = "   ".to_string();
        assert!(matches!(
            draft.validate(),
            Err(PublishError::Validation { field: "title" })
        ));
    }

    #[test]
    fn test_course_draft_rejects_bad_price() {
        let mut draft = full_draft();
        draft.price = "gratis".to_string();
        assert!(matches!(
            draft.validate(),
            Err(PublishError::Validation { field: "price" })
        ));

        draft.price = "-10".to_string();
        assert!(matches!(
            draft.validate(),
            Err(PublishError::Validation { field: "price" })
        ));
    }

    #[test]
    fn test_course_draft_rejects_unknown_category() {
        let mut draft = full_draft();
        draft.category = "Basket Weaving".to_string();
        assert!(matches!(
            draft.validate(),
            Err(PublishError::Validation { field: "category" })
        ));
    }

    #[test]
    fn test_lesson_draft_requires_title() {
        let draft = LessonDraft::default();
        assert!(matches!(
            draft.validate(),
            Err(PublishError::Validation { field: "title" })
        ));

        let draft = LessonDraft {
            title: "Week 1".to_string(),
            description: String::new(),
        };
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_url_or_empty() {
        assert_eq!(url_or_empty(&None), "");
        let uploaded = UploadedObject {
            path: "thumbnails/u/x.png".to_string(),
            download_url: "https://cdn/x.png".to_string(),
        };
        assert_eq!(url_or_empty(&Some(uploaded)), "https://cdn/x.png");
    }
}
