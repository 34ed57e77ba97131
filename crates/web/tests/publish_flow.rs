//! Upload-and-link workflow tests against the in-process fake backend.
//!
//! These pin the workflow's side-effect contract: validation fires before
//! any call leaves the process, the document write waits for every upload,
//! a failed upload suppresses the write, and deletion removes the document
//! before touching blobs.

mod support;

use serde_json::json;

use chalkboard_core::{CourseId, Email, Role, UserId};
use chalkboard_web::firebase::{FirestoreClient, StorageClient};
use chalkboard_web::models::{CurrentUser, Lesson};
use chalkboard_web::services::publish::{CourseDraft, LessonDraft};
use chalkboard_web::services::{Attachment, PublishError, PublishService};

use support::{CallKind, FakeFirebase};

fn educator() -> CurrentUser {
    CurrentUser {
        uid: UserId::new("uid-ed"),
        email: Email::parse("ed@example.com").expect("valid email"),
        name: Some("Ed".to_string()),
        role: Role::Educator,
    }
}

fn draft() -> CourseDraft {
    CourseDraft {
        title: "Intro to Rust".to_string(),
        description: "Ownership without tears".to_string(),
        price: "49".to_string(),
        category: "Programming".to_string(),
    }
}

fn attachment(name: &str, content_type: &str) -> Attachment {
    Attachment {
        filename: name.to_string(),
        content_type: content_type.to_string(),
        bytes: vec![0u8; 16],
    }
}

fn clients(fake: &FakeFirebase) -> (FirestoreClient, StorageClient) {
    let config = fake.config();
    (FirestoreClient::new(&config), StorageClient::new(&config))
}

#[tokio::test]
async fn validation_failure_produces_no_calls() {
    let fake = FakeFirebase::spawn().await;
    let (firestore, storage) = clients(&fake);
    let publish = PublishService::new(&firestore, &storage);

    let mut bad = draft();
    bad.title.clear();

    let result = publish
        .create_course(
            &educator(),
            &bad,
            Some(attachment("cover.png", "image/png")),
            Some(attachment("intro.mp4", "video/mp4")),
        )
        .await;

    assert!(matches!(
        result,
        Err(PublishError::Validation { field: "title" })
    ));
    assert!(
        fake.calls().is_empty(),
        "no upload or persistence call may happen on validation failure"
    );
}

#[tokio::test]
async fn two_attachments_mean_two_uploads_then_one_write() {
    let fake = FakeFirebase::spawn().await;
    let (firestore, storage) = clients(&fake);
    let publish = PublishService::new(&firestore, &storage);

    let id = publish
        .create_course(
            &educator(),
            &draft(),
            Some(attachment("cover.png", "image/png")),
            Some(attachment("intro.mp4", "video/mp4")),
        )
        .await
        .expect("course creation succeeds");

    assert_eq!(fake.count(&CallKind::Upload), 2);
    assert_eq!(fake.count(&CallKind::Commit), 1);

    // The write is ordered after both uploads.
    let last_upload = fake.last_index(&CallKind::Upload).expect("uploads recorded");
    let commit = fake.first_index(&CallKind::Commit).expect("commit recorded");
    assert!(
        last_upload < commit,
        "document write must happen only after every upload resolved"
    );

    // The stored document references both download URLs.
    let doc = fake
        .document(&format!("courses/{id}"))
        .expect("course document stored");
    let thumbnail = doc["thumbnail"].as_str().expect("thumbnail url");
    assert!(thumbnail.contains("thumbnails%2Fuid-ed%2Fcover.png"));
    let video = doc["videoUrl"].as_str().expect("video url");
    assert!(video.contains("course-videos%2Fuid-ed%2Fintro.mp4"));
}

#[tokio::test]
async fn one_attachment_means_one_upload() {
    let fake = FakeFirebase::spawn().await;
    let (firestore, storage) = clients(&fake);
    let publish = PublishService::new(&firestore, &storage);

    publish
        .create_course(
            &educator(),
            &draft(),
            Some(attachment("cover.png", "image/png")),
            None,
        )
        .await
        .expect("course creation succeeds");

    assert_eq!(fake.count(&CallKind::Upload), 1);
    assert_eq!(fake.count(&CallKind::Commit), 1);
}

#[tokio::test]
async fn no_attachments_mean_no_uploads_and_one_write() {
    let fake = FakeFirebase::spawn().await;
    let (firestore, storage) = clients(&fake);
    let publish = PublishService::new(&firestore, &storage);

    let id = publish
        .create_course(&educator(), &draft(), None, None)
        .await
        .expect("course creation succeeds");

    assert_eq!(fake.count(&CallKind::Upload), 0);
    assert_eq!(fake.count(&CallKind::Commit), 1);

    // Absent attachments persist as empty strings, the legacy encoding.
    let doc = fake
        .document(&format!("courses/{id}"))
        .expect("course document stored");
    assert_eq!(doc["thumbnail"], json!(""));
    assert_eq!(doc["videoUrl"], json!(""));
}

#[tokio::test]
async fn failed_upload_suppresses_the_write() {
    let fake = FakeFirebase::spawn().await;
    fake.fail_uploads_matching("thumbnails/");
    let (firestore, storage) = clients(&fake);
    let publish = PublishService::new(&firestore, &storage);

    let result = publish
        .create_course(
            &educator(),
            &draft(),
            Some(attachment("cover.png", "image/png")),
            Some(attachment("intro.mp4", "video/mp4")),
        )
        .await;

    assert!(matches!(result, Err(PublishError::Upload(_))));
    assert_eq!(
        fake.count(&CallKind::Commit),
        0,
        "no document may be written when an upload fails"
    );
}

#[tokio::test]
async fn price_string_is_persisted_as_number() {
    let fake = FakeFirebase::spawn().await;
    let (firestore, storage) = clients(&fake);
    let publish = PublishService::new(&firestore, &storage);

    let id = publish
        .create_course(&educator(), &draft(), None, None)
        .await
        .expect("course creation succeeds");

    let doc = fake
        .document(&format!("courses/{id}"))
        .expect("course document stored");
    // Submitted as the string "49"; stored as numeric 49.
    assert_eq!(doc["price"], json!(49.0));
    assert_eq!(doc["category"], json!("Programming"));
    assert_eq!(doc["educatorId"], json!("uid-ed"));
}

#[tokio::test]
async fn lesson_upload_then_subcollection_write() {
    let fake = FakeFirebase::spawn().await;
    let (firestore, storage) = clients(&fake);
    let publish = PublishService::new(&firestore, &storage);

    let course_id = CourseId::new("c-1");
    let lesson_draft = LessonDraft {
        title: "Week 1".to_string(),
        description: "Getting started".to_string(),
    };

    let lesson_id = publish
        .add_lesson(
            &course_id,
            &lesson_draft,
            Some(attachment("week1.mp4", "video/mp4")),
        )
        .await
        .expect("lesson creation succeeds");

    assert_eq!(fake.count(&CallKind::Upload), 1);
    assert_eq!(fake.count(&CallKind::Commit), 1);
    assert!(
        fake.document(&format!("courses/c-1/lessons/{lesson_id}"))
            .is_some(),
        "lesson lives in the course's subcollection"
    );
}

#[tokio::test]
async fn lesson_without_video_is_rejected_before_any_call() {
    let fake = FakeFirebase::spawn().await;
    let (firestore, storage) = clients(&fake);
    let publish = PublishService::new(&firestore, &storage);

    let result = publish
        .add_lesson(
            &CourseId::new("c-1"),
            &LessonDraft {
                title: "Week 1".to_string(),
                description: String::new(),
            },
            None,
        )
        .await;

    assert!(matches!(
        result,
        Err(PublishError::Validation { field: "video" })
    ));
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn lesson_delete_removes_document_before_blob() {
    let fake = FakeFirebase::spawn().await;
    let (firestore, storage) = clients(&fake);
    let publish = PublishService::new(&firestore, &storage);

    let video_url = format!(
        "{}/v0/b/{}/o/lessons%2Fc-1%2Fweek1.mp4?alt=media&token=test-token",
        fake.base_url,
        support::BUCKET
    );
    fake.seed_document(
        "courses/c-1/lessons/l-1",
        json!({ "title": "Week 1", "videoUrl": video_url }),
    );

    let lesson = Lesson {
        id: chalkboard_core::LessonId::new("l-1"),
        title: "Week 1".to_string(),
        description: String::new(),
        video_url: Some(video_url),
        created_at: None,
    };

    publish
        .delete_lesson(&CourseId::new("c-1"), &lesson)
        .await
        .expect("lesson deletion succeeds");

    let doc_delete = fake
        .first_index(&CallKind::DeleteDocument)
        .expect("document deleted");
    let blob_delete = fake
        .first_index(&CallKind::DeleteBlob)
        .expect("blob deleted");
    assert!(doc_delete < blob_delete, "document is deleted first");
    assert_eq!(fake.document("courses/c-1/lessons/l-1"), None);
}

#[tokio::test]
async fn blob_delete_failure_leaves_document_deleted() {
    let fake = FakeFirebase::spawn().await;
    fake.fail_blob_deletes();
    let (firestore, storage) = clients(&fake);
    let publish = PublishService::new(&firestore, &storage);

    let video_url = format!(
        "{}/v0/b/{}/o/lessons%2Fc-1%2Fweek1.mp4?alt=media&token=test-token",
        fake.base_url,
        support::BUCKET
    );
    fake.seed_document(
        "courses/c-1/lessons/l-1",
        json!({ "title": "Week 1", "videoUrl": video_url }),
    );

    let lesson = Lesson {
        id: chalkboard_core::LessonId::new("l-1"),
        title: "Week 1".to_string(),
        description: String::new(),
        video_url: Some(video_url),
        created_at: None,
    };

    let result = publish
        .delete_lesson(&CourseId::new("c-1"), &lesson)
        .await;

    // The inconsistency window: the document is gone, the blob is not.
    assert!(matches!(result, Err(PublishError::BlobDelete(_))));
    assert_eq!(
        fake.document("courses/c-1/lessons/l-1"),
        None,
        "document deletion already happened when the blob delete failed"
    );
}
