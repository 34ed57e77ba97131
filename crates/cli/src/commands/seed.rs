//! Seed the project with a demo educator and catalog.
//!
//! Goes through the same services the server uses, so seeded data is
//! indistinguishable from organically created data.
//!
//! # Environment Variables
//!
//! - `FIREBASE_PROJECT_ID`, `FIREBASE_WEB_API_KEY`, `FIREBASE_STORAGE_BUCKET`
//!   (plus the optional `FIREBASE_*_HOST` overrides for the emulator)

use tracing::info;

use chalkboard_web::config::FirebaseConfig;
use chalkboard_web::firebase::{FirestoreClient, IdentityClient, StorageClient};
use chalkboard_web::services::publish::CourseDraft;
use chalkboard_web::services::{AuthError, AuthService, PublishService};

/// Demo educator account email.
const DEMO_EMAIL: &str = "demo-educator@chalkboard.app";

/// Seed a demo educator and two demo courses.
///
/// # Errors
///
/// Returns an error if configuration is missing or any Firebase call fails.
pub async fn demo_catalog(password: &str) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = FirebaseConfig::from_env()?;

    let identity = IdentityClient::new(&config);
    let firestore = FirestoreClient::new(&config);
    let storage = StorageClient::new(&config);
    let auth = AuthService::new(&identity, &firestore);

    // Reuse the account across runs; signup only succeeds the first time.
    let educator = match auth
        .sign_up_educator(
            "Demo Educator",
            DEMO_EMAIL,
            password,
            "Programming",
            "Seeded account for trying out the educator surface.",
        )
        .await
    {
        Ok(user) => {
            info!(uid = %user.uid, "demo educator created");
            user
        }
        Err(AuthError::EmailTaken) => {
            info!("demo educator already exists, logging in");
            auth.educator_login(DEMO_EMAIL, password).await?
        }
        Err(e) => return Err(e.into()),
    };

    let publish = PublishService::new(&firestore, &storage);
    let drafts = [
        CourseDraft {
            title: "Intro to Rust".to_string(),
            description: "Ownership, borrowing, and the road to fearless refactoring.".to_string(),
            price: "49".to_string(),
            category: "Programming".to_string(),
        },
        CourseDraft {
            title: "Design Systems from Scratch".to_string(),
            description: "Tokens, components, and keeping a product visually coherent."
                .to_string(),
            price: "79".to_string(),
            category: "Design".to_string(),
        },
    ];

    for draft in &drafts {
        let id = publish.create_course(&educator, draft, None, None).await?;
        info!(course = %id, title = %draft.title, "demo course created");
    }

    info!("seed complete");
    Ok(())
}
