use auth::{AuthConfig, AuthError, AuthProvider, LocalAuthProvider, SIGN_UP_SUCCESS};
use shared::protocol::{SignInForm, SignUpForm};
use storage::Storage;

#[tokio::test]
async fn sign_up_sign_in_and_sign_out_round_trip() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let auth = LocalAuthProvider::new(
        storage.clone(),
        AuthConfig {
            session_secret: "integration-secret".into(),
            session_ttl_seconds: 600,
        },
    );

    let user = auth
        .sign_up(&SignUpForm {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email: "grace@example.com".into(),
            password: "cobol59".into(),
            confirm_password: "cobol59".into(),
        })
        .await
        .expect("sign up");
    assert!(SIGN_UP_SUCCESS.starts_with("Account created successfully!"));

    let signed_in = auth
        .sign_in(&SignInForm {
            email: "grace@example.com".into(),
            password: "cobol59".into(),
        })
        .await
        .expect("sign in");

    let stored = storage
        .load_session(&signed_in.session.session_id)
        .await
        .expect("query")
        .expect("session row");
    assert_eq!(stored.user_id, user.user_id);

    let session = auth.get_session(&signed_in.token).await.expect("session");
    assert_eq!(session.user.email, "grace@example.com");

    auth.sign_out(&signed_in.token).await.expect("sign out");
    assert!(storage
        .load_session(&signed_in.session.session_id)
        .await
        .expect("query")
        .is_none());
    assert!(matches!(
        auth.get_session(&signed_in.token).await,
        Err(AuthError::InvalidSession)
    ));
}

#[tokio::test]
async fn expired_session_is_rejected_and_removed() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let auth = LocalAuthProvider::new(
        storage.clone(),
        AuthConfig {
            session_secret: "integration-secret".into(),
            session_ttl_seconds: -5,
        },
    );
    auth.sign_up(&SignUpForm {
        first_name: "Alan".into(),
        last_name: "Turing".into(),
        email: "alan@example.com".into(),
        password: "enigma1".into(),
        confirm_password: "enigma1".into(),
    })
    .await
    .expect("sign up");
    let signed_in = auth
        .sign_in(&SignInForm {
            email: "alan@example.com".into(),
            password: "enigma1".into(),
        })
        .await
        .expect("sign in");

    // jsonwebtoken allows 60s of leeway, so the stored expiry is what rejects it.
    assert!(matches!(
        auth.get_session(&signed_in.token).await,
        Err(AuthError::InvalidSession)
    ));
    assert!(storage
        .load_session(&signed_in.session.session_id)
        .await
        .expect("query")
        .is_none());
}
