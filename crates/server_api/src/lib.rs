use std::sync::Arc;

use auth::{AuthError, AuthProvider, SignedIn};
use color_analysis::{AnalysisError, SeasonPalettes};
use color_wheel::{ColorWheel, WheelError, BASE_HUES};
use shared::{
    domain::{ColorSector, SectorId, Session, UserSummary},
    error::{ApiError, ErrorCode},
    protocol::{
        ClassifyClothingResponse, ClassifyColorRequest, ClassifyColorResponse,
        ClassifySeasonRequest, ClassifySeasonResponse, LightingReport, SignInForm, SignUpForm,
        UndertoneReport,
    },
};
use tracing::{debug, warn};

pub mod pages;

/// Upper bound for raw image uploads.
pub const MAX_IMAGE_BYTES: usize = 8 * 1024 * 1024;

#[derive(Clone)]
pub struct ApiContext {
    pub auth: Arc<dyn AuthProvider>,
    pub palettes: Arc<SeasonPalettes>,
    pub match_threshold: f64,
    pub wheel_sector_count: usize,
}

/// The caller's session as resolved before a page is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Active(Session),
    Missing,
    Failed(String),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Active(session) => Some(session),
            SessionState::Missing | SessionState::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationTarget {
    SignUp,
    ShowColorWheel,
}

impl NavigationTarget {
    pub fn path(self) -> &'static str {
        match self {
            NavigationTarget::SignUp => "/sign-up",
            NavigationTarget::ShowColorWheel => "/color-wheel",
        }
    }
}

pub fn color_wheel_navigation(state: &SessionState) -> NavigationTarget {
    match state {
        SessionState::Active(_) => NavigationTarget::ShowColorWheel,
        SessionState::Missing | SessionState::Failed(_) => NavigationTarget::SignUp,
    }
}

pub async fn resolve_session(ctx: &ApiContext, token: Option<&str>) -> SessionState {
    let Some(token) = token else {
        return SessionState::Missing;
    };
    match ctx.auth.get_session(token).await {
        Ok(session) => SessionState::Active(session),
        Err(AuthError::InvalidSession | AuthError::Token(_)) => SessionState::Missing,
        Err(err) => {
            warn!(error = %err, "failed to resolve session");
            SessionState::Failed(err.to_string())
        }
    }
}

pub async fn sign_up(ctx: &ApiContext, form: &SignUpForm) -> Result<UserSummary, ApiError> {
    ctx.auth.sign_up(form).await.map_err(|err| auth_error(&err))
}

pub async fn sign_in(ctx: &ApiContext, form: &SignInForm) -> Result<SignedIn, ApiError> {
    ctx.auth.sign_in(form).await.map_err(|err| auth_error(&err))
}

pub async fn sign_out(ctx: &ApiContext, token: &str) -> Result<(), ApiError> {
    ctx.auth.sign_out(token).await.map_err(|err| auth_error(&err))
}

pub fn new_wheel(ctx: &ApiContext) -> Result<ColorWheel, ApiError> {
    ColorWheel::new(ctx.wheel_sector_count, &BASE_HUES).map_err(wheel_error)
}

pub fn select_sector(wheel: &mut ColorWheel, sector_id: SectorId) -> Result<ColorSector, ApiError> {
    wheel.select(sector_id).cloned().map_err(wheel_error)
}

pub fn classify_season(request: &ClassifySeasonRequest) -> Result<ClassifySeasonResponse, ApiError> {
    let result = color_analysis::classify_season(
        request.skin,
        request.hair,
        request.eye,
        request.undertone,
    )
    .map_err(analysis_error)?;
    Ok(result.to_response())
}

pub fn classify_color(
    ctx: &ApiContext,
    request: &ClassifyColorRequest,
) -> Result<ClassifyColorResponse, ApiError> {
    let allowed = ctx
        .palettes
        .is_allowed(request.color, &request.season, ctx.match_threshold)
        .map_err(analysis_error)?;
    Ok(ClassifyColorResponse {
        allowed,
        message: "Color identification successful.".into(),
    })
}

/// Estimates the garment color in a product photo and checks it against the
/// season's palette.
pub fn classify_clothing(
    ctx: &ApiContext,
    season: &str,
    body: &[u8],
) -> Result<ClassifyClothingResponse, ApiError> {
    let image = image_from_body(body)?;
    let clothing_color = color_analysis::clothing_color(&image);
    let allowed = ctx
        .palettes
        .is_allowed(clothing_color, season, ctx.match_threshold)
        .map_err(analysis_error)?;
    Ok(ClassifyClothingResponse {
        allowed,
        clothing_color,
        message: "Color identification successful.".into(),
    })
}

pub fn validate_lighting(body: &[u8]) -> Result<LightingReport, ApiError> {
    let image = image_from_body(body)?;
    color_analysis::analyze_lighting(&image).map_err(analysis_error)
}

pub fn detect_undertone(body: &[u8]) -> Result<UndertoneReport, ApiError> {
    let image = image_from_body(body)?;
    let estimate = color_analysis::detect_undertone(&image);
    debug!(undertone = %estimate.undertone, estimate.mean_chroma, estimate.mean_hue, "undertone detected");
    Ok(UndertoneReport {
        undertone: estimate.undertone,
        mean_chroma: estimate.mean_chroma,
        mean_hue: estimate.mean_hue,
    })
}

fn image_from_body(body: &[u8]) -> Result<color_analysis::RgbImage, ApiError> {
    if body.is_empty() {
        return Err(ApiError::validation("image body is empty"));
    }
    if body.len() > MAX_IMAGE_BYTES {
        return Err(ApiError::new(
            ErrorCode::PayloadTooLarge,
            format!("image exceeds {MAX_IMAGE_BYTES} bytes"),
        ));
    }
    color_analysis::decode_image(body).map_err(analysis_error)
}

pub fn auth_error(err: &AuthError) -> ApiError {
    if let AuthError::Storage(source) = err {
        warn!(error = %source, "auth storage failure");
    }
    ApiError::from(err)
}

pub fn wheel_error(err: WheelError) -> ApiError {
    match err {
        WheelError::InvalidArgument(message) => ApiError::invalid_argument(message),
    }
}

pub fn analysis_error(err: AnalysisError) -> ApiError {
    match err {
        AnalysisError::EmptyImage | AnalysisError::Decode(_) => {
            ApiError::validation("Invalid image file")
        }
        AnalysisError::UnknownSeason(_) => ApiError::new(ErrorCode::NotFound, err.to_string()),
        AnalysisError::NoCandidates(_) => ApiError::invalid_argument(err.to_string()),
        AnalysisError::PaletteFile { .. } | AnalysisError::PaletteFormat(_) => {
            warn!(error = %err, "palette data unavailable");
            ApiError::internal("palette data unavailable")
        }
    }
}

#[cfg(test)]
mod tests {
    use auth::{AuthConfig, LocalAuthProvider};
    use shared::domain::{Rgb, Undertone, UserId};
    use storage::Storage;

    use super::*;

    async fn setup() -> ApiContext {
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        let auth = LocalAuthProvider::new(
            storage,
            AuthConfig {
                session_secret: "s".into(),
                session_ttl_seconds: 60,
            },
        );
        let palettes = SeasonPalettes::from_json(r##"{"True Winter": ["#000000", "#FFFFFF"]}"##)
            .expect("palettes");
        ApiContext {
            auth: Arc::new(auth),
            palettes: Arc::new(palettes),
            match_threshold: 40.0,
            wheel_sector_count: 52,
        }
    }

    fn session() -> Session {
        Session {
            session_id: "sid".into(),
            user: UserSummary {
                user_id: UserId(1),
                email: "ada@example.com".into(),
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
            },
        }
    }

    #[test]
    fn navigation_requires_active_session() {
        assert_eq!(
            color_wheel_navigation(&SessionState::Active(session())),
            NavigationTarget::ShowColorWheel
        );
        assert_eq!(
            color_wheel_navigation(&SessionState::Missing),
            NavigationTarget::SignUp
        );
        assert_eq!(
            color_wheel_navigation(&SessionState::Failed("network".into())),
            NavigationTarget::SignUp
        );
        assert_eq!(NavigationTarget::SignUp.path(), "/sign-up");
    }

    #[tokio::test]
    async fn missing_or_bogus_token_resolves_to_missing() {
        let ctx = setup().await;
        assert_eq!(resolve_session(&ctx, None).await, SessionState::Missing);
        assert_eq!(
            resolve_session(&ctx, Some("not-a-jwt")).await,
            SessionState::Missing
        );
    }

    #[tokio::test]
    async fn signed_in_token_resolves_to_active() {
        let ctx = setup().await;
        sign_up(
            &ctx,
            &SignUpForm {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: "ada@example.com".into(),
                password: "secret1".into(),
                confirm_password: "secret1".into(),
            },
        )
        .await
        .expect("sign up");
        let signed_in = sign_in(
            &ctx,
            &SignInForm {
                email: "ada@example.com".into(),
                password: "secret1".into(),
            },
        )
        .await
        .expect("sign in");

        let state = resolve_session(&ctx, Some(&signed_in.token)).await;
        assert_eq!(
            state.session().map(|s| s.user.email.as_str()),
            Some("ada@example.com")
        );
        assert_eq!(
            color_wheel_navigation(&state),
            NavigationTarget::ShowColorWheel
        );
    }

    #[tokio::test]
    async fn mismatched_passwords_surface_as_validation() {
        let ctx = setup().await;
        let err = sign_up(
            &ctx,
            &SignUpForm {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: "ada@example.com".into(),
                password: "secret1".into(),
                confirm_password: "secret2".into(),
            },
        )
        .await
        .expect_err("should fail");
        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(err.message, "Passwords do not match.");
    }

    #[tokio::test]
    async fn wheel_selection_rejects_unknown_sector() {
        let ctx = setup().await;
        let mut wheel = new_wheel(&ctx).expect("wheel");
        let sector = select_sector(&mut wheel, SectorId(12)).expect("select");
        assert_eq!(sector.color_value, BASE_HUES[0]);

        let err = select_sector(&mut wheel, SectorId(52)).expect_err("out of range");
        assert_eq!(err.code, ErrorCode::InvalidArgument);
        assert_eq!(wheel.selected_id(), Some(SectorId(12)));
    }

    #[tokio::test]
    async fn classify_color_and_unknown_season() {
        let ctx = setup().await;
        let response = classify_color(
            &ctx,
            &ClassifyColorRequest {
                color: Rgb::new(3, 3, 3),
                season: "True Winter".into(),
            },
        )
        .expect("classify");
        assert!(response.allowed);

        let err = classify_color(
            &ctx,
            &ClassifyColorRequest {
                color: Rgb::new(3, 3, 3),
                season: "Mid Monsoon".into(),
            },
        )
        .expect_err("unknown season");
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn classify_season_reports_match_kind() {
        let response = classify_season(&ClassifySeasonRequest {
            skin: [195, 165, 145],
            hair: [135, 105, 85],
            eye: [75, 75, 55],
            undertone: Undertone::LightWarm,
        })
        .expect("classify");
        assert_eq!(response.season, "Light Spring");
    }

    #[test]
    fn raw_image_bodies_are_checked() {
        assert_eq!(
            validate_lighting(&[]).expect_err("empty").code,
            ErrorCode::Validation
        );
        assert_eq!(
            detect_undertone(&vec![0u8; MAX_IMAGE_BYTES + 1])
                .expect_err("too large")
                .code,
            ErrorCode::PayloadTooLarge
        );
        assert_eq!(
            detect_undertone(b"definitely not a png")
                .expect_err("garbage")
                .message,
            "Invalid image file"
        );
    }

    #[test]
    fn undertone_from_png_body() {
        let image = image::RgbImage::from_pixel(4, 4, image::Rgb([220, 150, 110]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, image::ImageFormat::Png)
            .expect("encode");
        let report = detect_undertone(bytes.get_ref()).expect("report");
        assert_eq!(report.undertone, Undertone::Warm);
    }

    #[tokio::test]
    async fn clothing_photo_is_matched_against_palette() {
        let ctx = setup().await;
        let image = image::RgbImage::from_fn(8, 8, |x, _| {
            if x < 2 {
                image::Rgb([255, 255, 255])
            } else {
                image::Rgb([10, 10, 12])
            }
        });
        let mut bytes = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, image::ImageFormat::Png)
            .expect("encode");

        let response = classify_clothing(&ctx, "True Winter", bytes.get_ref()).expect("classify");
        assert_eq!(response.clothing_color, Rgb::new(10, 10, 12));
        assert!(response.allowed);

        let err = classify_clothing(&ctx, "Mid Monsoon", bytes.get_ref()).expect_err("season");
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
