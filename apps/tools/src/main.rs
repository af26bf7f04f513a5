use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use auth::{AuthConfig, AuthProvider, LocalAuthProvider};
use clap::{Parser, Subcommand};
use color_analysis::{
    analyze_lighting, classify_season, clothing_color, decode_image, detect_undertone,
    SeasonPalettes, DEFAULT_MATCH_THRESHOLD,
};
use color_wheel::{ColorWheel, SvgOptions, BASE_HUES, DEFAULT_SECTOR_COUNT};
use shared::{
    domain::{Rgb, SectorId, Undertone},
    protocol::SignUpForm,
};
use storage::Storage;
use tracing::info;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/accounts.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Writes a wheel as SVG to a file or stdout.
    RenderWheel {
        #[arg(long, default_value_t = DEFAULT_SECTOR_COUNT)]
        count: usize,
        #[arg(long)]
        selected: Option<usize>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    ClassifySeason {
        #[arg(long, value_parser = parse_channels)]
        skin: [u8; 3],
        #[arg(long, value_parser = parse_channels)]
        hair: [u8; 3],
        #[arg(long, value_parser = parse_channels)]
        eye: [u8; 3],
        #[arg(long)]
        undertone: Undertone,
    },
    CheckColor {
        #[arg(long)]
        color: Rgb,
        #[arg(long)]
        season: String,
        #[arg(long, default_value = "palettes.json")]
        palettes: PathBuf,
        #[arg(long, default_value_t = DEFAULT_MATCH_THRESHOLD)]
        threshold: f64,
    },
    /// Estimates the garment color in a photo, optionally checking it
    /// against a season's palette.
    ClothingColor {
        image: PathBuf,
        #[arg(long)]
        season: Option<String>,
        #[arg(long, default_value = "palettes.json")]
        palettes: PathBuf,
        #[arg(long, default_value_t = DEFAULT_MATCH_THRESHOLD)]
        threshold: f64,
    },
    ValidateLighting {
        image: PathBuf,
    },
    #[command(name = "undertone")]
    DetectUndertone {
        image: PathBuf,
    },
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
    },
}

/// Parses `r,g,b` into three channels.
fn parse_channels(raw: &str) -> Result<[u8; 3], String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let [r, g, b] = parts.as_slice() else {
        return Err(format!("expected r,g,b but got '{raw}'"));
    };
    let channel = |value: &str| {
        value
            .parse::<u8>()
            .map_err(|_| format!("'{value}' is not a channel value between 0 and 255"))
    };
    Ok([channel(*r)?, channel(*g)?, channel(*b)?])
}

fn load_image(path: &Path) -> Result<color_analysis::RgbImage> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(decode_image(&bytes)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::RenderWheel {
            count,
            selected,
            out,
        } => {
            let mut wheel = ColorWheel::new(count, &BASE_HUES)?;
            if let Some(id) = selected {
                wheel.select(SectorId(id))?;
            }
            let svg = wheel.to_svg(&SvgOptions::default());
            match out {
                Some(path) => {
                    fs::write(&path, svg)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!(path = %path.display(), count, "wheel written");
                }
                None => print!("{svg}"),
            }
        }
        Command::ClassifySeason {
            skin,
            hair,
            eye,
            undertone,
        } => {
            let result = classify_season(skin, hair, eye, undertone)?;
            println!("{}", serde_json::to_string_pretty(&result.to_response())?);
        }
        Command::CheckColor {
            color,
            season,
            palettes,
            threshold,
        } => {
            let palettes = SeasonPalettes::load(&palettes)?;
            let allowed = palettes.is_allowed(color, &season, threshold)?;
            if let Some((nearest, distance)) = palettes.nearest(color, &season)? {
                info!(%nearest, distance, "closest palette color");
            }
            println!("{color} allowed for {season}: {allowed}");
        }
        Command::ClothingColor {
            image,
            season,
            palettes,
            threshold,
        } => {
            let color = clothing_color(&load_image(&image)?);
            match season {
                Some(season) => {
                    let palettes = SeasonPalettes::load(&palettes)?;
                    let allowed = palettes.is_allowed(color, &season, threshold)?;
                    println!("{color} allowed for {season}: {allowed}");
                }
                None => println!("{color}"),
            }
        }
        Command::ValidateLighting { image } => {
            let report = analyze_lighting(&load_image(&image)?)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::DetectUndertone { image } => {
            let estimate = detect_undertone(&load_image(&image)?);
            println!(
                "{} (mean chroma {:.2}, mean hue {:.1})",
                estimate.undertone, estimate.mean_chroma, estimate.mean_hue
            );
        }
        Command::CreateUser {
            email,
            password,
            first_name,
            last_name,
        } => {
            let form = SignUpForm {
                first_name: or_placeholder(first_name, "Admin"),
                last_name: or_placeholder(last_name, "User"),
                email,
                confirm_password: password.clone(),
                password,
            };
            let storage = Storage::new(&cli.database_url).await?;
            // Sign-up never mints a session token.
            let auth = LocalAuthProvider::new(
                storage,
                AuthConfig {
                    session_secret: String::new(),
                    session_ttl_seconds: 0,
                },
            );
            let user = auth
                .sign_up(&form)
                .await
                .with_context(|| format!("failed to create {}", form.email))?;
            println!("created user_id={} email={}", user.user_id.0, user.email);
        }
    }

    Ok(())
}

fn or_placeholder(value: String, placeholder: &str) -> String {
    if value.trim().is_empty() {
        placeholder.to_string()
    } else {
        value
    }
}
