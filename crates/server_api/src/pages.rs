//! Server-rendered HTML for the landing, account and color wheel pages.

use std::fmt::Write as _;

use color_wheel::{ColorWheel, SvgOptions};
use shared::{domain::Session, html::escape_html, protocol::SignUpForm};

pub const BRAND: &str = "ColorPaletteAI";
pub const SELECT_HREF: &str = "/color-wheel/select/{id}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
    Success(String),
}

const STYLE: &str = "body{margin:0;font-family:system-ui,sans-serif;background:#f9fafb;color:#111827}\
nav{display:flex;justify-content:space-between;align-items:center;padding:1rem 1.5rem;background:#fff;border-bottom:1px solid #e5e7eb}\
main{max-width:72rem;margin:0 auto;padding:2rem 1.5rem}\
.cards{display:grid;grid-template-columns:repeat(auto-fit,minmax(16rem,1fr));gap:1.5rem}\
.card{background:#fff;border-radius:.75rem;padding:1.5rem;box-shadow:0 1px 2px rgba(0,0,0,.05)}\
.error{color:#dc2626}.success{color:#16a34a}\
.swatch{width:3rem;height:3rem;border-radius:50%}\
label{display:block;font-size:.875rem;margin-top:1rem}input{width:100%;padding:.5rem}";

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}</body>\n</html>\n",
        title = escape_html(title),
    )
}

fn notice_html(notice: Option<&Notice>) -> String {
    match notice {
        Some(Notice::Error(message)) => format!("<p class=\"error\">{}</p>", escape_html(message)),
        Some(Notice::Success(message)) => {
            format!("<p class=\"success\">{}</p>", escape_html(message))
        }
        None => String::new(),
    }
}

pub fn landing_page() -> String {
    let cards = [
        (
            "Enhance Your Appearance",
            "Discover colors that complement your skin tone, highlight your best features, and minimize imperfections.",
        ),
        (
            "Build a Cohesive Wardrobe",
            "Create a versatile collection of clothes that work together perfectly, simplifying your daily choices.",
        ),
        (
            "Stay Seasonally Relevant",
            "Align your style with seasonal trends while maintaining your unique color harmony.",
        ),
    ];

    let mut body = String::new();
    let _ = writeln!(
        body,
        "<nav><strong>{BRAND}</strong><a href=\"/sign-in\">Sign In</a></nav>"
    );
    body.push_str("<main>\n<h1>Discover Your Perfect Color Palette</h1>\n");
    body.push_str(
        "<p>Enhance your appearance and build a wardrobe that truly reflects you through personalized color analysis.</p>\n",
    );
    body.push_str("<section class=\"cards\">\n");
    for (title, text) in cards {
        let _ = writeln!(
            body,
            "<div class=\"card\"><h3>{title}</h3><p>{text}</p></div>"
        );
    }
    body.push_str("</section>\n");
    body.push_str(
        "<p><a class=\"cta\" href=\"/color-wheel\">Discover Your Color Palette Now</a></p>\n</main>\n",
    );
    layout(BRAND, &body)
}

fn text_input(out: &mut String, label: &str, name: &str, kind: &str, value: &str) {
    let _ = writeln!(
        out,
        "<label for=\"{name}\">{label}</label><input id=\"{name}\" name=\"{name}\" type=\"{kind}\" value=\"{value}\" required>",
        value = escape_html(value),
    );
}

/// Passwords are never echoed back into the form.
pub fn sign_up_page(form: &SignUpForm, notice: Option<&Notice>) -> String {
    let mut body = String::new();
    let _ = writeln!(
        body,
        "<nav><a href=\"/\">{BRAND}</a><a href=\"/sign-in\">Sign In</a></nav>"
    );
    body.push_str("<main>\n<h1>Create Your Account</h1>\n<div class=\"cards\">\n");
    body.push_str("<form class=\"card\" method=\"post\" action=\"/sign-up\">\n");
    text_input(&mut body, "First Name", "first_name", "text", &form.first_name);
    text_input(&mut body, "Last Name", "last_name", "text", &form.last_name);
    text_input(&mut body, "Email", "email", "email", &form.email);
    text_input(&mut body, "Password", "password", "password", "");
    text_input(&mut body, "Confirm Password", "confirm_password", "password", "");
    body.push_str(&notice_html(notice));
    body.push_str("\n<p><button type=\"submit\">Create Account</button></p>\n</form>\n");
    body.push_str(
        "<div class=\"card\">\n<h3>Photo Requirements</h3>\n<ul>\n\
         <li>Good lighting is essential</li>\n\
         <li>Clear view of face, including hair, eyes, and skin</li>\n\
         <li>Neutral background preferred</li>\n\
         <li>Similar to the example shown below</li>\n</ul>\n</div>\n",
    );
    body.push_str("</div>\n</main>\n");
    layout("Create Your Account", &body)
}

pub fn sign_in_page(email: &str, notice: Option<&Notice>) -> String {
    let mut body = String::new();
    let _ = writeln!(
        body,
        "<nav><a href=\"/\">{BRAND}</a><a href=\"/sign-up\">Sign Up</a></nav>"
    );
    body.push_str("<main>\n<h1>Sign In</h1>\n");
    body.push_str("<form class=\"card\" method=\"post\" action=\"/sign-in\">\n");
    text_input(&mut body, "Email", "email", "email", email);
    text_input(&mut body, "Password", "password", "password", "");
    body.push_str(&notice_html(notice));
    body.push_str("\n<p><button type=\"submit\">Sign In</button></p>\n</form>\n</main>\n");
    layout("Sign In", &body)
}

pub fn profile_name(session: &Session) -> &str {
    if session.user.email.is_empty() {
        "Unknown User"
    } else {
        &session.user.email
    }
}

pub fn color_wheel_page(session: &Session, wheel: &ColorWheel) -> String {
    let mut body = String::new();
    let _ = writeln!(
        body,
        "<nav><a href=\"/\">Color Palette AI</a>\
         <span class=\"profile\">{user}\
         <form method=\"post\" action=\"/sign-out\" style=\"display:inline\"><button type=\"submit\">Sign Out</button></form>\
         </span></nav>",
        user = escape_html(profile_name(session)),
    );
    body.push_str("<main>\n<h1>Welcome to the Color Wheel</h1>\n<div class=\"cards\">\n<div>\n");
    body.push_str(&wheel.to_svg(&SvgOptions {
        select_href: Some(SELECT_HREF.to_string()),
        ..SvgOptions::default()
    }));
    body.push_str("</div>\n<div class=\"card\">\n<h2>Selected Color</h2>\n");
    match wheel.selected() {
        Some(sector) => {
            let hex = sector.color_value.to_hex();
            let _ = writeln!(
                body,
                "<div class=\"selected\"><div class=\"swatch\" style=\"background-color:{hex}\"></div>\
                 <p><strong>{label}</strong></p><p>{hex}</p></div>",
                label = escape_html(&sector.label),
            );
        }
        None => body.push_str("<p>Click a color to see details.</p>\n"),
    }
    body.push_str("</div>\n</div>\n</main>\n");
    layout("Color Wheel", &body)
}
