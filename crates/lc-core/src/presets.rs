//! Named preset tables: canvas sizes, shadows, text shadows, clip shapes.
//!
//! Style fields store the token (`"soft"`, `"circle"`); these tables map a
//! token to the CSS value a styled scene uses. Unknown tokens resolve to
//! `None` and behave like `"none"`.

/// `(name, width, height)` canvas presets.
pub const ASPECT_RATIOS: &[(&str, f32, f32)] = &[
    ("1:1", 1080.0, 1080.0),
    ("4:5", 1080.0, 1350.0),
    ("9:16", 1080.0, 1920.0),
    ("16:9", 1920.0, 1080.0),
    ("twitter", 1200.0, 675.0),
];

/// Image shadow token → CSS `box-shadow`.
pub const SHADOW_PRESETS: &[(&str, &str)] = &[
    ("none", "none"),
    ("soft", "0 4px 12px rgba(0, 0, 0, 0.15)"),
    ("medium", "0 8px 24px rgba(0, 0, 0, 0.25)"),
    ("hard", "0 12px 32px rgba(0, 0, 0, 0.4)"),
    ("glow", "0 0 30px rgba(99, 102, 241, 0.6)"),
    ("dramatic", "0 25px 50px rgba(0, 0, 0, 0.5)"),
];

/// Text shadow token → CSS `text-shadow`.
pub const TEXT_SHADOW_PRESETS: &[(&str, &str)] = &[
    ("none", "none"),
    ("soft", "0 2px 4px rgba(0, 0, 0, 0.3)"),
    ("hard", "3px 3px 0 rgba(0, 0, 0, 0.8)"),
    ("neon", "0 0 10px #fff, 0 0 20px #0ff, 0 0 30px #0ff"),
    ("outline-glow", "0 0 4px #000, 0 0 8px rgba(0, 0, 0, 0.6)"),
];

/// Clip-path token → CSS `clip-path`.
pub const CLIP_PATHS: &[(&str, &str)] = &[
    ("none", "none"),
    ("circle", "circle(50% at 50% 50%)"),
    ("ellipse", "ellipse(50% 35% at 50% 50%)"),
    ("triangle", "polygon(50% 0%, 0% 100%, 100% 100%)"),
    ("rhombus", "polygon(50% 0%, 100% 50%, 50% 100%, 0% 50%)"),
    (
        "hexagon",
        "polygon(25% 0%, 75% 0%, 100% 50%, 75% 100%, 25% 100%, 0% 50%)",
    ),
    (
        "star",
        "polygon(50% 0%, 61% 35%, 98% 35%, 68% 57%, 79% 91%, 50% 70%, 21% 91%, 32% 57%, 2% 35%, 39% 35%)",
    ),
    ("rounded", "inset(0 round 15%)"),
];

fn lookup(table: &[(&str, &'static str)], token: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, css)| *css)
        .filter(|css| *css != "none")
}

/// CSS box-shadow for a shadow token, `None` for `"none"` or unknown tokens.
pub fn shadow_css(token: &str) -> Option<&'static str> {
    lookup(SHADOW_PRESETS, token)
}

pub fn text_shadow_css(token: &str) -> Option<&'static str> {
    lookup(TEXT_SHADOW_PRESETS, token)
}

pub fn clip_path_css(token: &str) -> Option<&'static str> {
    lookup(CLIP_PATHS, token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tokens_behave_like_none() {
        assert_eq!(shadow_css("none"), None);
        assert_eq!(shadow_css("sparkly"), None);
        assert_eq!(clip_path_css("circle"), Some("circle(50% at 50% 50%)"));
        assert!(text_shadow_css("neon").is_some());
    }
}
