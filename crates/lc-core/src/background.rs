//! Background descriptor parser.
//!
//! A background is stored as a CSS-like string: a color (`#1e1e2e`,
//! `rgb(…)`, `rgba(…)`, a few named colors), a `linear-gradient(…)`, or an
//! `url(…)` image. Built on `winnow` 0.7; unrecognized strings are kept
//! verbatim as `Background::Unknown` and paint as white.

use crate::color::Color;
use winnow::ascii::Caseless;
use winnow::combinator::{alt, opt};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take_while;

/// Parsed form of a background descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    Solid(Color),
    /// CSS angle convention: 0° points up, 90° right, 180° (default) down.
    LinearGradient { angle_deg: f32, stops: Vec<Color> },
    Image(String),
    Unknown(String),
}

impl Background {
    pub fn parse(descriptor: &str) -> Self {
        let s = descriptor.trim();
        if let Some(inner) = function_body(s, "linear-gradient") {
            let args = split_top_level(inner);
            let (angle_deg, rest) = match args.first().and_then(|a| parse_direction(a)) {
                Some(angle) => (angle, &args[1..]),
                None => (180.0, &args[..]),
            };
            let stops: Vec<Color> = rest.iter().filter_map(|a| leading_color(a)).collect();
            if stops.is_empty() {
                return Background::Unknown(s.to_string());
            }
            return Background::LinearGradient { angle_deg, stops };
        }
        if let Some(inner) = function_body(s, "url") {
            let url = inner.trim().trim_matches(|c| c == '"' || c == '\'');
            return Background::Image(url.to_string());
        }
        match parse_color(s) {
            Some(c) => Background::Solid(c),
            None => Background::Unknown(s.to_string()),
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, Background::Solid(_))
    }
}

/// Whether a descriptor is a single solid color (as opposed to a gradient or image).
pub fn is_flat(descriptor: &str) -> bool {
    Background::parse(descriptor).is_flat()
}

/// Parse a standalone color: hex, `rgb()`, `rgba()` or a named color.
pub fn parse_color(s: &str) -> Option<Color> {
    let mut input = s.trim();
    let c = parse_any_color.parse_next(&mut input).ok()?;
    skip_space(&mut input);
    input.is_empty().then_some(c)
}

/// Even offsets `i / (n - 1)` for `n` stops (a single stop sits at 0).
pub fn even_stop_offsets(n: usize) -> Vec<f32> {
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..n).map(|i| i as f32 / (n - 1) as f32).collect(),
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

/// Body between `name(` and the final `)`, if `s` is that function call.
fn function_body<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    let head = s.get(..name.len())?;
    if !head.eq_ignore_ascii_case(name) {
        return None;
    }
    let rest = s[name.len()..].trim_start();
    let rest = rest.strip_prefix('(')?;
    rest.strip_suffix(')')
}

/// Split on commas that are not nested inside parentheses.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = s[start..].trim();
    if !tail.is_empty() {
        parts.push(tail);
    }
    parts
}

/// Color at the start of a gradient argument (`#fff 20%` → `#fff`).
fn leading_color(arg: &str) -> Option<Color> {
    let mut input = arg.trim();
    parse_any_color.parse_next(&mut input).ok()
}

/// First gradient argument as an angle in degrees (`135deg`, `to right`).
fn parse_direction(arg: &str) -> Option<f32> {
    let mut input = arg.trim();
    let angle = alt((parse_angle, parse_side)).parse_next(&mut input).ok()?;
    skip_space(&mut input);
    input.is_empty().then_some(angle)
}

// ─── Parsers ─────────────────────────────────────────────────────────────

fn backtrack() -> ErrMode<ContextError> {
    ErrMode::Backtrack(ContextError::new())
}

/// Consume optional whitespace (concrete error type avoids inference issues).
fn skip_space(input: &mut &str) {
    use winnow::ascii::space0;
    let _: Result<&str, ErrMode<ContextError>> = space0.parse_next(input);
}

fn parse_any_color(input: &mut &str) -> ModalResult<Color> {
    alt((parse_hex_color, parse_rgb_fn, parse_named_color)).parse_next(input)
}

fn parse_hex_color(input: &mut &str) -> ModalResult<Color> {
    let _ = '#'.parse_next(input)?;
    let digits: &str = take_while(3..=8, |c: char| c.is_ascii_hexdigit()).parse_next(input)?;
    Color::from_hex(digits).ok_or_else(backtrack)
}

fn parse_number(input: &mut &str) -> ModalResult<f32> {
    let start = *input;
    if input.starts_with('-') {
        *input = &input[1..];
    }
    let int: &str = take_while(0.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    let mut frac = "";
    if input.starts_with('.') {
        *input = &input[1..];
        frac = take_while(0.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    }
    if int.is_empty() && frac.is_empty() {
        *input = start;
        return Err(backtrack());
    }
    let matched = &start[..start.len() - input.len()];
    matched.parse::<f32>().map_err(|_| backtrack())
}

/// Comma or whitespace between function arguments.
fn skip_arg_separator(input: &mut &str) {
    skip_space(input);
    if input.starts_with(',') || input.starts_with('/') {
        *input = &input[1..];
    }
    skip_space(input);
}

/// `rgb(r, g, b)` / `rgba(r, g, b, a)`; channels 0–255 or percentages.
fn parse_rgb_fn(input: &mut &str) -> ModalResult<Color> {
    let _ = alt((Caseless("rgba"), Caseless("rgb"))).parse_next(input)?;
    skip_space(input);
    let _ = '('.parse_next(input)?;
    skip_space(input);

    let channel = |input: &mut &str| -> ModalResult<u8> {
        let v = parse_number(input)?;
        let pct = opt('%').parse_next(input)?.is_some();
        let v = if pct { v * 2.55 } else { v };
        Ok(v.round().clamp(0.0, 255.0) as u8)
    };
    let r = channel(input)?;
    skip_arg_separator(input);
    let g = channel(input)?;
    skip_arg_separator(input);
    let b = channel(input)?;
    skip_arg_separator(input);

    let mut alpha = 1.0;
    if !input.starts_with(')') {
        let a = parse_number(input)?;
        let pct = opt('%').parse_next(input)?.is_some();
        alpha = if pct { a / 100.0 } else { a };
        skip_space(input);
    }
    let _ = ')'.parse_next(input)?;
    Ok(Color::from_rgba8(r, g, b, alpha))
}

fn parse_named_color(input: &mut &str) -> ModalResult<Color> {
    let checkpoint = *input;
    let word: &str = take_while(1.., |c: char| c.is_ascii_alphabetic()).parse_next(input)?;
    let c = match word.to_ascii_lowercase().as_str() {
        "black" => Color::BLACK,
        "white" => Color::WHITE,
        "transparent" => Color::TRANSPARENT,
        "red" => Color::from_rgba8(255, 0, 0, 1.0),
        "green" => Color::from_rgba8(0, 128, 0, 1.0),
        "blue" => Color::from_rgba8(0, 0, 255, 1.0),
        "yellow" => Color::from_rgba8(255, 255, 0, 1.0),
        "orange" => Color::from_rgba8(255, 165, 0, 1.0),
        "purple" => Color::from_rgba8(128, 0, 128, 1.0),
        "pink" => Color::from_rgba8(255, 192, 203, 1.0),
        "gray" | "grey" => Color::from_rgba8(128, 128, 128, 1.0),
        _ => {
            *input = checkpoint;
            return Err(backtrack());
        }
    };
    Ok(c)
}

fn parse_angle(input: &mut &str) -> ModalResult<f32> {
    let v = parse_number(input)?;
    let unit = alt((
        Caseless("deg"),
        Caseless("turn"),
        Caseless("rad"),
        Caseless("grad"),
    ))
    .parse_next(input)?;
    let deg = match unit.to_ascii_lowercase().as_str() {
        "turn" => v * 360.0,
        "rad" => v.to_degrees(),
        "grad" => v * 0.9,
        _ => v,
    };
    Ok(deg)
}

/// `to <side> [<side>]` keyword directions.
fn parse_side(input: &mut &str) -> ModalResult<f32> {
    let _ = Caseless("to").parse_next(input)?;
    let words: &str = take_while(1.., |c: char| c.is_ascii_alphabetic() || c == ' ').parse_next(input)?;
    let mut top = None;
    let mut right = None;
    for w in words.split_whitespace() {
        match w.to_ascii_lowercase().as_str() {
            "top" => top = Some(true),
            "bottom" => top = Some(false),
            "left" => right = Some(false),
            "right" => right = Some(true),
            _ => return Err(backtrack()),
        }
    }
    let angle = match (top, right) {
        (Some(true), None) => 0.0,
        (Some(false), None) => 180.0,
        (None, Some(true)) => 90.0,
        (None, Some(false)) => 270.0,
        (Some(true), Some(true)) => 45.0,
        (Some(false), Some(true)) => 135.0,
        (Some(false), Some(false)) => 225.0,
        (Some(true), Some(false)) => 315.0,
        (None, None) => return Err(backtrack()),
    };
    Ok(angle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_hex_and_functional_colors() {
        assert_eq!(parse_color("#000"), Some(Color::BLACK));
        assert_eq!(parse_color(" white "), Some(Color::WHITE));
        let c = parse_color("rgba(255, 0, 0, 0.5)").unwrap();
        assert_eq!(c.to_css(), "rgba(255, 0, 0, 0.5)");
        let c = parse_color("rgb(0 128 255)").unwrap();
        assert_eq!(c.to_hex(), "#0080FF");
        assert_eq!(parse_color("hotpink-ish"), None);
        assert_eq!(parse_color("#fff trailing"), None);
    }

    #[test]
    fn parse_linear_gradient_with_angle() {
        let bg = Background::parse("linear-gradient(135deg, #667eea 0%, #764ba2 100%)");
        let Background::LinearGradient { angle_deg, stops } = bg else {
            panic!("expected gradient");
        };
        assert_eq!(angle_deg, 135.0);
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0].to_hex(), "#667EEA");
        assert_eq!(stops[1].to_hex(), "#764BA2");
    }

    #[test]
    fn parse_linear_gradient_keyword_direction() {
        let bg = Background::parse("linear-gradient(to right, red, rgba(0,0,255,1))");
        assert_eq!(
            bg,
            Background::LinearGradient {
                angle_deg: 90.0,
                stops: vec![
                    Color::from_rgba8(255, 0, 0, 1.0),
                    Color::from_rgba8(0, 0, 255, 1.0)
                ],
            }
        );
    }

    #[test]
    fn gradient_without_direction_defaults_down() {
        let bg = Background::parse("linear-gradient(#000, #fff)");
        assert!(matches!(bg, Background::LinearGradient { angle_deg, .. } if angle_deg == 180.0));
        assert!(!bg.is_flat());
    }

    #[test]
    fn url_and_unknown() {
        assert_eq!(
            Background::parse("url('bg.png')"),
            Background::Image("bg.png".into())
        );
        assert!(matches!(
            Background::parse("conic-gradient(red, blue)"),
            Background::Unknown(_)
        ));
        assert!(is_flat("#1e1e2e"));
        assert!(!is_flat("url(a.png)"));
    }

    #[test]
    fn even_offsets() {
        assert_eq!(even_stop_offsets(3), vec![0.0, 0.5, 1.0]);
        assert_eq!(even_stop_offsets(1), vec![0.0]);
    }
}
