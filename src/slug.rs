use std::sync::LazyLock;

use regex::Regex;

use crate::cli::SlugCommand;
use crate::locale::Locale;

/// Maximum length of the title part, in characters, before the `-<id>` suffix.
pub const MAX_TITLE_CHARS: usize = 100;

static LATIN_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").expect("valid latin slug regex"));
static HANGUL_DISALLOWED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^a-z0-9_\s\x{AC00}-\x{D7A3}-]").expect("valid hangul slug regex")
});
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static HYPHEN_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{2,}").expect("valid hyphen regex"));
static ID_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|-)(\d+)$").expect("valid id suffix regex"));

pub fn run(command: SlugCommand) -> anyhow::Result<()> {
    match command {
        SlugCommand::Encode(args) => {
            println!("{}", encode(&args.title, args.id, args.locale));
        }
        SlugCommand::Decode(args) => {
            let Some(id) = decode(&args.slug) else {
                anyhow::bail!("slug has no numeric id suffix: {:?}", args.slug);
            };
            println!("{id}");
        }
    }
    Ok(())
}

pub fn encode(title: &str, id: u64, locale: Locale) -> String {
    let normalized = normalize_title(title, locale);
    format!("{normalized}-{id}")
}

/// Returns the document id carried by `slug`, or `None` when there is no
/// numeric suffix. Bare ids (`"42"`) decode too.
pub fn decode(slug: &str) -> Option<u64> {
    let captures = ID_SUFFIX.captures(slug.trim())?;
    captures.get(1)?.as_str().parse().ok()
}

pub fn normalize_title(title: &str, locale: Locale) -> String {
    let lower = title.to_lowercase();
    let disallowed = if locale.is_latin() {
        &*LATIN_DISALLOWED
    } else {
        &*HANGUL_DISALLOWED
    };
    let stripped = disallowed.replace_all(&lower, "");
    let hyphenated = WHITESPACE_RUN.replace_all(stripped.trim(), "-");
    let collapsed = HYPHEN_RUN.replace_all(&hyphenated, "-");
    let trimmed = collapsed.trim_matches('-');

    // Char-based cut keeps multibyte scripts intact; trim again so the result
    // stays a fixed point of this function.
    let truncated: String = trimmed.chars().take(MAX_TITLE_CHARS).collect();
    truncated.trim_end_matches('-').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_latin_title() {
        assert_eq!(
            encode("Build Habits That Stick!", 7, Locale::En),
            "build-habits-that-stick-7"
        );
    }

    #[test]
    fn encode_empty_title_is_bare_suffix() {
        assert_eq!(encode("", 42, Locale::En), "-42");
        assert_eq!(encode("   \t ", 42, Locale::Ko), "-42");
        assert_eq!(encode("!!!", 3, Locale::En), "-3");
    }

    #[test]
    fn encode_keeps_hangul_for_korean() {
        assert_eq!(encode("습관 만들기 101", 5, Locale::Ko), "습관-만들기-101-5");
    }

    #[test]
    fn encode_strips_hangul_for_english() {
        assert_eq!(encode("습관 Habit", 5, Locale::En), "habit-5");
    }

    #[test]
    fn encode_collapses_hyphens_and_whitespace() {
        assert_eq!(
            encode("  Morning -- routine   tips - ", 11, Locale::En),
            "morning-routine-tips-11"
        );
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let title = "가".repeat(150);
        let slug = encode(&title, 9, Locale::Ko);
        let (text, id) = slug.rsplit_once('-').unwrap();
        assert_eq!(text.chars().count(), MAX_TITLE_CHARS);
        assert_eq!(id, "9");
    }

    #[test]
    fn truncation_does_not_leave_trailing_hyphen() {
        let title = format!("{} b", "a".repeat(MAX_TITLE_CHARS - 1));
        let normalized = normalize_title(&title, Locale::En);
        assert!(!normalized.ends_with('-'));
        assert_eq!(normalized, normalize_title(&normalized, Locale::En));
    }

    #[test]
    fn normalization_is_a_fixed_point() {
        let titles = [
            "Why Streaks Matter",
            "  10 Tips -- for   Better Sleep ",
            "작은 습관의 힘!",
            "Mixed 한글 and English",
            "",
        ];
        for locale in Locale::ALL {
            for title in titles {
                let once = normalize_title(title, locale);
                assert_eq!(normalize_title(&once, locale), once, "{title:?} {locale}");
            }
        }
    }

    #[test]
    fn normalization_is_case_insensitive() {
        assert_eq!(
            encode("HABIT Tracker", 1, Locale::En),
            encode("habit tracker", 1, Locale::En)
        );
    }

    #[test]
    fn decode_round_trips_ids() {
        let titles = ["", "Habit 2024", "습관 101", "---", "a-1"];
        for locale in Locale::ALL {
            for title in titles {
                for id in [0, 1, 42, 2024, u64::MAX] {
                    assert_eq!(decode(&encode(title, id, locale)), Some(id));
                }
            }
        }
    }

    #[test]
    fn distinct_ids_never_collide() {
        for title in ["same title", "", "2024"] {
            assert_ne!(encode(title, 1, Locale::En), encode(title, 2, Locale::En));
            assert_ne!(encode(title, 12, Locale::En), encode(title, 2, Locale::En));
        }
    }

    #[test]
    fn decode_accepts_bare_ids() {
        assert_eq!(decode("42"), Some(42));
    }

    #[test]
    fn decode_rejects_missing_suffix() {
        assert_eq!(decode("habit-tracker"), None);
        assert_eq!(decode("habit42"), None);
        assert_eq!(decode(""), None);
        assert_eq!(decode("post-99999999999999999999999"), None);
    }
}
