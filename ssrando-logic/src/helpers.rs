use ssrando_game::{OptionCheck, OptionCheckKind};

use crate::{OptionValue, Options};

pub const LOGIC_MODE_OPTION: &str = "logic-mode";
pub const BITLESS_LOGIC_MODE: &str = "BiTless";
pub const BITLESS_TRICKS_OPTION: &str = "enabled-tricks-bitless";
pub const GLITCHED_TRICKS_OPTION: &str = "enabled-tricks-glitched";
pub const BANNED_TYPES_OPTION: &str = "banned-types";
pub const MAX_BATREAUX_REWARD_OPTION: &str = "max-batreaux-reward";

/// Missing options, `false`, `0`, `""` and empty lists count as disabled.
pub fn is_truthy(value: Option<&OptionValue>) -> bool {
    match value {
        None => false,
        Some(OptionValue::Bool(b)) => *b,
        Some(OptionValue::Int(x)) => *x != 0,
        Some(OptionValue::Str(s)) => !s.is_empty(),
        Some(OptionValue::List(v)) => !v.is_empty(),
    }
}

fn is_equal(value: Option<&OptionValue>, expected: &str) -> bool {
    matches!(value, Some(OptionValue::Str(s)) if s == expected)
}

fn list_contains(value: Option<&OptionValue>, expected: &str) -> bool {
    match value {
        Some(OptionValue::List(v)) => v.iter().any(|x| x == expected),
        _ => false,
    }
}

pub fn check_option(check: &OptionCheck, options: &Options) -> bool {
    let value = options.get(&check.option);
    match &check.kind {
        OptionCheckKind::Enabled => is_truthy(value),
        OptionCheckKind::Disabled => !is_truthy(value),
        OptionCheckKind::Is(v) => is_equal(value, v),
        OptionCheckKind::IsNot(v) => !is_equal(value, v),
        OptionCheckKind::Contains(v) => list_contains(value, v),
        OptionCheckKind::DoesNotContain(v) => !list_contains(value, v),
    }
}

// The trick list consulted depends on the logic mode.
pub fn is_trick_enabled(options: &Options, trick: &str) -> bool {
    let list_option = if is_equal(options.get(LOGIC_MODE_OPTION), BITLESS_LOGIC_MODE) {
        BITLESS_TRICKS_OPTION
    } else {
        GLITCHED_TRICKS_OPTION
    };
    list_contains(options.get(list_option), trick)
}

/// Crystal count of a Batreaux reward location, from names like
/// "Skyloft Village - Batreaux - 40 Crystals".
pub fn batreaux_reward(location_name: &str) -> Option<i64> {
    location_name
        .match_indices("Batreaux - ")
        .find_map(|(i, m)| {
            let rest = &location_name[i + m.len()..];
            let num_digits = rest.find(|c: char| !c.is_ascii_digit())?;
            if num_digits == 0 || !rest[num_digits..].starts_with(' ') {
                return None;
            }
            rest[..num_digits].parse().ok()
        })
}

/// Whether a location may hold items during the fill: none of its types are banned, and
/// it is not a Batreaux reward beyond the configured maximum.
pub fn is_progress_location(options: &Options, location_name: &str, types: &[String]) -> bool {
    if types
        .iter()
        .any(|t| list_contains(options.get(BANNED_TYPES_OPTION), t))
    {
        return false;
    }
    match (
        options.get(MAX_BATREAUX_REWARD_OPTION),
        batreaux_reward(location_name),
    ) {
        (Some(&OptionValue::Int(max_reward)), Some(reward)) => reward <= max_reward,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssrando_game::parse_option_check;

    fn check(term: &str, options: &Options) -> bool {
        check_option(&parse_option_check(term).unwrap(), options)
    }

    fn list(values: &[&str]) -> OptionValue {
        OptionValue::List(values.iter().map(|x| x.to_string()).collect())
    }

    #[test]
    fn test_boolean_checks() {
        let options = Options::default()
            .with("hero-mode", OptionValue::Bool(true))
            .with("starting-tablets", OptionValue::Int(0));
        assert!(check("Option \"hero-mode\" Enabled", &options));
        assert!(!check("Option \"hero-mode\" Disabled", &options));
        assert!(check("Option \"starting-tablets\" Disabled", &options));
        assert!(check("Option \"unset\" Disabled", &options));
        assert!(!check("Option \"unset\" Enabled", &options));
    }

    #[test]
    fn test_value_checks() {
        let options = Options::default()
            .with("open-thunderhead", OptionValue::Str("Open".to_string()))
            .with("banned-types", list(&["goddess", "crystal"]));
        assert!(check("Option \"open-thunderhead\" Is \"Open\"", &options));
        assert!(check("Option \"open-thunderhead\" Is Not \"Closed\"", &options));
        assert!(!check("Option \"unset\" Is \"Open\"", &options));
        assert!(check("Option \"unset\" Is Not \"Open\"", &options));
        assert!(check("Option \"banned-types\" Contains \"goddess\"", &options));
        assert!(!check("Option \"banned-types\" Contains \"silent\"", &options));
        assert!(check("Option \"banned-types\" Does Not Contain \"silent\"", &options));
        assert!(check("Option \"unset\" Does Not Contain \"silent\"", &options));
    }

    #[test]
    fn test_trick_lists() {
        let options = Options::default()
            .with(BITLESS_TRICKS_OPTION, list(&["Stuttersprint"]))
            .with(GLITCHED_TRICKS_OPTION, list(&["Brakeslide"]));
        assert!(is_trick_enabled(&options, "Brakeslide"));
        assert!(!is_trick_enabled(&options, "Stuttersprint"));

        let options = options.with(LOGIC_MODE_OPTION, OptionValue::Str("BiTless".to_string()));
        assert!(is_trick_enabled(&options, "Stuttersprint"));
        assert!(!is_trick_enabled(&options, "Brakeslide"));
        assert!(!is_trick_enabled(&Options::default(), "Brakeslide"));
    }

    #[test]
    fn test_batreaux_reward() {
        assert_eq!(batreaux_reward("Skyloft Village - Batreaux - 40 Crystals"), Some(40));
        assert_eq!(batreaux_reward("Skyloft Village - Batreaux - 5 Crystals"), Some(5));
        assert_eq!(batreaux_reward("Skyloft Village - Batreaux - Crystals"), None);
        assert_eq!(batreaux_reward("Skyloft Village - Batreaux - 80"), None);
        assert_eq!(batreaux_reward("Skyloft - Fledge's Gift"), None);
    }

    #[test]
    fn test_progress_locations() {
        let types = vec!["Goddess Chests".to_string(), "Faron".to_string()];
        assert!(is_progress_location(&Options::default(), "Faron - Chest", &types));

        let options = Options::default()
            .with(BANNED_TYPES_OPTION, list(&["Goddess Chests"]))
            .with(MAX_BATREAUX_REWARD_OPTION, OptionValue::Int(30));
        assert!(!is_progress_location(&options, "Faron - Chest", &types));
        assert!(is_progress_location(&options, "Faron - Rock", &["Faron".to_string()]));
        assert!(is_progress_location(&options, "Faron - Rock", &[]));
        assert!(is_progress_location(
            &options,
            "Skyloft Village - Batreaux - 30 Crystals",
            &[]
        ));
        assert!(!is_progress_location(
            &options,
            "Skyloft Village - Batreaux - 40 Crystals",
            &[]
        ));
        assert!(is_progress_location(
            &Options::default(),
            "Skyloft Village - Batreaux - 80 Crystals",
            &[]
        ));
    }
}
