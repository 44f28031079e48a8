//! Directional platform ids: a base station id with a trailing direction
//! letter appended, e.g. `"127N"` for the northbound platform at station
//! `"127"`. Used throughout the router and the realtime cache to go back
//! and forth between a station and its individual boarding platforms.

const DIRECTIONS: [char; 4] = ['N', 'S', 'E', 'W'];

/// Returns the trailing direction letter of `stop_id`, if it has one.
pub fn direction_suffix(stop_id: &str) -> Option<char> {
    stop_id.chars().last().filter(|c| DIRECTIONS.contains(c))
}

/// Strips a trailing direction letter, returning the base station id.
/// Ids without a direction suffix are returned unchanged.
pub fn base_stop_id(stop_id: &str) -> &str {
    match direction_suffix(stop_id) {
        Some(_) => &stop_id[..stop_id.len() - 1],
        None => stop_id,
    }
}

/// The four directional platform ids for a base station id.
pub fn directional_variants(base_stop_id: &str) -> [String; 4] {
    DIRECTIONS.map(|d| format!("{base_stop_id}{d}"))
}

/// Normalizes a user-supplied origin/destination id into the set of platform
/// ids it could refer to: if `stop_id` already names a platform, that one id;
/// otherwise all four directional variants of the base station, for the
/// caller to filter down to the ones that actually exist.
pub fn expand(stop_id: &str) -> Vec<String> {
    if direction_suffix(stop_id).is_some() {
        vec![stop_id.to_owned()]
    } else {
        directional_variants(stop_id).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_suffix_recognizes_the_four_letters() {
        assert_eq!(direction_suffix("127N"), Some('N'));
        assert_eq!(direction_suffix("127S"), Some('S'));
        assert_eq!(direction_suffix("127E"), Some('E'));
        assert_eq!(direction_suffix("127W"), Some('W'));
        assert_eq!(direction_suffix("127"), None);
    }

    #[test]
    fn base_stop_id_strips_only_known_directions() {
        assert_eq!(base_stop_id("127N"), "127");
        assert_eq!(base_stop_id("127"), "127");
        assert_eq!(base_stop_id("A"), "A");
    }

    #[test]
    fn expand_of_a_platform_id_is_itself() {
        assert_eq!(expand("127N"), vec!["127N".to_owned()]);
    }

    #[test]
    fn expand_of_a_base_id_is_all_four_directions() {
        assert_eq!(
            expand("127"),
            vec![
                "127N".to_owned(),
                "127S".to_owned(),
                "127E".to_owned(),
                "127W".to_owned(),
            ]
        );
    }
}
