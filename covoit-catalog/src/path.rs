use covoit_core::CityName;

/// Builds the ordered path of a ride.
///
/// Stops are taken in order, dropping blanks and consecutive duplicates.
/// The departure city is then prepended unless the first stop already is the
/// departure, and the arrival city appended unless the last stop already is
/// the arrival. The result has at least one city whenever departure or
/// arrival is non-blank; callers needing a leg must check `len() >= 2`.
pub fn build_path<S: AsRef<str>>(departure: &str, stops: &[S], arrival: &str) -> Vec<CityName> {
    let mut path: Vec<CityName> = Vec::with_capacity(stops.len() + 2);

    for city in stops.iter().filter_map(|s| CityName::parse(s.as_ref())) {
        if path.last().is_some_and(|last| last.key() == city.key()) {
            continue;
        }
        path.push(city);
    }

    if let Some(dep) = CityName::parse(departure) {
        match path.first() {
            Some(first) if first.key() == dep.key() => {}
            _ => path.insert(0, dep),
        }
    }

    if let Some(arr) = CityName::parse(arrival) {
        match path.last() {
            Some(last) if last.key() == arr.key() => {}
            _ => path.push(arr),
        }
    }

    path
}

/// Splits free-text stops on newlines, `;` and `,`.
pub fn parse_stops(raw: &str) -> Vec<String> {
    raw.split(['\n', '\r', ';', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Index of the first city matching `city`, case-insensitively.
pub fn index_of_city(path: &[CityName], city: &str) -> Option<usize> {
    path.iter().position(|c| c.matches(city))
}

/// Index of the last city matching `city`, case-insensitively.
pub fn last_index_of_city(path: &[CityName], city: &str) -> Option<usize> {
    path.iter().rposition(|c| c.matches(city))
}

/// Boarding and drop-off indices for a trip from `from` to `to` on `path`:
/// first match of `from`, last match of `to`, and `to` strictly after `from`.
pub fn locate_segment(path: &[CityName], from: &str, to: &str) -> Option<(usize, usize)> {
    let from_idx = index_of_city(path, from)?;
    let to_idx = last_index_of_city(path, to)?;
    (to_idx > from_idx).then_some((from_idx, to_idx))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(path: &[CityName]) -> Vec<&str> {
        path.iter().map(CityName::display).collect()
    }

    #[test]
    fn test_endpoints_are_added() {
        let path = build_path("paris", &["poitiers", "bordeaux"], "madrid");
        assert_eq!(names(&path), vec!["Paris", "Poitiers", "Bordeaux", "Madrid"]);
    }

    #[test]
    fn test_endpoints_already_in_stops() {
        let path = build_path("paris", &["paris", "poitiers", "madrid"], "madrid");
        assert_eq!(names(&path), vec!["Paris", "Poitiers", "Madrid"]);
    }

    #[test]
    fn test_consecutive_duplicates_dropped() {
        let path = build_path("Lyon", &["  valence", "VALENCE", "", "  ", "avignon"], "Marseille");
        assert_eq!(names(&path), vec!["Lyon", "Valence", "Avignon", "Marseille"]);
    }

    #[test]
    fn test_no_stops() {
        let path = build_path("lyon", &[] as &[&str], "marseille");
        assert_eq!(names(&path), vec!["Lyon", "Marseille"]);
    }

    #[test]
    fn test_same_departure_and_arrival_collapses() {
        let path = build_path("lyon", &[] as &[&str], "LYON");
        assert_eq!(names(&path), vec!["Lyon"]);
    }

    #[test]
    fn test_build_is_idempotent() {
        let stops = ["paris", "Tours", "tours", "poitiers"];
        let first = build_path("paris", &stops, "bordeaux");
        let second = build_path("paris", &stops, "bordeaux");
        assert_eq!(first, second);

        let rebuilt = build_path("paris", &names(&first)[..], "bordeaux");
        assert_eq!(first, rebuilt);
    }

    #[test]
    fn test_parse_stops() {
        let stops = parse_stops("Poitiers\nBordeaux; Bayonne ,, \r\n  ");
        assert_eq!(stops, vec!["Poitiers", "Bordeaux", "Bayonne"]);
    }

    #[test]
    fn test_index_of_city() {
        let path = build_path("paris", &["poitiers", "bordeaux"], "madrid");
        assert_eq!(index_of_city(&path, " BORDEAUX "), Some(2));
        assert_eq!(index_of_city(&path, "lisbon"), None);
        assert_eq!(index_of_city(&path, ""), None);
    }

    #[test]
    fn test_locate_segment() {
        let path = build_path("paris", &["poitiers", "bordeaux"], "madrid");
        assert_eq!(locate_segment(&path, "poitiers", "madrid"), Some((1, 3)));
        assert_eq!(locate_segment(&path, "madrid", "poitiers"), None);
        assert_eq!(locate_segment(&path, "paris", "paris"), None);
    }
}
