use super::domain::{Location, LocationMap};
use super::format::{format_percentage, format_whole_percentage};

/// Verdict on which locations clear `target_margin`. Deterministic for equal
/// inputs; the exact wording is part of the calculator's output.
pub fn recommend(
    meets_target: &LocationMap<bool>,
    margins: &LocationMap<f64>,
    target_margin: f64,
) -> String {
    let target = format_whole_percentage(target_margin);
    let qualifying: Vec<Location> = meets_target
        .iter()
        .filter(|(_, meets)| **meets)
        .map(|(location, _)| location)
        .collect();

    match qualifying.as_slice() {
        [] => format!(
            "No location meets the {target} target margin. Consider reconsidering the client rate or staffing mix."
        ),
        [only] => format!(
            "Only {only} meets the {target} target margin, at {}.",
            format_percentage(*margins.get(*only))
        ),
        [first, second] => format!(
            "{first} and {second} meet the {target} target margin. Choose based on other requirements."
        ),
        _ => {
            let best = best_margin(margins);
            format!(
                "All locations meet the {target} target margin. {best} offers the best margin at {}.",
                format_percentage(*margins.get(best))
            )
        }
    }
}

/// Location with the strictly highest margin; ties go to the earlier location.
fn best_margin(margins: &LocationMap<f64>) -> Location {
    let mut best = Location::Onshore;
    for location in Location::ordered() {
        if margins.get(location) > margins.get(best) {
            best = location;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(onshore: bool, offshore: bool, nearshore: bool) -> LocationMap<bool> {
        LocationMap {
            onshore,
            offshore,
            nearshore,
        }
    }

    fn margins() -> LocationMap<f64> {
        LocationMap {
            onshore: 121.0 / 190.0,
            offshore: 0.75,
            nearshore: 0.7,
        }
    }

    #[test]
    fn no_qualifying_location_cites_target() {
        assert_eq!(
            recommend(&flags(false, false, false), &margins(), 0.8),
            "No location meets the 80% target margin. Consider reconsidering the client rate or staffing mix."
        );
    }

    #[test]
    fn single_qualifier_is_named_with_margin() {
        assert_eq!(
            recommend(&flags(true, false, false), &margins(), 0.6),
            "Only Onshore meets the 60% target margin, at 63.7%."
        );
    }

    #[test]
    fn two_qualifiers_are_listed_in_order() {
        assert_eq!(
            recommend(&flags(false, true, true), &margins(), 0.65),
            "Offshore and Nearshore meet the 65% target margin. Choose based on other requirements."
        );
    }

    #[test]
    fn all_qualifying_picks_highest_margin() {
        assert_eq!(
            recommend(&flags(true, true, true), &margins(), 0.5),
            "All locations meet the 50% target margin. Offshore offers the best margin at 75.0%."
        );
    }

    #[test]
    fn ties_resolve_to_first_location() {
        let tied = LocationMap {
            onshore: 0.5,
            offshore: 0.7,
            nearshore: 0.7,
        };
        let verdict = recommend(&flags(true, true, true), &tied, 0.4);
        assert!(verdict.contains("Offshore offers the best margin at 70.0%"));
        assert_eq!(verdict, recommend(&flags(true, true, true), &tied, 0.4));
    }
}
