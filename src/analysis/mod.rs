//! Analyses of CLIGEN and WEPP outputs.

pub mod adoption;
pub mod cligen_compare;
pub mod evaluation;
pub mod hillslope;
pub mod trends;

use {crate::stats::StormClass, std::collections::BTreeMap};

/// Wet-day depths grouped by storm class; every class is present.
pub fn storm_depths(depths: &[f64], limits: &[f64; 3]) -> BTreeMap<StormClass, Vec<f64>> {
    let mut classes: BTreeMap<StormClass, Vec<f64>> = StormClass::ALL.iter().map(|c| (*c, vec![])).collect();
    for depth in depths {
        if let Some(class) = StormClass::classify(*depth, limits) {
            classes.entry(class).or_default().push(*depth);
        }
    }
    classes
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn classes_by_depth() {
        let classes = storm_depths(&[0.0, 10.0, 10.5, 25.0, 50.0, 50.1], &[10.0, 25.0, 50.0]);
        assert_eq!(classes[&StormClass::Light], vec![10.0]);
        assert_eq!(classes[&StormClass::Moderate], vec![10.5, 25.0]);
        assert_eq!(classes[&StormClass::Heavy], vec![50.0]);
        assert_eq!(classes[&StormClass::Intense], vec![50.1]);
    }
}
