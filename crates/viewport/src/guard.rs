use crate::marker::Marker;

/// Whether the camera and popup may be pointed at `marker`.
///
/// A marker with a non-finite latitude or longitude is never focusable;
/// callers treat it as a no-op that still consumes the focus request.
pub fn is_focusable(marker: &Marker) -> bool {
    marker.position().is_finite()
}

#[cfg(test)]
mod tests {
    use super::is_focusable;
    use crate::marker::Marker;

    #[test]
    fn accepts_regular_coordinates() {
        assert!(is_focusable(&Marker::new("1", 51.924, 4.475)));
        assert!(is_focusable(&Marker::new("edge", -90.0, 180.0)));
    }

    #[test]
    fn rejects_nan_and_infinite_coordinates() {
        assert!(!is_focusable(&Marker::new("a", f64::NAN, 4.475)));
        assert!(!is_focusable(&Marker::new("b", 51.924, f64::NAN)));
        assert!(!is_focusable(&Marker::new("c", f64::INFINITY, 4.475)));
        assert!(!is_focusable(&Marker::new("d", 51.924, f64::NEG_INFINITY)));
    }
}
